//! Per-declaration group cache for host adapters.
//!
//! An adapter registers each declaring type's pattern once and later asks
//! what type an attribute access on that type (or a subtype) should have.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::analyzer::Group;
use crate::error::PatternSyntaxError;
use crate::flags::Flags;

/// Type of a group attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// Always-present group: plain text.
    Text,
    /// Group that may not participate: text or nothing.
    OptionalText,
}

impl AttributeType {
    fn of(group: &Group) -> Self {
        if group.always_present {
            AttributeType::Text
        } else {
            AttributeType::OptionalText
        }
    }
}

/// How an attribute is being accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Instance,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error(
        "\"{attribute}\" is an instance attribute for regex groups, not a class attribute. \
         Use an instance of {declaration} instead."
    )]
    ClassAccess {
        attribute: String,
        declaration: String,
    },
}

#[derive(Debug, Default)]
pub struct GroupRegistry {
    declarations: HashMap<String, Vec<Group>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze `pattern` and remember its groups for `declaration`,
    /// replacing anything stored before. On error the declaration is left
    /// without groups.
    pub fn register(
        &mut self,
        declaration: impl Into<String>,
        pattern: &str,
        flags: Flags,
    ) -> Result<&[Group], PatternSyntaxError> {
        let declaration = declaration.into();
        let groups = match crate::analyze(pattern, flags) {
            Ok(groups) => groups,
            Err(err) => {
                debug!(%declaration, %err, "rejected pattern");
                self.declarations.remove(&declaration);
                return Err(err);
            }
        };
        debug!(%declaration, groups = groups.len(), "registered pattern");
        let slot = self.declarations.entry(declaration).or_default();
        *slot = groups;
        Ok(slot.as_slice())
    }

    pub fn groups(&self, declaration: &str) -> Option<&[Group]> {
        self.declarations.get(declaration).map(Vec::as_slice)
    }

    /// Named attributes `declaration` exposes, in group order. When a name
    /// is used more than once the first group wins.
    pub fn attributes(&self, declaration: &str) -> Vec<(&str, AttributeType)> {
        let mut seen = HashSet::new();
        self.groups(declaration)
            .unwrap_or_default()
            .iter()
            .filter(|g| g.index != 0)
            .filter_map(|g| Some((g.name.as_deref()?, AttributeType::of(g))))
            .filter(|(name, _)| seen.insert(*name))
            .collect()
    }

    /// Resolve `attribute` on a type whose ancestry is `mro`, most-derived
    /// type first. Returns `Ok(None)` when no registered ancestor has a
    /// group of that name.
    pub fn attribute<S: AsRef<str>>(
        &self,
        mro: &[S],
        attribute: &str,
        access: Access,
    ) -> Result<Option<AttributeType>, AccessError> {
        let found = mro.iter().find_map(|declaration| {
            self.groups(declaration.as_ref())?
                .iter()
                .find(|g| g.index != 0 && g.name.as_deref() == Some(attribute))
        });
        let Some(group) = found else {
            return Ok(None);
        };
        match access {
            Access::Instance => Ok(Some(AttributeType::of(group))),
            Access::Class => Err(AccessError::ClassAccess {
                attribute: attribute.to_string(),
                declaration: mro
                    .first()
                    .map(|d| short_name(d.as_ref()).to_string())
                    .unwrap_or_default(),
            }),
        }
    }
}

// `pkg.module.Type` -> `Type`
fn short_name(declaration: &str) -> &str {
    declaration.rsplit('.').next().unwrap_or(declaration)
}
