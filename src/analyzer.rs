use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;

use tracing::trace;

use crate::ast::{Node, Polarity};

/// Whether a group binds a value on every successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Always,
    Conditional,
}

impl Presence {
    pub fn and(self, other: Presence) -> Presence {
        match (self, other) {
            (Presence::Always, Presence::Always) => Presence::Always,
            _ => Presence::Conditional,
        }
    }

    pub fn is_always(self) -> bool {
        self == Presence::Always
    }
}

/// A capturing group of an analyzed pattern. Index 0 is the whole match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    pub index: usize,
    pub name: Option<String>,
    pub always_present: bool,
}

impl Group {
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    name: Option<&'a str>,
    presence: Presence,
}

type GroupMap<'a> = BTreeMap<usize, Entry<'a>>;

/// Classify every capturing group in `root`.
///
/// The result starts with the whole-match group 0 and then lists groups
/// 1..=N in index order.
///
/// # Panics
///
/// If `root` breaks the parser's numbering invariants: a group index that
/// occurs twice outside of separate alternation branches, or a gap in the
/// indices.
pub fn propagate(root: &Node) -> Vec<Group> {
    let map = presence(root);
    let mut groups = Vec::with_capacity(map.len() + 1);
    groups.push(Group {
        index: 0,
        name: None,
        always_present: true,
    });
    for (expected, (index, entry)) in (1..).zip(map) {
        assert_eq!(index, expected, "capturing group indices are not contiguous");
        trace!(index, name = entry.name, presence = ?entry.presence, "group presence");
        groups.push(Group {
            index,
            name: entry.name.map(str::to_owned),
            always_present: entry.presence.is_always(),
        });
    }
    groups
}

// Return the presence of every group inside `node`, assuming `node` itself
// takes part in the match.
fn presence(node: &Node) -> GroupMap<'_> {
    match node {
        Node::Literal(_) | Node::Anchor(_) | Node::Backreference(_) => GroupMap::new(),
        Node::Sequence(children) => {
            let mut map = GroupMap::new();
            for child in children {
                for (index, entry) in presence(child) {
                    let previous = map.insert(index, entry);
                    assert!(previous.is_none(), "group {index} occurs twice in one sequence");
                }
            }
            map
        }
        Node::Alternation(branches) => alternation(branches.iter().map(presence).collect()),
        Node::Group { index, name, body } => {
            let mut map = presence(body);
            let own = Entry {
                name: name.as_deref(),
                presence: Presence::Always,
            };
            let previous = map.insert(*index, own);
            assert!(previous.is_none(), "group {index} is nested inside itself");
            map
        }
        Node::NonCapturing(body) => presence(body),
        Node::Repeat { body, min, .. } if *min == 0 => downgrade(presence(body)),
        Node::Repeat { body, .. } => presence(body),
        Node::Lookaround { body, polarity, .. } => match polarity {
            Polarity::Positive => presence(body),
            Polarity::Negative => downgrade(presence(body)),
        },
        Node::Conditional { yes, no: Some(no), .. } => {
            alternation(vec![presence(yes), presence(no)])
        }
        // A missing "no" branch matches the empty string.
        Node::Conditional { yes, no: None, .. } => downgrade(presence(yes)),
    }
}

/// A group is `Always` only when every branch binds it as `Always`.
fn alternation(branches: Vec<GroupMap<'_>>) -> GroupMap<'_> {
    let count = branches.len();
    let mut merged: BTreeMap<usize, (Entry<'_>, usize)> = BTreeMap::new();
    for branch in branches {
        for (index, entry) in branch {
            match merged.entry(index) {
                MapEntry::Vacant(slot) => {
                    slot.insert((entry, 1));
                }
                MapEntry::Occupied(mut slot) => {
                    let (seen, branches_seen) = slot.get_mut();
                    seen.presence = seen.presence.and(entry.presence);
                    *branches_seen += 1;
                }
            }
        }
    }
    merged
        .into_iter()
        .map(|(index, (mut entry, branches_seen))| {
            if branches_seen < count {
                entry.presence = Presence::Conditional;
            }
            (index, entry)
        })
        .collect()
}

fn downgrade(mut map: GroupMap<'_>) -> GroupMap<'_> {
    for entry in map.values_mut() {
        entry.presence = Presence::Conditional;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Atom, Direction};

    fn lit(c: char) -> Node {
        Node::Literal(Atom::Char(c.into()))
    }

    fn group(index: usize, name: &str, body: Node) -> Node {
        Node::Group {
            index,
            name: Some(name.to_string()),
            body: Box::new(body),
        }
    }

    fn always(groups: &[Group]) -> Vec<bool> {
        groups.iter().map(|g| g.always_present).collect()
    }

    #[test]
    fn presence_and() {
        assert_eq!(Presence::Always.and(Presence::Always), Presence::Always);
        assert_eq!(Presence::Always.and(Presence::Conditional), Presence::Conditional);
        assert_eq!(Presence::Conditional.and(Presence::Always), Presence::Conditional);
    }

    #[test]
    fn literal_only_has_whole_match() {
        let groups = propagate(&lit('a'));
        assert_eq!(
            groups,
            vec![Group {
                index: 0,
                name: None,
                always_present: true
            }]
        );
    }

    #[test]
    fn sequence_keeps_child_presence() {
        let tree = Node::Sequence(vec![
            group(1, "a", lit('x')),
            Node::Repeat {
                body: Box::new(group(2, "b", lit('y'))),
                min: 0,
                max: Some(1),
            },
        ]);
        assert_eq!(always(&propagate(&tree)), vec![true, true, false]);
    }

    #[test]
    fn downgrade_reaches_nested_groups() {
        let tree = Node::Repeat {
            body: Box::new(group(1, "outer", group(2, "inner", lit('x')))),
            min: 0,
            max: None,
        };
        assert_eq!(always(&propagate(&tree)), vec![true, false, false]);
    }

    #[test]
    fn nested_optional_does_not_affect_parent() {
        let tree = group(
            1,
            "outer",
            Node::Repeat {
                body: Box::new(group(2, "inner", lit('x'))),
                min: 0,
                max: Some(1),
            },
        );
        assert_eq!(always(&propagate(&tree)), vec![true, true, false]);
    }

    #[test]
    fn shared_index_across_branches() {
        let both = Node::Alternation(vec![group(1, "x", lit('a')), group(1, "x", lit('b'))]);
        assert_eq!(always(&propagate(&both)), vec![true, true]);

        let one_optional = Node::Alternation(vec![
            group(1, "x", lit('a')),
            Node::Repeat {
                body: Box::new(group(1, "x", lit('b'))),
                min: 0,
                max: Some(1),
            },
        ]);
        assert_eq!(always(&propagate(&one_optional)), vec![true, false]);

        let missing = Node::Alternation(vec![
            group(1, "x", lit('a')),
            lit('b'),
            group(1, "x", lit('c')),
        ]);
        assert_eq!(always(&propagate(&missing)), vec![true, false]);
    }

    #[test]
    fn lookarounds() {
        let look = |polarity| Node::Lookaround {
            body: Box::new(group(1, "g", lit('a'))),
            direction: Direction::Ahead,
            polarity,
        };
        assert_eq!(always(&propagate(&look(Polarity::Positive))), vec![true, true]);
        assert_eq!(always(&propagate(&look(Polarity::Negative))), vec![true, false]);
    }

    #[test]
    #[should_panic(expected = "occurs twice")]
    fn duplicate_index_in_sequence_panics() {
        propagate(&Node::Sequence(vec![group(1, "a", lit('a')), group(1, "b", lit('b'))]));
    }

    #[test]
    #[should_panic(expected = "not contiguous")]
    fn index_gap_panics() {
        propagate(&group(2, "a", lit('a')));
    }
}
