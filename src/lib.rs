//! Static presence analysis for named regex capture groups.
//!
//! [`analyze`] parses a pattern and reports, for every capturing group,
//! whether it is guaranteed to bind a value whenever the whole pattern
//! matches. The pattern is never compiled or executed.

pub mod analyzer;
pub mod ast;
pub mod error;
pub mod flags;
pub mod parser;
pub mod registry;

pub use analyzer::{propagate, Group, Presence};
pub use error::{ErrorKind, PatternSyntaxError};
pub use flags::Flags;
pub use parser::{parse, Parser};
pub use registry::{Access, AccessError, AttributeType, GroupRegistry};

use tracing::debug;

/// Parse `pattern` and classify its groups.
///
/// The returned list covers group 0 (the whole match) through the highest
/// group index, in order.
pub fn analyze(pattern: &str, flags: Flags) -> Result<Vec<Group>, PatternSyntaxError> {
    let mut parser = Parser::new(pattern, flags);
    let root = parser.parse()?;
    let groups = propagate(&root);
    debug!(
        pattern,
        flags = ?parser.flags(),
        groups = parser.group_count(),
        "analyzed pattern"
    );
    Ok(groups)
}
