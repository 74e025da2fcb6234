use thiserror::Error;

/// A malformed pattern. `position` is a character offset into the pattern
/// when one can be attributed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", .position.map(|p| format!(" at position {p}")).unwrap_or_default())]
pub struct PatternSyntaxError {
    pub kind: ErrorKind,
    pub position: Option<usize>,
}

impl PatternSyntaxError {
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position: Some(position),
        }
    }

    /// Diagnostic text without the position suffix.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("missing ), unterminated subpattern")]
    MissingParen,
    #[error("unbalanced parenthesis")]
    UnbalancedParen,
    #[error("nothing to repeat")]
    NothingToRepeat,
    #[error("multiple repeat")]
    MultipleRepeat,
    #[error("min repeat greater than max repeat")]
    RepeatRange,
    #[error("the repetition number is too large")]
    RepeatTooLarge,
    #[error("bad escape {0}")]
    BadEscape(String),
    #[error("bad escape (end of pattern)")]
    TrailingBackslash,
    #[error("incomplete escape {0}")]
    IncompleteEscape(String),
    #[error("octal escape value {0} outside of range 0-0o377")]
    OctalOutOfRange(String),
    #[error("bad character range {0}")]
    BadRange(String),
    #[error("unterminated character set")]
    UnterminatedSet,
    #[error("missing group name")]
    MissingGroupName,
    #[error("missing character name")]
    MissingCharName,
    #[error("undefined character name '{0}'")]
    UndefinedCharName(String),
    #[error("bad character in group name '{0}'")]
    BadGroupName(String),
    #[error("missing {0}, unterminated name")]
    UnterminatedName(char),
    #[error("missing {0}")]
    Missing(char),
    #[error("unknown group name '{0}'")]
    UnknownGroupName(String),
    #[error("invalid group reference {0}")]
    InvalidGroupReference(String),
    #[error("bad group number")]
    BadGroupNumber,
    #[error("cannot refer to an open group")]
    OpenGroupReference,
    #[error("cannot refer to group defined in the same lookbehind subpattern")]
    LookbehindGroupRef,
    #[error("unknown extension {0}")]
    UnknownExtension(String),
    #[error("unexpected end of pattern")]
    UnexpectedEnd,
    #[error("missing ), unterminated comment")]
    UnterminatedComment,
    #[error("too many nested parentheses")]
    TooDeeplyNested,
    #[error("conditional backref with more than two branches")]
    ConditionalBranches,
    #[error("look-behind requires fixed-width pattern")]
    LookbehindWidth,
    #[error("global flags not at the start of the expression")]
    GlobalFlagsNotAtStart,
    #[error("unknown flag")]
    UnknownFlag,
    #[error("missing flag")]
    MissingFlag,
    #[error("missing -, : or )")]
    MissingFlagTerminator,
    #[error("missing :")]
    MissingColon,
    #[error("bad inline flags: flags 'a', 'u' and 'L' are incompatible")]
    IncompatibleFlags,
    #[error("bad inline flags: cannot turn off flags 'a', 'u' and 'L'")]
    TurnOffTypeFlag,
    #[error("bad inline flags: flag turned on and off")]
    FlagOnAndOff,
    #[error("bad inline flags: cannot use 'L' flag with a str pattern")]
    InlineLocale,
    #[error("cannot use LOCALE flag with a str pattern")]
    LocaleFlag,
    #[error("ASCII and UNICODE flags are incompatible")]
    AsciiUnicode,
}
