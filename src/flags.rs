use bitflags::bitflags;

bitflags! {
    /// Compile flags. Bit values match the host `re` module so raw integers
    /// coming from a host adapter can be passed straight through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        const IGNORECASE = 2;
        const LOCALE = 4;
        const MULTILINE = 8;
        const DOTALL = 16;
        const UNICODE = 32;
        const VERBOSE = 64;
        const DEBUG = 128;
        const ASCII = 256;
    }
}

impl Flags {
    /// Flag for an inline flag letter (`(?imsx)` and friends).
    pub fn from_letter(c: char) -> Option<Self> {
        Some(match c {
            'i' => Flags::IGNORECASE,
            'L' => Flags::LOCALE,
            'm' => Flags::MULTILINE,
            's' => Flags::DOTALL,
            'u' => Flags::UNICODE,
            'x' => Flags::VERBOSE,
            'a' => Flags::ASCII,
            _ => return None,
        })
    }

    /// Flags that select the character-type table; at most one may be set.
    pub fn type_flags(self) -> Self {
        self & (Flags::ASCII | Flags::LOCALE | Flags::UNICODE)
    }
}
