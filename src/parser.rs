use std::collections::HashMap;

use crate::ast::{
    Anchor, Atom, ClassItem, Direction, GroupRef, Node, PerlClass, PerlKind, Polarity, Width,
};
use crate::error::{ErrorKind, PatternSyntaxError};
use crate::flags::Flags;

type Result<T> = std::result::Result<T, PatternSyntaxError>;

/// Repeat bounds at or above this are rejected.
const MAX_REPEAT: u64 = u32::MAX as u64;

/// Groups may nest this deep. Deeper patterns are rejected so that
/// neither parsing nor analysis can exhaust the stack.
pub const MAX_NESTING: usize = 200;

const WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\u{b}', '\u{c}'];

/// Parse `pattern` under `flags` into a tree.
pub fn parse(pattern: &str, flags: Flags) -> Result<Node> {
    Parser::new(pattern, flags).parse()
}

/// Parser for regular expressions.
///
/// The `Parser` struct holds the pattern and the current byte position.
/// It also tracks capturing groups: the next index to hand out, names,
/// which groups are still open and the width of every closed group.
pub struct Parser<'a> {
    pattern: &'a str,
    pos: usize,
    flags: Flags,
    next_group_index: usize,
    names: HashMap<String, usize>,
    open_groups: Vec<usize>,
    group_widths: HashMap<usize, Width>,
    // First group index allocated inside the outermost enclosing lookbehind.
    lookbehind_groups: Option<usize>,
    // Conditionals may name a group that is opened later in the pattern.
    forward_conditions: Vec<(usize, usize)>,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str, flags: Flags) -> Self {
        Self {
            pattern,
            pos: 0,
            flags,
            next_group_index: 1,
            names: HashMap::new(),
            open_groups: Vec::new(),
            group_widths: HashMap::new(),
            lookbehind_groups: None,
            forward_conditions: Vec::new(),
            depth: 0,
        }
    }

    /// Flags in effect after parsing, including leading inline flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of capturing groups seen so far.
    pub fn group_count(&self) -> usize {
        self.next_group_index - 1
    }

    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Advance past `expected` if it is the next character.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Error at byte offset `at`, reported as a character offset.
    fn error_at(&self, kind: ErrorKind, at: usize) -> PatternSyntaxError {
        PatternSyntaxError::new(kind, self.pattern[..at].chars().count())
    }

    fn text(&self, from: usize) -> String {
        self.pattern[from..self.pos].to_string()
    }

    /// Entry point for parsing a regex pattern.
    ///
    /// Example:
    /// - Pattern: `a|b` → Alternation([Literal('a'), Literal('b')])
    pub fn parse(&mut self) -> Result<Node> {
        let verbose = self.flags.contains(Flags::VERBOSE);
        let node = self.parse_alt(verbose, true)?;
        if self.peek().is_some() {
            // Only an unmatched ')' stops the top-level alternation early.
            return Err(self.error_at(ErrorKind::UnbalancedParen, self.pos));
        }
        for &(index, at) in &self.forward_conditions {
            if index >= self.next_group_index {
                return Err(self.error_at(ErrorKind::InvalidGroupReference(index.to_string()), at));
            }
        }
        self.check_type_flags()?;
        Ok(node)
    }

    fn check_type_flags(&self) -> Result<()> {
        let kind = if self.flags.contains(Flags::LOCALE) {
            ErrorKind::LocaleFlag
        } else if self.flags.contains(Flags::ASCII | Flags::UNICODE) {
            ErrorKind::AsciiUnicode
        } else {
            return Ok(());
        };
        Err(PatternSyntaxError {
            kind,
            position: None,
        })
    }

    /// Parse alternation (`|`) in the pattern.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Alternation([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `abc`   → Sequence([Literal('a'), Literal('b'), Literal('c')])
    fn parse_alt(&mut self, verbose: bool, first: bool) -> Result<Node> {
        let mut verbose = verbose;
        let mut branches = vec![self.parse_seq(&mut verbose, first)?];
        while self.eat('|') {
            branches.push(self.parse_seq(&mut verbose, false)?);
        }
        if branches.len() == 1 {
            Ok(branches.swap_remove(0))
        } else {
            Ok(Node::Alternation(branches))
        }
    }

    /// Parse a sequence of regex atoms (concatenation) with their
    /// quantifiers. Leading global flags may switch `verbose` on.
    ///
    /// Example:
    /// - Pattern: `a(b|c)d` → Sequence([Literal('a'), Group, Literal('d')])
    fn parse_seq(&mut self, verbose: &mut bool, first: bool) -> Result<Node> {
        let mut items = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == '|' || ch == ')' {
                break;
            }
            let start = self.pos;
            self.advance();
            if *verbose {
                if WHITESPACE.contains(&ch) {
                    continue;
                }
                if ch == '#' {
                    self.skip_comment()?;
                    continue;
                }
            }
            match ch {
                '*' | '+' | '?' | '{' => self.parse_repeat(ch, start, &mut items)?,
                '(' => match self.parse_nested(start, *verbose, first && items.is_empty())? {
                    Some(node) => items.push(node),
                    None => *verbose |= self.flags.contains(Flags::VERBOSE),
                },
                '[' => items.push(self.parse_char_class(start)?),
                '\\' => items.push(self.parse_escape(start)?),
                '.' => items.push(Node::Literal(Atom::Any)),
                '^' => items.push(Node::Anchor(Anchor::LineStart)),
                '$' => items.push(Node::Anchor(Anchor::LineEnd)),
                c => items.push(Node::Literal(Atom::Char(c.into()))),
            }
        }
        if items.len() == 1 {
            Ok(items.swap_remove(0))
        } else {
            Ok(Node::Sequence(items))
        }
    }

    /// Skip a verbose-mode comment up to and including the newline.
    fn skip_comment(&mut self) -> Result<()> {
        while let Some(c) = self.advance() {
            match c {
                '\n' => break,
                '\\' => {
                    if self.advance().is_none() {
                        return Err(self.error_at(ErrorKind::TrailingBackslash, self.pos - 1));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply a quantifier to the last item of the sequence.
    ///
    /// Example:
    /// - Pattern: `a?`     → Repeat { body: Literal('a'), min: 0, max: Some(1) }
    /// - Pattern: `b{2,}`  → Repeat { body: Literal('b'), min: 2, max: None }
    /// - Pattern: `c{x`    → `{` is a plain literal
    fn parse_repeat(&mut self, ch: char, start: usize, items: &mut Vec<Node>) -> Result<()> {
        let (min, max) = match ch {
            '*' => (0, None),
            '+' => (1, None),
            '?' => (0, Some(1)),
            _ => match self.parse_bounds(start)? {
                Some(bounds) => bounds,
                None => {
                    items.push(Node::Literal(Atom::Char('{'.into())));
                    return Ok(());
                }
            },
        };
        let body = match items.pop() {
            None | Some(Node::Anchor(_)) => {
                return Err(self.error_at(ErrorKind::NothingToRepeat, start));
            }
            Some(Node::Repeat { .. }) => {
                return Err(self.error_at(ErrorKind::MultipleRepeat, start));
            }
            Some(node) => node,
        };
        // Lazy and possessive suffixes.
        if !self.eat('?') {
            self.eat('+');
        }
        items.push(Node::Repeat {
            body: Box::new(body),
            min,
            max,
        });
        Ok(())
    }

    /// Parse `m}`, `m,}`, `,n}` or `m,n}` after a `{`. Returns `None`, with
    /// the position restored, when the text is not a bound.
    fn parse_bounds(&mut self, start: usize) -> Result<Option<(u32, Option<u32>)>> {
        if self.peek() == Some('}') {
            return Ok(None);
        }
        let here = self.pos;
        let lo = self.take_digits();
        let hi = if self.eat(',') {
            Some(self.take_digits())
        } else {
            None
        };
        if !self.eat('}') {
            self.pos = here;
            return Ok(None);
        }
        let min = if lo.is_empty() {
            0
        } else {
            self.repeat_count(lo, start)?
        };
        let max = match hi {
            None => Some(min),
            Some("") => None,
            Some(hi) => {
                let max = self.repeat_count(hi, start)?;
                if max < min {
                    return Err(self.error_at(ErrorKind::RepeatRange, start));
                }
                Some(max)
            }
        };
        Ok(Some((min, max)))
    }

    fn take_digits(&mut self) -> &'a str {
        let pattern = self.pattern;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        &pattern[start..self.pos]
    }

    fn repeat_count(&self, digits: &str, start: usize) -> Result<u32> {
        digits
            .parse::<u64>()
            .ok()
            .filter(|n| *n < MAX_REPEAT)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.error_at(ErrorKind::RepeatTooLarge, start))
    }

    /// Parse a group one level deeper than the current one.
    fn parse_nested(
        &mut self,
        start: usize,
        verbose: bool,
        at_start: bool,
    ) -> Result<Option<Node>> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(ErrorKind::TooDeeplyNested, start));
        }
        self.depth += 1;
        let node = self.parse_group(start, verbose, at_start);
        self.depth -= 1;
        node
    }

    /// Parse everything after a `(`.
    ///
    /// Returns `None` for constructs that leave nothing in the tree:
    /// comments and leading global flags.
    ///
    /// Examples:
    /// - Pattern: `(abc)`         → Group { index, name: None, .. }
    /// - Pattern: `(?P<y>\d)`     → Group { index, name: Some("y"), .. }
    /// - Pattern: `(?:abc)`       → NonCapturing(..)
    /// - Pattern: `(?<!x)`        → Lookaround { direction: Behind, polarity: Negative, .. }
    /// - Pattern: `(?P=y)`        → Backreference(GroupRef { name: Some("y"), .. })
    /// - Pattern: `(?(1)a|b)`     → Conditional { .. }
    fn parse_group(&mut self, start: usize, verbose: bool, at_start: bool) -> Result<Option<Node>> {
        if !self.eat('?') {
            return self.parse_capture(start, None, verbose).map(Some);
        }
        let Some(c) = self.advance() else {
            return Err(self.error_at(ErrorKind::UnexpectedEnd, self.pos));
        };
        let node = match c {
            'P' => {
                if self.eat('<') {
                    let name = self.parse_group_name('>')?;
                    self.parse_capture(start, Some(name), verbose)?
                } else if self.eat('=') {
                    let name_start = self.pos;
                    let name = self.parse_group_name(')')?;
                    let index = self.resolve_name(&name, name_start)?;
                    self.check_closed(index, name_start)?;
                    self.check_lookbehind_ref(index, name_start)?;
                    Node::Backreference(GroupRef {
                        index,
                        name: Some(name),
                    })
                } else {
                    return Err(match self.advance() {
                        Some(c) => {
                            self.error_at(ErrorKind::UnknownExtension(format!("?P{c}")), start)
                        }
                        None => self.error_at(ErrorKind::UnexpectedEnd, self.pos),
                    });
                }
            }
            ':' | '>' => Node::NonCapturing(Box::new(self.parse_subpattern(start, verbose)?)),
            '#' => {
                loop {
                    match self.advance() {
                        Some(')') => break,
                        // An escaped character never closes the comment.
                        Some('\\') => {
                            if self.advance().is_none() {
                                return Err(self.error_at(ErrorKind::UnterminatedComment, start));
                            }
                        }
                        Some(_) => {}
                        None => return Err(self.error_at(ErrorKind::UnterminatedComment, start)),
                    }
                }
                return Ok(None);
            }
            '=' => self.parse_lookaround(start, Direction::Ahead, Polarity::Positive, verbose)?,
            '!' => self.parse_lookaround(start, Direction::Ahead, Polarity::Negative, verbose)?,
            '<' => match self.advance() {
                Some('=') => {
                    self.parse_lookaround(start, Direction::Behind, Polarity::Positive, verbose)?
                }
                Some('!') => {
                    self.parse_lookaround(start, Direction::Behind, Polarity::Negative, verbose)?
                }
                Some(c) => {
                    return Err(self.error_at(ErrorKind::UnknownExtension(format!("?<{c}")), start));
                }
                None => return Err(self.error_at(ErrorKind::UnexpectedEnd, self.pos)),
            },
            '(' => self.parse_conditional(start, verbose)?,
            c if c == '-' || Flags::from_letter(c).is_some() => {
                return self.parse_flags(c, start, verbose, at_start);
            }
            c => return Err(self.error_at(ErrorKind::UnknownExtension(format!("?{c}")), start)),
        };
        Ok(Some(node))
    }

    /// Parse a group body up to its closing `)`.
    fn parse_subpattern(&mut self, start: usize, verbose: bool) -> Result<Node> {
        let body = self.parse_alt(verbose, false)?;
        if !self.eat(')') {
            return Err(self.error_at(ErrorKind::MissingParen, start));
        }
        Ok(body)
    }

    fn parse_capture(&mut self, start: usize, name: Option<String>, verbose: bool) -> Result<Node> {
        let index = self.next_group_index;
        self.next_group_index += 1;
        if let Some(name) = &name {
            self.names.entry(name.clone()).or_insert(index);
        }
        self.open_groups.push(index);
        let body = self.parse_subpattern(start, verbose)?;
        self.open_groups.pop();
        let width = body.width(&self.group_widths);
        self.group_widths.insert(index, width);
        Ok(Node::Group {
            index,
            name,
            body: Box::new(body),
        })
    }

    fn parse_lookaround(
        &mut self,
        start: usize,
        direction: Direction,
        polarity: Polarity,
        verbose: bool,
    ) -> Result<Node> {
        let outer = self.lookbehind_groups;
        if direction == Direction::Behind && outer.is_none() {
            self.lookbehind_groups = Some(self.next_group_index);
        }
        let body = self.parse_subpattern(start, verbose);
        self.lookbehind_groups = outer;
        let body = body?;
        if direction == Direction::Behind {
            let (lo, hi) = body.width(&self.group_widths);
            if hi != Some(lo) {
                return Err(self.error_at(ErrorKind::LookbehindWidth, start));
            }
        }
        Ok(Node::Lookaround {
            body: Box::new(body),
            direction,
            polarity,
        })
    }

    /// Parse `(?(id)yes|no)` after the `(?(`.
    fn parse_conditional(&mut self, start: usize, verbose: bool) -> Result<Node> {
        let name_start = self.pos;
        let text = self.parse_until(')', ErrorKind::MissingGroupName)?;
        let condition = if is_identifier(text) {
            GroupRef {
                index: self.resolve_name(text, name_start)?,
                name: Some(text.to_string()),
            }
        } else {
            if !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(self.error_at(ErrorKind::BadGroupName(text.to_string()), name_start));
            }
            let index = text.parse::<usize>().map_err(|_| {
                self.error_at(ErrorKind::InvalidGroupReference(text.to_string()), name_start)
            })?;
            if index == 0 {
                return Err(self.error_at(ErrorKind::BadGroupNumber, name_start));
            }
            if index >= self.next_group_index {
                self.forward_conditions.push((index, name_start));
            }
            GroupRef { index, name: None }
        };
        self.check_lookbehind_ref(condition.index, name_start)?;

        let mut branch_verbose = verbose;
        let yes = self.parse_seq(&mut branch_verbose, false)?;
        let no = if self.eat('|') {
            let no = self.parse_seq(&mut branch_verbose, false)?;
            if self.peek() == Some('|') {
                return Err(self.error_at(ErrorKind::ConditionalBranches, self.pos));
            }
            Some(Box::new(no))
        } else {
            None
        };
        if !self.eat(')') {
            return Err(self.error_at(ErrorKind::MissingParen, start));
        }
        Ok(Node::Conditional {
            condition,
            yes: Box::new(yes),
            no,
        })
    }

    /// Parse inline flags starting at `first`, which is a flag letter or `-`.
    ///
    /// Examples:
    /// - Pattern: `(?i)abc`      → global flags, nothing added to the tree
    /// - Pattern: `(?x-i:a b)`   → NonCapturing(..) parsed in verbose mode
    fn parse_flags(
        &mut self,
        first: char,
        start: usize,
        verbose: bool,
        at_start: bool,
    ) -> Result<Option<Node>> {
        let mut add = Flags::empty();
        let mut del = Flags::empty();
        let mut c = first;
        if c != '-' {
            loop {
                let Some(flag) = Flags::from_letter(c) else {
                    return Err(self.error_at(ErrorKind::UnknownFlag, self.pos));
                };
                if flag == Flags::LOCALE {
                    return Err(self.error_at(ErrorKind::InlineLocale, self.pos));
                }
                add |= flag;
                if !flag.type_flags().is_empty() && add.type_flags() != flag {
                    return Err(self.error_at(ErrorKind::IncompatibleFlags, self.pos));
                }
                c = self
                    .advance()
                    .ok_or_else(|| self.error_at(ErrorKind::MissingFlagTerminator, self.pos))?;
                if matches!(c, ')' | '-' | ':') {
                    break;
                }
                if Flags::from_letter(c).is_none() {
                    let kind = if c.is_alphabetic() {
                        ErrorKind::UnknownFlag
                    } else {
                        ErrorKind::MissingFlagTerminator
                    };
                    return Err(self.error_at(kind, self.pos - c.len_utf8()));
                }
            }
        }
        if c == ')' {
            if !at_start {
                return Err(self.error_at(ErrorKind::GlobalFlagsNotAtStart, start));
            }
            self.flags |= add;
            return Ok(None);
        }
        if c == '-' {
            c = self
                .advance()
                .ok_or_else(|| self.error_at(ErrorKind::MissingFlag, self.pos))?;
            loop {
                let Some(flag) = Flags::from_letter(c) else {
                    let kind = if c.is_alphabetic() {
                        ErrorKind::UnknownFlag
                    } else if del.is_empty() {
                        ErrorKind::MissingFlag
                    } else {
                        ErrorKind::MissingColon
                    };
                    return Err(self.error_at(kind, self.pos - c.len_utf8()));
                };
                if !flag.type_flags().is_empty() {
                    return Err(self.error_at(ErrorKind::TurnOffTypeFlag, self.pos));
                }
                del |= flag;
                c = self
                    .advance()
                    .ok_or_else(|| self.error_at(ErrorKind::MissingColon, self.pos))?;
                if c == ':' {
                    break;
                }
            }
        }
        if add.intersects(del) {
            return Err(self.error_at(ErrorKind::FlagOnAndOff, start));
        }
        let verbose = (verbose || add.contains(Flags::VERBOSE)) && !del.contains(Flags::VERBOSE);
        let body = self.parse_subpattern(start, verbose)?;
        Ok(Some(Node::NonCapturing(Box::new(body))))
    }

    /// Read up to `terminator` and check the result is an identifier.
    fn parse_group_name(&mut self, terminator: char) -> Result<String> {
        let start = self.pos;
        let name = self.parse_until(terminator, ErrorKind::MissingGroupName)?;
        if !is_identifier(name) {
            return Err(self.error_at(ErrorKind::BadGroupName(name.to_string()), start));
        }
        Ok(name.to_string())
    }

    /// Read a non-empty run of text ending in `terminator`, consuming the
    /// terminator.
    fn parse_until(&mut self, terminator: char, missing: ErrorKind) -> Result<&'a str> {
        let pattern = self.pattern;
        let start = self.pos;
        loop {
            match self.advance() {
                Some(c) if c == terminator => break,
                Some(_) => {}
                None if self.pos == start => return Err(self.error_at(missing, start)),
                None => return Err(self.error_at(ErrorKind::UnterminatedName(terminator), start)),
            }
        }
        let text = &pattern[start..self.pos - terminator.len_utf8()];
        if text.is_empty() {
            return Err(self.error_at(missing, start));
        }
        Ok(text)
    }

    fn resolve_name(&self, name: &str, at: usize) -> Result<usize> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| self.error_at(ErrorKind::UnknownGroupName(name.to_string()), at))
    }

    fn check_closed(&self, index: usize, at: usize) -> Result<()> {
        if index >= self.next_group_index || self.open_groups.contains(&index) {
            return Err(self.error_at(ErrorKind::OpenGroupReference, at));
        }
        Ok(())
    }

    fn check_lookbehind_ref(&self, index: usize, at: usize) -> Result<()> {
        let Some(first) = self.lookbehind_groups else {
            return Ok(());
        };
        self.check_closed(index, at)?;
        if index >= first {
            return Err(self.error_at(ErrorKind::LookbehindGroupRef, at));
        }
        Ok(())
    }

    /// Parse an escape sequence outside a character class; `start` is the
    /// position of the backslash.
    ///
    /// Examples:
    /// - Pattern: `\d`   → Literal(Perl(Digit))
    /// - Pattern: `\b`   → Anchor(WordBoundary)
    /// - Pattern: `\1`   → Backreference(GroupRef { index: 1, .. })
    /// - Pattern: `\101` → Literal('A')
    fn parse_escape(&mut self, start: usize) -> Result<Node> {
        let Some(c) = self.advance() else {
            return Err(self.error_at(ErrorKind::TrailingBackslash, start));
        };
        let node = match c {
            'A' => Node::Anchor(Anchor::TextStart),
            'Z' => Node::Anchor(Anchor::TextEnd),
            'b' => Node::Anchor(Anchor::WordBoundary),
            'B' => Node::Anchor(Anchor::NotWordBoundary),
            '1'..='9' => return self.parse_numeric_escape(c, start),
            c => match perl_class(c) {
                Some(class) => Node::Literal(Atom::Perl(class)),
                None => Node::Literal(Atom::Char(self.parse_char_escape(c, start)?)),
            },
        };
        Ok(node)
    }

    /// `\1`..`\99` are backreferences, except that three octal digits form
    /// an octal escape.
    fn parse_numeric_escape(&mut self, first: char, start: usize) -> Result<Node> {
        if let Some(second) = self.peek().filter(char::is_ascii_digit) {
            self.advance();
            if is_octal(first) && is_octal(second) && self.peek().is_some_and(is_octal) {
                self.advance();
                return Ok(Node::Literal(Atom::Char(self.octal_value(start)?)));
            }
        }
        let index = self.pattern[start + 1..self.pos]
            .bytes()
            .fold(0, |n, b| n * 10 + usize::from(b - b'0'));
        if index >= self.next_group_index {
            return Err(self.error_at(ErrorKind::InvalidGroupReference(index.to_string()), start));
        }
        self.check_closed(index, start)?;
        self.check_lookbehind_ref(index, start)?;
        Ok(Node::Backreference(GroupRef { index, name: None }))
    }

    /// Escapes that read the same inside and outside a class. Returns the
    /// code point the escape stands for.
    fn parse_char_escape(&mut self, c: char, start: usize) -> Result<u32> {
        let code = match c {
            'a' => 0x7,
            'f' => 0xc,
            'n' => 0xa,
            'r' => 0xd,
            't' => 0x9,
            'v' => 0xb,
            'x' => self.parse_hex(2, start)?,
            'u' => self.parse_hex(4, start)?,
            'U' => self.parse_hex(8, start)?,
            'N' => self.parse_named_char(start)?,
            '0'..='7' => {
                for _ in 0..2 {
                    if !self.peek().is_some_and(is_octal) {
                        break;
                    }
                    self.advance();
                }
                self.octal_value(start)?
            }
            c if c.is_ascii_alphanumeric() => {
                return Err(self.error_at(ErrorKind::BadEscape(self.text(start)), start));
            }
            c => c.into(),
        };
        Ok(code)
    }

    /// Surrogates are accepted; only values past the last code point fail.
    fn parse_hex(&mut self, digits: usize, start: usize) -> Result<u32> {
        let from = self.pos;
        for _ in 0..digits {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(self.error_at(ErrorKind::IncompleteEscape(self.text(start)), start));
            }
            self.advance();
        }
        u32::from_str_radix(&self.pattern[from..self.pos], 16)
            .ok()
            .filter(|code| *code <= u32::from(char::MAX))
            .ok_or_else(|| self.error_at(ErrorKind::BadEscape(self.text(start)), start))
    }

    fn octal_value(&self, start: usize) -> Result<u32> {
        let text = &self.pattern[start + 1..self.pos];
        u32::from_str_radix(text, 8)
            .ok()
            .filter(|v| *v <= 0o377)
            .ok_or_else(|| self.error_at(ErrorKind::OctalOutOfRange(self.text(start)), start))
    }

    /// `\N{NAME}`, looked up in the Unicode name table.
    fn parse_named_char(&mut self, start: usize) -> Result<u32> {
        if !self.eat('{') {
            return Err(self.error_at(ErrorKind::Missing('{'), start));
        }
        let name = self.parse_until('}', ErrorKind::MissingCharName)?;
        unicode_names2::character(name)
            .map(u32::from)
            .ok_or_else(|| self.error_at(ErrorKind::UndefinedCharName(name.to_string()), start))
    }

    /// Parse a character class after its `[`, e.g. `[abc]`, `[^a-z]`, `[]x]`.
    ///
    /// Examples:
    /// - Pattern: `[a-c\d]` → Class { items: [Range('a','c'), Perl(Digit)], negated: false }
    /// - Pattern: `[^xyz]`  → Class { items: ['x','y','z'], negated: true }
    fn parse_char_class(&mut self, start: usize) -> Result<Node> {
        let negated = self.eat('^');
        let mut items = Vec::new();
        loop {
            let item_start = self.pos;
            let Some(ch) = self.advance() else {
                return Err(self.error_at(ErrorKind::UnterminatedSet, start));
            };
            if ch == ']' && !items.is_empty() {
                break;
            }
            let first = self.parse_class_item(ch, item_start)?;
            if !self.eat('-') {
                items.push(first);
                continue;
            }
            let that_start = self.pos;
            let Some(that) = self.advance() else {
                return Err(self.error_at(ErrorKind::UnterminatedSet, start));
            };
            if that == ']' {
                items.push(first);
                items.push(ClassItem::Char('-'.into()));
                break;
            }
            match (first, self.parse_class_item(that, that_start)?) {
                (ClassItem::Char(lo), ClassItem::Char(hi)) if lo <= hi => {
                    items.push(ClassItem::Range(lo, hi));
                }
                _ => {
                    let range = self.text(item_start);
                    return Err(self.error_at(ErrorKind::BadRange(range), item_start));
                }
            }
        }
        Ok(Node::Literal(Atom::Class { items, negated }))
    }

    fn parse_class_item(&mut self, ch: char, start: usize) -> Result<ClassItem> {
        if ch != '\\' {
            return Ok(ClassItem::Char(ch.into()));
        }
        let Some(c) = self.advance() else {
            return Err(self.error_at(ErrorKind::TrailingBackslash, start));
        };
        if let Some(class) = perl_class(c) {
            return Ok(ClassItem::Perl(class));
        }
        let item = match c {
            'b' => ClassItem::Char(0x8),
            '8' | '9' => return Err(self.error_at(ErrorKind::BadEscape(self.text(start)), start)),
            c => ClassItem::Char(self.parse_char_escape(c, start)?),
        };
        Ok(item)
    }
}

fn perl_class(c: char) -> Option<PerlClass> {
    let kind = match c.to_ascii_lowercase() {
        'd' => PerlKind::Digit,
        's' => PerlKind::Space,
        'w' => PerlKind::Word,
        _ => return None,
    };
    Some(PerlClass {
        kind,
        negated: c.is_ascii_uppercase(),
    })
}

fn is_octal(c: char) -> bool {
    matches!(c, '0'..='7')
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
