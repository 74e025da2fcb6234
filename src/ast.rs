use std::collections::HashMap;

/// Minimum and maximum number of characters a node can consume. `None` as
/// the maximum means unbounded.
pub type Width = (usize, Option<usize>);

/// Parsed regex tree.
///
/// Group indices are assigned by the parser in order of the opening
/// parenthesis, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(Atom),
    Anchor(Anchor),
    Sequence(Vec<Node>),
    Alternation(Vec<Node>),
    Group {
        index: usize,
        name: Option<String>,
        body: Box<Node>,
    },
    NonCapturing(Box<Node>),
    Repeat {
        body: Box<Node>,
        min: u32,
        max: Option<u32>,
    },
    Lookaround {
        body: Box<Node>,
        direction: Direction,
        polarity: Polarity,
    },
    Backreference(GroupRef),
    Conditional {
        condition: GroupRef,
        yes: Box<Node>,
        no: Option<Box<Node>>,
    },
}

/// A single-character matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// A code point. Lone surrogates such as `\ud800` are valid here, so
    /// this is not a `char`.
    Char(u32),
    Any,
    Class { items: Vec<ClassItem>, negated: bool },
    Perl(PerlClass),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Char(u32),
    Range(u32, u32),
    Perl(PerlClass),
}

/// `\d`, `\s`, `\w` and their negations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerlClass {
    pub kind: PerlKind,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerlKind {
    Digit,
    Space,
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LineStart,
    LineEnd,
    TextStart,
    TextEnd,
    WordBoundary,
    NotWordBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ahead,
    Behind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

/// A reference to a capturing group, from a backreference or a
/// conditional. Always resolved to an index; the name is kept when the
/// source used one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub index: usize,
    pub name: Option<String>,
}

impl Node {
    /// Width of this node. `groups` supplies the widths of closed groups
    /// so that backreferences can be measured; unknown ones are unbounded.
    pub fn width(&self, groups: &HashMap<usize, Width>) -> Width {
        match self {
            Node::Literal(_) => (1, Some(1)),
            Node::Anchor(_) | Node::Lookaround { .. } => (0, Some(0)),
            Node::Sequence(children) => children.iter().fold((0, Some(0)), |(lo, hi), c| {
                let (clo, chi) = c.width(groups);
                (lo.saturating_add(clo), hi.zip(chi).and_then(|(a, b)| a.checked_add(b)))
            }),
            Node::Alternation(branches) => widest(branches.iter(), groups),
            Node::Group { body, .. } | Node::NonCapturing(body) => body.width(groups),
            Node::Repeat { body, min, max } => {
                let (lo, hi) = body.width(groups);
                let hi = match (hi, max) {
                    (Some(0), _) => Some(0),
                    (Some(h), Some(m)) => h.checked_mul(*m as usize),
                    _ => None,
                };
                (lo.saturating_mul(*min as usize), hi)
            }
            Node::Backreference(r) => groups.get(&r.index).copied().unwrap_or((0, None)),
            Node::Conditional { yes, no: Some(no), .. } => {
                widest([yes.as_ref(), no.as_ref()].into_iter(), groups)
            }
            Node::Conditional { yes, no: None, .. } => (0, yes.width(groups).1),
        }
    }
}

fn widest<'a>(mut nodes: impl Iterator<Item = &'a Node>, groups: &HashMap<usize, Width>) -> Width {
    let Some(first) = nodes.next() else {
        return (0, Some(0));
    };
    nodes.fold(first.width(groups), |(lo, hi), n| {
        let (nlo, nhi) = n.width(groups);
        (lo.min(nlo), hi.zip(nhi).map(|(a, b)| a.max(b)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(c: char) -> Node {
        Node::Literal(Atom::Char(c.into()))
    }

    #[test]
    fn sequence_width_is_sum() {
        let n = Node::Sequence(vec![lit('a'), lit('b'), Node::Anchor(Anchor::LineEnd)]);
        assert_eq!(n.width(&HashMap::new()), (2, Some(2)));
    }

    #[test]
    fn alternation_width_spans_branches() {
        let n = Node::Alternation(vec![lit('a'), Node::Sequence(vec![lit('b'), lit('c')])]);
        assert_eq!(n.width(&HashMap::new()), (1, Some(2)));
    }

    #[test]
    fn unbounded_repeat_has_no_max() {
        let n = Node::Repeat {
            body: Box::new(lit('a')),
            min: 1,
            max: None,
        };
        assert_eq!(n.width(&HashMap::new()), (1, None));
    }

    #[test]
    fn backreference_uses_group_width() {
        let groups = HashMap::from([(1, (3, Some(3)))]);
        let n = Node::Backreference(GroupRef { index: 1, name: None });
        assert_eq!(n.width(&groups), (3, Some(3)));
        assert_eq!(n.width(&HashMap::new()), (0, None));
    }

    #[test]
    fn conditional_without_no_branch_can_be_empty() {
        let n = Node::Conditional {
            condition: GroupRef { index: 1, name: None },
            yes: Box::new(Node::Sequence(vec![lit('a'), lit('b')])),
            no: None,
        };
        assert_eq!(n.width(&HashMap::new()), (0, Some(2)));
    }

    #[test]
    fn repeat_of_zero_width_stays_zero() {
        let n = Node::Repeat {
            body: Box::new(Node::Anchor(Anchor::WordBoundary)),
            min: 0,
            max: None,
        };
        assert_eq!(n.width(&HashMap::new()), (0, Some(0)));
    }
}
