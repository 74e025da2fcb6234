//! End-to-end presence analysis over real patterns.

use re_static::{analyze, ErrorKind, Flags, Group};
use rstest::rstest;

fn named(groups: &[Group]) -> Vec<(&str, bool)> {
    groups
        .iter()
        .filter_map(|g| Some((g.name.as_deref()?, g.always_present)))
        .collect()
}

fn presence(pattern: &str) -> Vec<bool> {
    analyze(pattern, Flags::empty())
        .unwrap_or_else(|e| panic!("{pattern:?}: {e}"))
        .iter()
        .skip(1)
        .map(|g| g.always_present)
        .collect()
}

#[test]
fn date_pattern_groups_are_all_required() {
    let pattern = r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})";
    let groups = analyze(pattern, Flags::empty()).unwrap();
    assert_eq!(
        groups,
        vec![
            Group {
                index: 0,
                name: None,
                always_present: true
            },
            Group {
                index: 1,
                name: Some("year".into()),
                always_present: true
            },
            Group {
                index: 2,
                name: Some("month".into()),
                always_present: true
            },
            Group {
                index: 3,
                name: Some("day".into()),
                always_present: true
            },
        ]
    );
}

#[rstest]
#[case(r"(?P<a>x)|(?P<b>y)", vec![("a", false), ("b", false)])]
#[case(r"(?P<opt>x)?", vec![("opt", false)])]
#[case(r"(?P<req>x)+", vec![("req", true)])]
#[case(r"(?P<r>x){1,3}", vec![("r", true)])]
#[case(r"(?P<r>x){2}", vec![("r", true)])]
#[case(r"(?P<o>x){0,3}", vec![("o", false)])]
#[case(r"(?P<o>x)*?", vec![("o", false)])]
#[case(r"(?P<o>x)??", vec![("o", false)])]
#[case(r"(?P<r>x)++", vec![("r", true)])]
#[case(r"a(?P<g>b|c)d", vec![("g", true)])]
#[case(r"(?:(?P<a>x)|y)(?P<b>z)", vec![("a", false), ("b", true)])]
#[case(r"(?P<outer>(?P<inner>x)?y)", vec![("outer", true), ("inner", false)])]
#[case(r"(?:(?P<outer>(?P<inner>x)y))?", vec![("outer", false), ("inner", false)])]
#[case(r"(?=(?P<ahead>x))", vec![("ahead", true)])]
#[case(r"(?!(?P<never>x))y", vec![("never", false)])]
#[case(r"(?<=(?P<behind>x))y", vec![("behind", true)])]
#[case(r"(?<!(?P<never>x))y", vec![("never", false)])]
#[case(r"(?P<a>x)?(?(a)(?P<b>y)|(?P<c>z))", vec![("a", false), ("b", false), ("c", false)])]
#[case(r"(?P<a>x)?(?(a)(?P<b>y))", vec![("a", false), ("b", false)])]
#[case(r"(?>(?P<atomic>x))", vec![("atomic", true)])]
#[case(r"(?i:(?P<scoped>x))", vec![("scoped", true)])]
#[case(r"(?P<x>a)|(?P<x>b)", vec![("x", false), ("x", false)])]
#[case(r"(?#a\)b)(?P<g>x)", vec![("g", true)])]
#[case(r"(?P<s>[\ud800-\udfff])", vec![("s", true)])]
#[case(r"(?P<d>[\N{DIGIT ONE}-\N{DIGIT NINE}])?", vec![("d", false)])]
fn named_group_presence(#[case] pattern: &str, #[case] expected: Vec<(&str, bool)>) {
    let groups = analyze(pattern, Flags::empty()).unwrap();
    assert_eq!(named(&groups), expected);
}

#[test]
fn unnamed_groups_keep_numbering() {
    let groups = analyze(r"(a)(?P<b>b)?(c)", Flags::empty()).unwrap();
    let indices: Vec<_> = groups.iter().map(|g| g.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(groups[2].name.as_deref(), Some("b"));
    assert!(groups[2].is_named() && !groups[1].is_named());
    assert_eq!(presence(r"(a)(?P<b>b)?(c)"), vec![true, false, true]);
}

#[rstest]
#[case("")]
#[case("abc")]
#[case(r"(a)|(b(c))?(?:d)(?P<e>e)*")]
#[case(r"((((a))))")]
#[case("(?x) ( a ) # one group\n | ( b )")]
#[case(r"[(](\()")]
fn indices_are_contiguous(#[case] pattern: &str) {
    let groups = analyze(pattern, Flags::empty()).unwrap();
    assert!(groups.iter().enumerate().all(|(i, g)| g.index == i));
    assert!(groups[0].always_present);
    assert!(groups[0].name.is_none());
}

#[test]
fn verbose_flag_changes_tokenization() {
    let pattern = "(?P<a>x) # (?P<b>y)\n";
    assert_eq!(named(&analyze(pattern, Flags::empty()).unwrap()), vec![("a", true), ("b", true)]);
    assert_eq!(named(&analyze(pattern, Flags::VERBOSE).unwrap()), vec![("a", true)]);
}

#[test]
fn other_flags_do_not_change_structure() {
    let pattern = r"(?P<a>x)(?P<b>.)?";
    let plain = analyze(pattern, Flags::empty()).unwrap();
    let flagged = analyze(pattern, Flags::IGNORECASE | Flags::MULTILINE | Flags::DOTALL).unwrap();
    assert_eq!(plain, flagged);
}

#[test]
fn analysis_is_repeatable() {
    let pattern = r"(?P<a>x)|(?P<b>(?P<c>y)+)";
    assert_eq!(analyze(pattern, Flags::empty()), analyze(pattern, Flags::empty()));
}

#[test]
fn concurrent_analysis() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let pattern = format!("(?P<g{i}>x){{{i},}}");
                analyze(&pattern, Flags::empty()).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let groups = handle.join().unwrap();
        assert_eq!(groups[1].always_present, i > 0);
    }
}

#[rstest]
#[case("(abc", ErrorKind::MissingParen, 0)]
#[case("abc)", ErrorKind::UnbalancedParen, 3)]
#[case("a{3,1}", ErrorKind::RepeatRange, 1)]
#[case(r"\q", ErrorKind::BadEscape(r"\q".into()), 0)]
#[case("x[a-", ErrorKind::UnterminatedSet, 1)]
#[case("(?P<a>x)(?P<b>(?P=b))", ErrorKind::OpenGroupReference, 18)]
#[case(r"(?P<c>\N{NOT A REAL NAME})", ErrorKind::UndefinedCharName("NOT A REAL NAME".into()), 6)]
fn malformed_patterns_fail(
    #[case] pattern: &str,
    #[case] kind: ErrorKind,
    #[case] position: usize,
) {
    let err = analyze(pattern, Flags::empty()).unwrap_err();
    assert_eq!(err.kind, kind);
    assert_eq!(err.position, Some(position));
    assert!(!err.reason().is_empty());
}

#[test]
fn deep_nesting_stays_linear() {
    let depth = 200;
    let pattern = format!("{}x{}", "(".repeat(depth), ")?".repeat(depth));
    let groups = analyze(&pattern, Flags::empty()).unwrap();
    assert_eq!(groups.len(), depth + 1);
    assert!(groups[1..].iter().all(|g| !g.always_present));
}

#[test]
fn runaway_nesting_is_an_error() {
    let depth = 50_000;
    let pattern = format!("{}x{}", "(?:".repeat(depth), ")".repeat(depth));
    let err = analyze(&pattern, Flags::empty()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooDeeplyNested);
}
