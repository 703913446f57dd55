use super::*;
use crate::ast::Tag;

fn names(src: &str) -> Vec<(DefKind, String)> {
    parse(src)
        .unwrap()
        .defs
        .into_iter()
        .map(|d| (d.kind, d.qualified_name()))
        .collect()
}

#[test]
fn finds_tests_and_controls() {
    let src = r#"
module M {
    import from Lib all;
    type record R { integer a, charstring b }
    template R t := { a := 1, b := "}" };

    testcase TC_one() runs on MTC system SYS {
        setverdict(pass);
    }

    control {
        execute(TC_one());
    }
}
"#;
    assert_eq!(
        names(src),
        vec![
            (DefKind::Testcase, "M.TC_one".to_string()),
            (DefKind::Control, "M.control".to_string()),
        ]
    );
}

#[test]
fn groups_are_transparent() {
    let src = "module M { group g { testcase a() runs on C {} group inner { testcase b() runs on C {} } } }";
    let defs = parse(src).unwrap();
    let ids: Vec<_> = defs.tests().map(|d| d.qualified_name()).collect();
    assert_eq!(ids, vec!["M.a", "M.b"]);
}

#[test]
fn several_modules_per_file() {
    let src = "module A { control {} } module B { control {} } with { extension \"x\" }";
    let ids: Vec<_> = parse(src).unwrap().controls().map(|d| d.qualified_name()).collect();
    assert_eq!(ids, vec!["A.control", "B.control"]);
}

#[test]
fn tags_come_from_leading_comments() {
    let src = r#"
module M {
    // @stable
    testcase a() runs on C {}

    /**
     * @feature handover
     */
    private testcase b() runs on C {}

    testcase c() runs on C {}
}
"#;
    let defs = parse(src).unwrap();
    let tags: Vec<_> = defs.tests().map(|d| d.tags.clone()).collect();
    assert_eq!(
        tags,
        vec![
            vec![Tag::new("stable", "")],
            vec![Tag::new("feature", "handover")],
            vec![],
        ]
    );
}

#[test]
fn function_modifiers_and_altsteps() {
    let src = "module M { function @deterministic f() {} altstep as() runs on C { [] t.timeout {} } }";
    assert_eq!(
        names(src),
        vec![
            (DefKind::Function, "M.f".to_string()),
            (DefKind::Altstep, "M.as".to_string()),
        ]
    );
}

#[test]
fn language_clause_is_skipped() {
    let src = "module M language \"TTCN-3:2016\" { testcase t() runs on C {} }";
    assert_eq!(names(src), vec![(DefKind::Testcase, "M.t".to_string())]);
}

#[test]
fn unclosed_module_is_an_error() {
    let errs = parse("module M { testcase t() runs on C {").unwrap_err();
    assert!(errs[0].message.starts_with("unclosed"), "{:?}", errs);
}

#[test]
fn mismatched_brackets_are_an_error() {
    let errs = parse("module M { testcase t() runs on C { ( } }").unwrap_err();
    assert!(errs[0].message.contains("mismatched"), "{:?}", errs);
}

#[test]
fn garbage_outside_modules_is_an_error() {
    assert!(parse("testcase t() {}").is_err());
}

#[test]
fn empty_file_has_no_definitions() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("// only a comment\n").unwrap().is_empty());
}

#[test]
fn definition_listing_snapshot() {
    let src = r#"
/* @suite radio */
module Handover language "TTCN-3:2018" {
    group intra {
        /**
         * @feature handover
         * @since 2.1
         */
        testcase TC_intra_freq() runs on MTC {}
        private function f_setup() {}
    }
    altstep as_guard() runs on MTC { [] any timer.timeout {} }
    // @slow
    testcase TC_inter_rat() runs on MTC {}
    control { execute(TC_intra_freq()); }
} with { extension "x" }
"#;
    let defs = parse(src).unwrap();
    let listing: Vec<String> = defs
        .defs
        .iter()
        .map(|d| {
            let tags: Vec<String> = d.tags.iter().map(ToString::to_string).collect();
            format!("{:?} {} [{}]", d.kind, d.qualified_name(), tags.join(", "))
        })
        .collect();
    insta::assert_snapshot!(listing.join("\n"), @r###"
    Testcase Handover.TC_intra_freq [@feature handover, @since 2.1]
    Function Handover.f_setup []
    Altstep Handover.as_guard []
    Testcase Handover.TC_inter_rat [@slow]
    Control Handover.control []
    "###);
    assert_eq!(defs.modules[0].tags, vec![Tag::new("suite", "radio")]);
}
