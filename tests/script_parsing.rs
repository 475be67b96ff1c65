use parley::script::{ExpressionItem, Listen, ParseError, Parser, parse_script};
use std::io::Write;
use tempfile::NamedTempFile;

const DEMO: &str = include_str!("../demos/order_service.dsl");

#[test]
fn expression_mixes_variables_and_literals() {
    let script = parse_script("Step a\nSpeak $x + \"hi\"\nStep b\nBranch \"go\" b").expect("parses");
    let step = script.step("a").expect("step a");
    let expression = step.speak.as_ref().expect("speak");
    assert_eq!(
        expression.items,
        vec![
            ExpressionItem::Variable("x".into()),
            ExpressionItem::Literal("hi".into()),
        ]
    );
    assert!(script.vars.contains(&"x".to_string()));
}

#[test]
fn listen_accepts_comma_separated_bounds() {
    let script = parse_script("Step a\nListen 5, 20").expect("parses");
    assert_eq!(script.step("a").expect("step").listen, Some(Listen { begin: 5, end: 20 }));

    let script = parse_script("Step a\nListen 0,0").expect("parses");
    assert_eq!(script.step("a").expect("step").listen, Some(Listen { begin: 0, end: 0 }));
}

#[test]
fn dangling_branch_target_is_rejected() {
    let err = parse_script("Step a\nBranch \"x\" missing").expect_err("must fail");
    match err {
        ParseError::UndefinedReference { step, target } => {
            assert_eq!(step, "a");
            assert_eq!(target, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn step_without_an_id_is_rejected() {
    let err = parse_script("Step\nSpeak \"hi\"").expect_err("must fail");
    assert!(matches!(err, ParseError::StepMissingId { line: 1 }));
}

#[test]
fn duplicate_step_ids_are_rejected() {
    let err = parse_script("Step a\nStep a").expect_err("must fail");
    match err {
        ParseError::DuplicateStepId { line, id } => {
            assert_eq!(line, 2);
            assert_eq!(id, "a");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn action_outside_a_step_is_rejected() {
    let err = parse_script("Action QueryUser").expect_err("must fail");
    assert!(matches!(err, ParseError::ActionOutsideStep { line: 1 }));
}

#[test]
fn directives_missing_arguments_are_rejected() {
    for (source, expected) in [
        ("Step a\nBranch \"yes\"", "Branch"),
        ("Step a\nSilence", "Silence"),
        ("Step a\nDefault", "Default"),
        ("Step a\nAction", "Action"),
    ] {
        let err = parse_script(source).expect_err("must fail");
        match err {
            ParseError::MissingArguments { line, keyword, .. } => {
                assert_eq!(line, 2, "wrong line for {expected}");
                assert_eq!(keyword, expected);
            }
            other => panic!("unexpected error for {expected}: {other}"),
        }
    }
}

#[test]
fn entry_is_the_first_declared_step() {
    let script = parse_script("# intro\n\nStep first\nStep second").expect("parses");
    assert_eq!(script.entry.as_deref(), Some("first"));

    let script = parse_script("# only comments\n").expect("parses");
    assert!(script.entry.is_none());
    assert!(script.is_empty());
}

#[test]
fn forward_references_resolve_after_the_whole_file() {
    let source = "Step a\nListen 1 9\nBranch \"next\" b\nSilence b\nDefault b\nStep b\nExit";
    let script = parse_script(source).expect("forward references are legal");
    assert_eq!(script.step("a").expect("step").branch_target("next"), Some("b"));
}

#[test]
fn errors_carry_the_raw_line_number() {
    // Line numbers count comments and blanks.
    let err = parse_script("# header\n\nShout \"hi\"").expect_err("must fail");
    assert_eq!(err.to_string(), "line 3: unknown keyword 'Shout'");

    let err = parse_script("Step a\nSpeak \"unterminated").expect_err("must fail");
    assert!(err.to_string().starts_with("line 2:"));
}

#[test]
fn scripts_survive_a_json_round_trip() {
    let script = parse_script(DEMO).expect("demo parses");
    let json = serde_json::to_string(&script).expect("serializes");
    let back: parley::Script = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(script, back);
}

#[test]
fn scripts_load_from_disk() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(b"Step a\nSpeak \"from disk\"\nExit\n").expect("write");
    let source = std::fs::read_to_string(file.path()).expect("read");
    let script = parse_script(&source).expect("parses");
    assert_eq!(script.len(), 1);
}

#[test]
fn demo_script_parses_with_expected_shape() {
    let script = parse_script(DEMO).expect("demo parses");
    assert_eq!(script.entry.as_deref(), Some("welcome"));
    let vars: Vec<&str> = script.vars.iter().map(String::as_str).collect();
    assert_eq!(vars, ["user_name", "balance", "orders", "order_id", "order_status", "amount"]);

    // Guards derive from the binding table wherever a bound label is branched on.
    let identify = script.step("identify").expect("identify");
    assert_eq!(identify.guards.len(), 1);
    assert_eq!(identify.guards[0].label, "user exists");
    assert_eq!(identify.guards[0].key, "user_exists");

    let cancel_check = script.step("cancel_check").expect("cancel_check");
    assert_eq!(cancel_check.guards[0].key, "cancel_eligible");

    // Plain menu labels stay guard-free.
    let menu = script.step("menu").expect("menu");
    assert!(menu.guards.is_empty());
    assert_eq!(menu.branches.len(), 4);
}

#[test]
fn custom_guard_bindings_replace_the_default_table() {
    let parser = Parser::with_guard_bindings([("vip", "vip_flag")]);
    let source = "Step a\nListen 1 9\nBranch \"vip\" b\nBranch \"user exists\" b\nDefault b\nStep b\nExit";
    let script = parser.parse(source).expect("parses");
    let step = script.step("a").expect("step");
    assert_eq!(step.guards.len(), 1);
    assert_eq!(step.guards[0].key, "vip_flag");
}

#[test]
fn chinese_labels_bind_guards_too() {
    let source = "Step a\nListen 1 9\nBranch \"可取消\" b\nDefault b\nStep b\nExit";
    let script = parse_script(source).expect("parses");
    let step = script.step("a").expect("step");
    assert_eq!(step.guards[0].key, "cancel_eligible");
}
