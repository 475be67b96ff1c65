use parley::interpreter::{RunOutcome, RunReport, Session, Speaker, evaluate};
use parley::script::{Expression, ExpressionItem};
use parley::support::{KeywordResolver, ScriptedInput, demo_store, standard_actions};
use parley::{Environment, parse_script};
use proptest::prelude::*;

const DEMO: &str = include_str!("../demos/order_service.dsl");

fn run(source: &str, turns: &[&str]) -> RunReport {
    let script = parse_script(source).expect("script parses");
    let mut actions = standard_actions(demo_store());
    let intents = KeywordResolver::new();
    let mut input = ScriptedInput::new(turns.iter().copied());
    Session::new(&script, &mut actions, &intents, &mut input).run()
}

#[test]
fn exhausted_input_ends_after_one_speak() {
    let source = "Step a\nSpeak \"hi\"\nListen 0,0\nDefault a\nStep b\nExit";
    let report = run(source, &[]);
    assert_eq!(report.outcome, RunOutcome::InputClosed);
    // Exactly the one spoken line, no termination notice.
    assert_eq!(report.transcript.len(), 1);
    assert_eq!(report.transcript.entries()[0].text, "hi");
    assert_eq!(report.transcript.entries()[0].speaker, Speaker::Bot);
}

#[test]
fn action_set_condition_overrides_the_resolved_intent() {
    let source = "\
Step check
Listen 1 9
Branch \"user exists\" yes
Default no
Action LocalSetVar user_id
Action QueryUser
Step yes
Speak \"welcome back\"
Exit
Step no
Speak \"who are you\"
Exit";
    // "1001" matches no branch label, so the listen phase picks the
    // default; QueryUser then proves the user exists and the guarded
    // branch wins.
    let report = run(source, &["1001"]);
    assert_eq!(report.outcome, RunOutcome::Exit);
    assert!(report.transcript.contains("welcome back"));
    assert!(!report.transcript.contains("who are you"));
}

#[test]
fn demo_lists_orders_and_says_goodbye() {
    let report = run(DEMO, &["1001", "check my orders", "bye"]);
    assert_eq!(report.outcome, RunOutcome::Exit);
    assert!(report.transcript.contains("your balance is 50."));
    assert!(report.transcript.contains("A001(Book, Shipped), A002(Pen, Paid)"));
    assert!(report.transcript.contains("Thanks for visiting, Alice. Bye!"));
}

#[test]
fn demo_cancels_an_eligible_order() {
    let report = run(DEMO, &["1002", "cancel an order", "B001"]);
    assert_eq!(report.outcome, RunOutcome::InputClosed);
    assert!(report.transcript.contains("Hi Bob"));
    assert!(report.transcript.contains("Done. Order B001 is now Cancelled."));
    assert_eq!(report.env.render("cancel_done"), "true");
}

#[test]
fn demo_refuses_to_cancel_a_shipped_order() {
    let report = run(DEMO, &["1001", "cancel an order", "A001"]);
    assert!(report
        .transcript
        .contains("Order A001 cannot be cancelled while it is Shipped."));
    assert!(!report.env.truthy("cancel_eligible"));
}

#[test]
fn demo_top_up_repairs_the_captured_amount() {
    // The first numeric turn is the user id, which the capture heuristic
    // routes into the unset amount variable; the top-up step overwrites
    // it from the fresh utterance before touching the balance.
    let report = run(DEMO, &["1001", "top up", "25", "bye"]);
    assert_eq!(report.outcome, RunOutcome::Exit);
    assert!(report.transcript.contains("Added 25. Your new balance is 75."));
}

#[test]
fn demo_retries_unknown_users() {
    let report = run(DEMO, &["9999", "1001", "bye"]);
    assert_eq!(report.outcome, RunOutcome::Exit);
    assert!(report.transcript.contains("I couldn't find that account."));
    assert!(report.transcript.contains("Hi Alice"));
}

#[test]
fn demo_silence_nudges_and_returns_to_the_menu() {
    let report = run(DEMO, &["1001", "", "bye"]);
    assert_eq!(report.outcome, RunOutcome::Exit);
    assert!(report.transcript.contains("Still there?"));
}

#[test]
fn demo_unmatched_turns_fall_back_to_help() {
    let report = run(DEMO, &["1001", "blargh", "bye"]);
    assert_eq!(report.outcome, RunOutcome::Exit);
    assert!(report.transcript.contains("Sorry, I didn't catch that."));
}

#[test]
fn run_reports_carry_fresh_ids_and_ordered_timestamps() {
    let first = run(DEMO, &["1001", "bye"]);
    let second = run(DEMO, &["1001", "bye"]);
    assert_ne!(first.run_id, second.run_id);
    assert!(first.finished_at >= first.started_at);
}

proptest! {
    // Any fixed turn sequence replays to the same transcript, environment,
    // and outcome; the demo store is rebuilt per run so runs stay isolated.
    #[test]
    fn reruns_are_deterministic(turns in proptest::collection::vec(".{0,20}", 0..6)) {
        let turns: Vec<&str> = turns.iter().map(String::as_str).collect();
        let first = run(DEMO, &turns);
        let second = run(DEMO, &turns);
        prop_assert_eq!(first.transcript, second.transcript);
        prop_assert_eq!(first.env, second.env);
        prop_assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn evaluation_is_idempotent(
        pieces in proptest::collection::vec(("[a-z]{1,8}", ".{0,12}"), 0..6),
        bound in proptest::collection::hash_map("[a-z]{1,8}", ".{0,12}", 0..6),
    ) {
        let mut env = Environment::new();
        for (name, value) in &bound {
            env.set(name.clone(), value.clone());
        }
        let items = pieces
            .into_iter()
            .flat_map(|(name, text)| {
                [ExpressionItem::Variable(name), ExpressionItem::Literal(text)]
            })
            .collect();
        let expression = Expression { items };
        prop_assert_eq!(evaluate(&expression, &env), evaluate(&expression, &env));
    }
}
