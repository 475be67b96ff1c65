//! Line-keyword parser for script source text.

use super::ast::{ActionInvocation, Expression, ExpressionItem, Guard, Listen, Script, Step};
use super::lexer::{tidy, tokenize};
use super::{ParseError, Result};
use tracing::{debug, info};

/// Built-in branch-override bindings, in evaluation order.
///
/// Labels carry the original spellings alongside their English glosses;
/// both forms bind the same environment key.
pub const DEFAULT_GUARD_BINDINGS: &[(&str, &str)] = &[
    ("用户存在", "user_exists"),
    ("user exists", "user_exists"),
    ("订单存在", "order_exists"),
    ("order exists", "order_exists"),
    ("可取消", "cancel_eligible"),
    ("cancellable", "cancel_eligible"),
    ("可修改", "modify_eligible"),
    ("modifiable", "modify_eligible"),
    ("库存充足", "stock_available"),
    ("stock available", "stock_available"),
];

/// Parse source text with the default parser.
pub fn parse_script(source: &str) -> Result<Script> {
    Parser::new().parse(source)
}

/// Script parser.
///
/// The only configuration is the guard-binding table consulted when steps
/// are finalized; everything else about the grammar is fixed.
#[derive(Debug, Clone)]
pub struct Parser {
    bindings: Vec<(String, String)>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parser using [`DEFAULT_GUARD_BINDINGS`].
    pub fn new() -> Self {
        Self::with_guard_bindings(
            DEFAULT_GUARD_BINDINGS
                .iter()
                .map(|(label, key)| (*label, *key)),
        )
    }

    /// Parser with a custom branch-override binding table, evaluated in
    /// iteration order.
    pub fn with_guard_bindings<I, L, K>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (L, K)>,
        L: Into<String>,
        K: Into<String>,
    {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(label, key)| (label.into(), key.into()))
                .collect(),
        }
    }

    /// Parse source text into a validated script.
    ///
    /// Fails on the first malformed line; a returned script has unique step
    /// ids and every jump target resolved.
    pub fn parse(&self, source: &str) -> Result<Script> {
        let mut script = Script::default();
        let mut current: Option<usize> = None;

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens = tokenize(line).map_err(|source| ParseError::Tokenization {
                line: line_no,
                source,
            })?;
            let Some(head) = tokens.first() else {
                continue;
            };
            debug!(line = line_no, head = %head, "parsing line");

            match head.as_str() {
                "Step" => {
                    let id = tokens
                        .get(1)
                        .ok_or(ParseError::StepMissingId { line: line_no })?;
                    if script.step(id).is_some() {
                        return Err(ParseError::DuplicateStepId {
                            line: line_no,
                            id: id.clone(),
                        });
                    }
                    if script.entry.is_none() {
                        script.entry = Some(id.clone());
                    }
                    script.steps.push(Step::new(id.clone()));
                    current = Some(script.steps.len() - 1);
                }
                "Speak" => {
                    let Some(index) = current else {
                        return Err(ParseError::SpeakOutsideStep { line: line_no });
                    };
                    let expression = parse_expression(&tokens[1..], &mut script.vars);
                    script.steps[index].speak = Some(expression);
                }
                "Listen" => {
                    let index = directive_step(current, line_no, head)?;
                    script.steps[index].listen = Some(parse_listen(&tokens[1..], line_no)?);
                }
                "Branch" => {
                    let index = directive_step(current, line_no, head)?;
                    if tokens.len() < 3 {
                        return Err(ParseError::MissingArguments {
                            line: line_no,
                            keyword: "Branch",
                            expected: "a label and a target",
                        });
                    }
                    let label = tidy(&tokens[1]);
                    let target = tidy(&tokens[2]);
                    script.steps[index].bind_branch(label, target);
                }
                "Silence" => {
                    let index = directive_step(current, line_no, head)?;
                    let target = tokens.get(1).ok_or(ParseError::MissingArguments {
                        line: line_no,
                        keyword: "Silence",
                        expected: "a target step id",
                    })?;
                    script.steps[index].silence = Some(target.clone());
                }
                "Default" => {
                    let index = directive_step(current, line_no, head)?;
                    let target = tokens.get(1).ok_or(ParseError::MissingArguments {
                        line: line_no,
                        keyword: "Default",
                        expected: "a target step id",
                    })?;
                    script.steps[index].default = Some(target.clone());
                }
                "Action" => {
                    let Some(index) = current else {
                        return Err(ParseError::ActionOutsideStep { line: line_no });
                    };
                    let name = tokens.get(1).ok_or(ParseError::MissingArguments {
                        line: line_no,
                        keyword: "Action",
                        expected: "an action name",
                    })?;
                    let args = tokens[2..].iter().map(|arg| tidy(arg).to_string()).collect();
                    script.steps[index].actions.push(ActionInvocation {
                        name: name.clone(),
                        args,
                    });
                }
                "Exit" => {
                    let index = directive_step(current, line_no, head)?;
                    script.steps[index].is_exit = true;
                }
                other => {
                    return Err(ParseError::UnknownKeyword {
                        line: line_no,
                        keyword: other.to_string(),
                    });
                }
            }
        }

        self.validate(&script)?;
        self.attach_guards(&mut script);
        info!(
            steps = script.len(),
            vars = script.vars.len(),
            "script parsed"
        );
        Ok(script)
    }

    fn validate(&self, script: &Script) -> Result<()> {
        for step in &script.steps {
            let targets = step
                .branches
                .iter()
                .map(|branch| &branch.target)
                .chain(step.silence.iter())
                .chain(step.default.iter());
            for target in targets {
                if script.step(target).is_none() {
                    return Err(ParseError::UndefinedReference {
                        step: step.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn attach_guards(&self, script: &mut Script) {
        for step in &mut script.steps {
            step.guards = self
                .bindings
                .iter()
                .filter(|(label, _)| step.has_branch(label))
                .map(|(label, key)| Guard {
                    label: label.clone(),
                    key: key.clone(),
                })
                .collect();
        }
    }
}

fn directive_step(current: Option<usize>, line: usize, keyword: &str) -> Result<usize> {
    current.ok_or_else(|| ParseError::DirectiveOutsideStep {
        line,
        keyword: keyword.to_string(),
    })
}

/// Build a spoken-line template, recording `$name` references in `vars`.
///
/// Tokens are tidied first; a bare `+` is a join marker and drops out.
fn parse_expression(tokens: &[String], vars: &mut Vec<String>) -> Expression {
    let mut items = Vec::new();
    for raw in tokens {
        let token = tidy(raw);
        if token == "+" {
            continue;
        }
        match token.strip_prefix('$') {
            Some(name) => {
                if !vars.iter().any(|var| var == name) {
                    vars.push(name.to_string());
                }
                items.push(ExpressionItem::Variable(name.to_string()));
            }
            None => items.push(ExpressionItem::Literal(token.to_string())),
        }
    }
    Expression { items }
}

/// Collect the listen window from argument tokens.
///
/// Arguments may be comma-separated within a single token (`0,0`) or spread
/// across tokens (`5, 20`); the first two integers win.
fn parse_listen(tokens: &[String], line: usize) -> Result<Listen> {
    let missing = || ParseError::MissingArguments {
        line,
        keyword: "Listen",
        expected: "two integer arguments",
    };
    let mut window = Vec::new();
    for token in tokens {
        for part in tidy(token).split(',') {
            if part.is_empty() {
                continue;
            }
            window.push(part.parse::<i64>().map_err(|_| missing())?);
        }
    }
    if window.len() < 2 {
        return Err(missing());
    }
    Ok(Listen {
        begin: window[0],
        end: window[1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_variables_and_literals() {
        let script = parse_script("Step a\nSpeak $x + \"hi\"\nStep b\nBranch \"go\" b")
            .expect("script parses");
        let speak = script.step("a").and_then(|s| s.speak.clone()).expect("speak");
        assert_eq!(
            speak.items,
            vec![
                ExpressionItem::Variable("x".into()),
                ExpressionItem::Literal("hi".into()),
            ]
        );
        assert!(script.vars.iter().any(|var| var == "x"));
    }

    #[test]
    fn listen_accepts_comma_separated_forms() {
        for source in ["Step a\nListen 5 20", "Step a\nListen 5, 20", "Step a\nListen 5,20"] {
            let script = parse_script(source).expect("script parses");
            let listen = script.step("a").and_then(|s| s.listen).expect("listen");
            assert_eq!((listen.begin, listen.end), (5, 20));
        }
    }

    #[test]
    fn listen_rejects_short_or_non_integer_windows() {
        for source in ["Step a\nListen 5", "Step a\nListen five 20"] {
            let err = parse_script(source).expect_err("parse fails");
            assert!(matches!(err, ParseError::MissingArguments { keyword: "Listen", .. }));
        }
    }

    #[test]
    fn dangling_reference_fails_validation() {
        let err = parse_script("Step a\nBranch \"x\" missing").expect_err("parse fails");
        match err {
            ParseError::UndefinedReference { step, target } => {
                assert_eq!(step, "a");
                assert_eq!(target, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn forward_references_are_legal() {
        let script =
            parse_script("Step a\nBranch \"go\" later\nStep later\nExit").expect("script parses");
        assert_eq!(script.step("a").and_then(|s| s.branch_target("go")), Some("later"));
    }

    #[test]
    fn step_without_id_fails() {
        let err = parse_script("Step\nSpeak \"hi\"").expect_err("parse fails");
        assert!(matches!(err, ParseError::StepMissingId { line: 1 }));
    }

    #[test]
    fn duplicate_step_id_fails() {
        let err = parse_script("Step a\nStep a").expect_err("parse fails");
        assert!(matches!(err, ParseError::DuplicateStepId { line: 2, .. }));
    }

    #[test]
    fn entry_is_first_declared_step() {
        let script = parse_script("Step one\nStep two").expect("script parses");
        assert_eq!(script.entry.as_deref(), Some("one"));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let script = parse_script("# heading\n\n   \nStep a\n  # indented comment\nExit")
            .expect("script parses");
        assert_eq!(script.len(), 1);
        assert!(script.step("a").is_some_and(|s| s.is_exit));
    }

    #[test]
    fn speak_outside_step_fails() {
        let err = parse_script("Speak \"hi\"").expect_err("parse fails");
        assert!(matches!(err, ParseError::SpeakOutsideStep { line: 1 }));
    }

    #[test]
    fn directives_outside_step_fail() {
        let err = parse_script("Exit").expect_err("parse fails");
        assert!(matches!(err, ParseError::DirectiveOutsideStep { line: 1, .. }));
    }

    #[test]
    fn unknown_keyword_fails() {
        let err = parse_script("Step a\nShout loud").expect_err("parse fails");
        match err {
            ParseError::UnknownKeyword { line, keyword } => {
                assert_eq!(line, 2);
                assert_eq!(keyword, "Shout");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tokenization_errors_carry_line_numbers() {
        let err = parse_script("Step a\nSpeak \"unterminated").expect_err("parse fails");
        assert!(matches!(err, ParseError::Tokenization { line: 2, .. }));
    }

    #[test]
    fn vars_keep_first_reference_order() {
        let script = parse_script("Step a\nSpeak $name $amount\nStep b\nSpeak $amount $city")
            .expect("script parses");
        assert_eq!(script.vars, vec!["name", "amount", "city"]);
    }

    #[test]
    fn branch_labels_and_targets_are_tidied() {
        let script = parse_script("Step a\nBranch \"yes\", b,\nStep b\nExit").expect("script parses");
        assert_eq!(script.step("a").and_then(|s| s.branch_target("yes")), Some("b"));
    }

    #[test]
    fn guards_follow_binding_table_order() {
        let source = "Step a\nAction QueryUser\nBranch \"可取消\" c\nBranch \"用户存在\" b\nStep b\nExit\nStep c\nExit";
        let script = parse_script(source).expect("script parses");
        let guards = &script.step("a").expect("step").guards;
        assert_eq!(guards.len(), 2);
        assert_eq!(guards[0].label, "用户存在");
        assert_eq!(guards[0].key, "user_exists");
        assert_eq!(guards[1].key, "cancel_eligible");
    }

    #[test]
    fn custom_guard_bindings_replace_the_table() {
        let parser = Parser::with_guard_bindings([("vip", "vip_flag")]);
        let script = parser
            .parse("Step a\nAction Check\nBranch vip b\nStep b\nExit")
            .expect("script parses");
        let guards = &script.step("a").expect("step").guards;
        assert_eq!(guards.len(), 1);
        assert_eq!(guards[0].key, "vip_flag");
    }

    #[test]
    fn actions_keep_source_order_and_tidied_args() {
        let script = parse_script("Step a\nAction LocalSetVar user_id,\nAction QueryUser")
            .expect("script parses");
        let actions = &script.step("a").expect("step").actions;
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name, "LocalSetVar");
        assert_eq!(actions[0].args, vec!["user_id"]);
        assert_eq!(actions[1].name, "QueryUser");
    }
}
