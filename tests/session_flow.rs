use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use points_sender::api::PointsApi;
use points_sender::session::{
    check_funds, is_affirmative, parse_amount, parse_recipient_id, AbortReason, Console, Outcome,
    Session,
};
use points_sender::{PointsError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Balance,
    CheckUser(String),
    Send { recipient_id: i64, amount: u64 },
}

/// In-memory server: answers from canned values and records every call.
struct FakeApi {
    balances: RefCell<VecDeque<Option<u64>>>,
    user_found: Option<bool>,
    send_result: Option<bool>,
    calls: RefCell<Vec<Call>>,
}

impl FakeApi {
    fn new(balance: u64) -> Self {
        FakeApi {
            balances: RefCell::new(VecDeque::from(vec![Some(balance)])),
            user_found: Some(true),
            send_result: Some(true),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn then_balance(self, balance: Option<u64>) -> Self {
        self.balances.borrow_mut().push_back(balance);
        self
    }

    fn transport_error() -> PointsError {
        PointsError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "connection reset".into(),
        }
    }

    fn sends(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Send { .. }))
            .cloned()
            .collect()
    }
}

impl PointsApi for FakeApi {
    fn get_balance(&self) -> Result<u64> {
        self.calls.borrow_mut().push(Call::Balance);
        match self.balances.borrow_mut().pop_front().flatten() {
            Some(balance) => Ok(balance),
            None => Err(Self::transport_error()),
        }
    }

    fn check_user(&self, user_id: &str) -> Result<bool> {
        self.calls.borrow_mut().push(Call::CheckUser(user_id.to_string()));
        self.user_found.ok_or_else(Self::transport_error)
    }

    fn send_points(&self, recipient_id: i64, amount: u64) -> Result<bool> {
        self.calls.borrow_mut().push(Call::Send {
            recipient_id,
            amount,
        });
        self.send_result.ok_or_else(Self::transport_error)
    }
}

/// Console fed from a list of answers; remembers what was asked and shown.
#[derive(Default)]
struct ScriptedConsole {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    out: Vec<String>,
    err: Vec<String>,
}

impl ScriptedConsole {
    fn with_answers(answers: &[&str]) -> Self {
        ScriptedConsole {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl Console for ScriptedConsole {
    fn prompt(&mut self, question: &str) -> Result<String> {
        self.prompts.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| PointsError::Console(io::ErrorKind::UnexpectedEof.into()))
    }

    fn info(&mut self, line: &str) {
        self.out.push(line.to_string());
    }

    fn error(&mut self, line: &str) {
        self.err.push(line.to_string());
    }
}

fn run(api: &FakeApi, console: &mut ScriptedConsole) -> Outcome {
    Session::new(api, console).run().unwrap()
}

#[test]
fn confirmed_transfer_sends_and_shows_new_balance() {
    let api = FakeApi::new(1000).then_balance(Some(890));
    let mut console = ScriptedConsole::with_answers(&["42", "100", "y"]);

    let outcome = run(&api, &mut console);

    assert_eq!(outcome, Outcome::Executed { new_balance: Some(890) });
    assert_eq!(
        *api.calls.borrow(),
        vec![
            Call::Balance,
            Call::CheckUser("42".into()),
            Call::Send {
                recipient_id: 42,
                amount: 100
            },
            Call::Balance,
        ]
    );
    assert!(console.out.contains(&"Current balance: 1000 points".to_string()));
    assert!(console.out.contains(&"- Amount to send: 100".to_string()));
    assert!(console.out.contains(&"- Fee (10%): 10".to_string()));
    assert!(console.out.contains(&"- Total deduction: 110".to_string()));
    assert!(console.out.contains(&"Transaction successful!".to_string()));
    assert!(console.out.contains(&"New balance: 890 points".to_string()));
    assert!(console.err.is_empty());
}

#[test]
fn insufficient_balance_aborts_without_sending() {
    let api = FakeApi::new(50);
    let mut console = ScriptedConsole::with_answers(&["42", "100"]);

    let outcome = run(&api, &mut console);

    assert_eq!(
        outcome,
        Outcome::Aborted(AbortReason::InsufficientBalance {
            amount: 100,
            fee: 10,
            required: 110,
            available: 50
        })
    );
    assert!(api.sends().is_empty());
    assert_eq!(console.err, vec!["Insufficient balance! (including fee)"]);
    assert!(console.out.contains(&"Required: 110 (100 + 10 fee)".to_string()));
    assert!(console.out.contains(&"Available: 50".to_string()));
    assert_eq!(console.prompts.len(), 2);
}

#[test]
fn unknown_recipient_stops_before_amount_prompt() {
    let mut api = FakeApi::new(1000);
    api.user_found = Some(false);
    let mut console = ScriptedConsole::with_answers(&["999"]);

    let outcome = run(&api, &mut console);

    assert_eq!(outcome, Outcome::Aborted(AbortReason::RecipientNotFound));
    assert_eq!(console.prompts, vec!["Enter target user ID"]);
    assert_eq!(console.err, vec!["User ID not found!"]);
    assert!(api.sends().is_empty());
}

#[test]
fn recipient_lookup_error_reads_as_not_found() {
    let mut api = FakeApi::new(1000);
    api.user_found = None;
    let mut console = ScriptedConsole::with_answers(&["42"]);

    let outcome = run(&api, &mut console);

    assert_eq!(outcome, Outcome::Aborted(AbortReason::RecipientNotFound));
    assert_eq!(console.prompts.len(), 1);
}

#[test]
fn strict_mode_reports_lookup_error_separately() {
    let mut api = FakeApi::new(1000);
    api.user_found = None;
    let mut console = ScriptedConsole::with_answers(&["42"]);

    let outcome = Session::new(&api, &mut console)
        .strict_recipient_check(true)
        .run()
        .unwrap();

    match outcome {
        Outcome::Aborted(AbortReason::RecipientUnverified(cause)) => {
            assert!(cause.contains("connection reset"))
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(console.prompts.len(), 1);
}

#[test]
fn declined_confirmation_cancels() {
    let api = FakeApi::new(1000);
    let mut console = ScriptedConsole::with_answers(&["42", "100", "n"]);

    let outcome = run(&api, &mut console);

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(api.sends().is_empty());
    assert_eq!(console.out.last().map(String::as_str), Some("Transaction cancelled."));
}

#[test]
fn uppercase_y_confirms() {
    let api = FakeApi::new(1000).then_balance(Some(890));
    let mut console = ScriptedConsole::with_answers(&["42", "100", "Y"]);

    assert!(matches!(run(&api, &mut console), Outcome::Executed { .. }));
    assert_eq!(api.sends().len(), 1);
}

#[test]
fn invalid_amounts_are_rejected_before_any_transfer() {
    for input in ["0", "-5", "abc", "", ".5", "-0", "+"] {
        let api = FakeApi::new(1000);
        let mut console = ScriptedConsole::with_answers(&["42", input]);

        let outcome = run(&api, &mut console);

        assert_eq!(
            outcome,
            Outcome::Aborted(AbortReason::InvalidAmount),
            "input {:?}",
            input
        );
        // balance + user check only
        assert_eq!(api.calls.borrow().len(), 2, "input {:?}", input);
        assert_eq!(console.err, vec!["Invalid amount!"]);
    }
}

#[test]
fn remote_refusal_is_distinct_from_transport_failure() {
    let mut refused = FakeApi::new(1000);
    refused.send_result = Some(false);
    let mut console = ScriptedConsole::with_answers(&["42", "100", "y"]);
    assert_eq!(run(&refused, &mut console), Outcome::Rejected);
    assert!(console.err.is_empty());
    assert_eq!(console.out.last().map(String::as_str), Some("Transaction failed!"));

    let mut broken = FakeApi::new(1000);
    broken.send_result = None;
    let mut console = ScriptedConsole::with_answers(&["42", "100", "y"]);
    match run(&broken, &mut console) {
        Outcome::TransferError(cause) => assert!(cause.contains("connection reset")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(console.err[0].starts_with("Transaction failed: "));
}

#[test]
fn balance_failure_aborts_before_any_prompt() {
    let api = FakeApi::new(0);
    api.balances.borrow_mut().clear();
    let mut console = ScriptedConsole::default();

    let outcome = run(&api, &mut console);

    assert!(matches!(
        outcome,
        Outcome::Aborted(AbortReason::BalanceUnavailable(_))
    ));
    assert!(console.prompts.is_empty());
    assert!(console.err[0].starts_with("An error occurred: "));
}

#[test]
fn failed_balance_refresh_still_counts_as_executed() {
    let api = FakeApi::new(1000).then_balance(None);
    let mut console = ScriptedConsole::with_answers(&["42", "100", "y"]);

    assert_eq!(run(&api, &mut console), Outcome::Executed { new_balance: None });
    assert!(console.err[0].starts_with("Could not refresh balance: "));
}

#[test]
fn non_numeric_recipient_is_never_sent() {
    let api = FakeApi::new(1000);
    let mut console = ScriptedConsole::with_answers(&["alice"]);

    let outcome = run(&api, &mut console);

    assert_eq!(outcome, Outcome::Aborted(AbortReason::InvalidRecipientId));
    assert_eq!(console.prompts.len(), 1);
    assert!(api.sends().is_empty());
}

#[test]
fn exact_balance_is_enough() {
    assert!(check_funds(100, 110).is_ok());
    assert!(check_funds(100, 109).is_err());
    assert!(check_funds(9, 9).is_ok());
}

#[test]
fn trailing_text_after_numbers_is_ignored() {
    let api = FakeApi::new(1000).then_balance(Some(987));
    let mut console = ScriptedConsole::with_answers(&["42abc", "12.5", "y"]);

    assert_eq!(run(&api, &mut console), Outcome::Executed { new_balance: Some(987) });
    assert_eq!(api.calls.borrow()[1], Call::CheckUser("42abc".into()));
    assert_eq!(
        api.sends(),
        vec![Call::Send {
            recipient_id: 42,
            amount: 12
        }]
    );
    assert!(console.out.contains(&"- Fee (10%): 1".to_string()));
}

#[test]
fn summary_and_results_are_set_apart_by_blank_lines() {
    let api = FakeApi::new(1000).then_balance(Some(890));
    let mut console = ScriptedConsole::with_answers(&["42", "100", "y"]);

    run(&api, &mut console);

    let at = |line: &str| console.out.iter().position(|l| l == line).unwrap();
    assert_eq!(console.out[at("Transaction Summary:") - 1], "");
    assert_eq!(console.out[at("- Total deduction: 110") + 1], "");
    assert_eq!(console.out[at("Transaction successful!") - 1], "");
}

#[test]
fn gate_helpers() {
    assert_eq!(parse_amount(" 100 "), Some(100));
    assert_eq!(parse_amount("12.5"), Some(12));
    assert_eq!(parse_amount("100abc"), Some(100));
    assert_eq!(parse_amount("1e3"), Some(1));
    assert_eq!(parse_amount("+7"), Some(7));
    assert_eq!(parse_amount("18446744073709551615"), Some(u64::MAX));
    assert_eq!(parse_amount("0"), None);
    assert_eq!(parse_amount("-3"), None);
    assert_eq!(parse_amount("x1"), None);
    assert!(is_affirmative(" y"));
    assert!(!is_affirmative("yes"));
    assert_eq!(parse_recipient_id(" 7 "), Some(7));
    assert_eq!(parse_recipient_id("42abc"), Some(42));
    assert_eq!(parse_recipient_id("-3"), Some(-3));
    assert_eq!(parse_recipient_id("a7"), None);
}
