// Interactive transfer session.
//
// The flow is a single pass through an explicit state machine: every state
// carries what it has learned so far, and `step` moves to the next state or
// to `Done`. Each gate is also a free function so it can be checked without
// a console or a server.

use log::trace;
use thiserror::Error;

use crate::api::PointsApi;
use crate::error::Result;
use crate::fee::{calculate_fee, total_deduction};

/// Prompt and output surface used by the session. The terminal
/// implementation lives in `ui`; tests script it.
pub trait Console {
    /// Ask a question and return the raw answer.
    fn prompt(&mut self, question: &str) -> Result<String>;
    /// Normal status line.
    fn info(&mut self, line: &str);
    /// Diagnostic line.
    fn error(&mut self, line: &str);
    /// A network call is about to start.
    fn busy(&mut self, _message: &str) {}
    /// The network call has returned.
    fn idle(&mut self) {}
}

/// Why a session stopped before sending anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    #[error("An error occurred: {0}")]
    BalanceUnavailable(String),
    #[error("User ID not found!")]
    RecipientNotFound,
    #[error("Could not verify user ID: {0}")]
    RecipientUnverified(String),
    #[error("Invalid user ID!")]
    InvalidRecipientId,
    #[error("Invalid amount!")]
    InvalidAmount,
    #[error("Insufficient balance! (including fee)")]
    InsufficientBalance {
        amount: u64,
        fee: u64,
        required: u64,
        available: u64,
    },
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server accepted the transfer. `new_balance` is `None` when the
    /// follow-up balance read failed.
    Executed { new_balance: Option<u64> },
    /// The server answered but refused the transfer.
    Rejected,
    /// The transfer request itself failed.
    TransferError(String),
    /// The user did not confirm.
    Cancelled,
    Aborted(AbortReason),
}

/// A transfer that passed both amount gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub recipient_id: i64,
    pub amount: u64,
    pub fee: u64,
    pub total: u64,
}

impl Transfer {
    pub fn new(recipient_id: i64, amount: u64) -> Self {
        Transfer {
            recipient_id,
            amount,
            fee: calculate_fee(amount),
            total: total_deduction(amount),
        }
    }
}

#[derive(Debug)]
enum State {
    Start,
    BalanceLoaded { balance: u64 },
    RecipientPrompt { balance: u64, user_id: String },
    RecipientValidated { balance: u64, recipient_id: i64 },
    AmountPrompt { balance: u64, recipient_id: i64, input: String },
    AmountValidated { transfer: Transfer },
    ConfirmPrompt { transfer: Transfer, answer: String },
    Done(Outcome),
}

/// Split an answer into its sign and the run of digits that follows it,
/// ignoring whatever comes after (`"12.5"` reads as 12, `"100abc"` as 100).
/// `None` when no digit follows the optional sign.
fn leading_integer(input: &str) -> Option<(bool, &str)> {
    let trimmed = input.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some((negative, &rest[..end]))
}

/// Parse the amount answer from its leading integer. Only values above
/// zero pass.
pub fn parse_amount(input: &str) -> Option<u64> {
    match leading_integer(input)? {
        (true, _) => None,
        (false, digits) => digits.parse::<u64>().ok().filter(|amount| *amount > 0),
    }
}

/// Client-side funds check on amount plus fee.
pub fn check_funds(amount: u64, balance: u64) -> std::result::Result<(), AbortReason> {
    let required = total_deduction(amount);
    if required > balance {
        return Err(AbortReason::InsufficientBalance {
            amount,
            fee: calculate_fee(amount),
            required,
            available: balance,
        });
    }
    Ok(())
}

/// `y` in any case confirms; everything else cancels.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Numeric form of the recipient id sent in the transfer body.
pub fn parse_recipient_id(input: &str) -> Option<i64> {
    let (negative, digits) = leading_integer(input)?;
    let id = digits.parse::<i64>().ok()?;
    Some(if negative { -id } else { id })
}

/// One interactive transfer against `api`, talking through `console`.
pub struct Session<'a, A: PointsApi, C: Console> {
    api: &'a A,
    console: &'a mut C,
    strict_recipient_check: bool,
}

impl<'a, A: PointsApi, C: Console> Session<'a, A, C> {
    pub fn new(api: &'a A, console: &'a mut C) -> Self {
        Session {
            api,
            console,
            strict_recipient_check: false,
        }
    }

    /// Surface recipient lookup failures instead of folding them into
    /// "not found".
    pub fn strict_recipient_check(mut self, strict: bool) -> Self {
        self.strict_recipient_check = strict;
        self
    }

    /// Drive the session to completion. `Err` only comes from the console;
    /// every remote or validation failure ends up in the `Outcome`.
    pub fn run(mut self) -> Result<Outcome> {
        let mut state = State::Start;
        loop {
            trace!("session state: {:?}", state);
            state = match self.step(state)? {
                State::Done(outcome) => {
                    if let Outcome::Aborted(reason) = &outcome {
                        self.report_abort(reason);
                    }
                    return Ok(outcome);
                }
                next => next,
            };
        }
    }

    fn step(&mut self, state: State) -> Result<State> {
        let next = match state {
            State::Start => {
                self.console.busy("Fetching balance...");
                let balance = self.api.get_balance();
                self.console.idle();
                match balance {
                    Ok(balance) => {
                        self.console
                            .info(&format!("Current balance: {} points", balance));
                        State::BalanceLoaded { balance }
                    }
                    Err(e) => abort(AbortReason::BalanceUnavailable(e.to_string())),
                }
            }
            State::BalanceLoaded { balance } => {
                let user_id = self.console.prompt("Enter target user ID")?;
                State::RecipientPrompt {
                    balance,
                    user_id: user_id.trim().to_string(),
                }
            }
            State::RecipientPrompt { balance, user_id } => {
                if let Err(reason) = self.validate_recipient(&user_id) {
                    return Ok(abort(reason));
                }
                match parse_recipient_id(&user_id) {
                    Some(recipient_id) => State::RecipientValidated {
                        balance,
                        recipient_id,
                    },
                    None => abort(AbortReason::InvalidRecipientId),
                }
            }
            State::RecipientValidated {
                balance,
                recipient_id,
            } => {
                let input = self.console.prompt("Enter amount to send")?;
                State::AmountPrompt {
                    balance,
                    recipient_id,
                    input,
                }
            }
            State::AmountPrompt {
                balance,
                recipient_id,
                input,
            } => {
                let Some(amount) = parse_amount(&input) else {
                    return Ok(abort(AbortReason::InvalidAmount));
                };
                if let Err(reason) = check_funds(amount, balance) {
                    return Ok(abort(reason));
                }
                State::AmountValidated {
                    transfer: Transfer::new(recipient_id, amount),
                }
            }
            State::AmountValidated { transfer } => {
                self.print_summary(&transfer);
                self.console.info("");
                let answer = self.console.prompt("Confirm transaction? (y/n)")?;
                State::ConfirmPrompt { transfer, answer }
            }
            State::ConfirmPrompt { transfer, answer } => {
                if is_affirmative(&answer) {
                    State::Done(self.execute(&transfer))
                } else {
                    self.console.info("");
                    self.console.info("Transaction cancelled.");
                    State::Done(Outcome::Cancelled)
                }
            }
            State::Done(outcome) => State::Done(outcome),
        };
        Ok(next)
    }

    fn validate_recipient(&mut self, user_id: &str) -> std::result::Result<(), AbortReason> {
        self.console.busy("Checking user...");
        let found = if self.strict_recipient_check {
            self.api
                .check_user(user_id)
                .map_err(|e| AbortReason::RecipientUnverified(e.to_string()))
        } else {
            Ok(self.api.user_exists(user_id))
        };
        self.console.idle();
        if found? {
            Ok(())
        } else {
            Err(AbortReason::RecipientNotFound)
        }
    }

    fn print_summary(&mut self, transfer: &Transfer) {
        self.console.info("");
        self.console.info("Transaction Summary:");
        self.console
            .info(&format!("- Amount to send: {}", transfer.amount));
        self.console.info(&format!("- Fee (10%): {}", transfer.fee));
        self.console
            .info(&format!("- Total deduction: {}", transfer.total));
    }

    fn execute(&mut self, transfer: &Transfer) -> Outcome {
        self.console.busy("Sending points...");
        let sent = self.api.send_points(transfer.recipient_id, transfer.amount);
        self.console.idle();
        self.console.info("");
        match sent {
            Ok(true) => {
                self.console.info("Transaction successful!");
                self.console.busy("Fetching balance...");
                let balance = self.api.get_balance();
                self.console.idle();
                let new_balance = match balance {
                    Ok(balance) => {
                        self.console.info(&format!("New balance: {} points", balance));
                        Some(balance)
                    }
                    Err(e) => {
                        self.console
                            .error(&format!("Could not refresh balance: {}", e));
                        None
                    }
                };
                Outcome::Executed { new_balance }
            }
            Ok(false) => {
                self.console.info("Transaction failed!");
                Outcome::Rejected
            }
            Err(e) => {
                self.console.error(&format!("Transaction failed: {}", e));
                Outcome::TransferError(e.to_string())
            }
        }
    }

    fn report_abort(&mut self, reason: &AbortReason) {
        self.console.error(&reason.to_string());
        if let AbortReason::InsufficientBalance {
            amount,
            fee,
            required,
            available,
        } = reason
        {
            self.console
                .info(&format!("Required: {} ({} + {} fee)", required, amount, fee));
            self.console.info(&format!("Available: {}", available));
        }
    }
}

fn abort(reason: AbortReason) -> State {
    State::Done(Outcome::Aborted(reason))
}
