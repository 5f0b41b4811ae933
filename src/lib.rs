// Library root
// -----------
// The binary (`main.rs`) wires these modules into a one-shot interactive
// points transfer.
//
// Module responsibilities:
// - `config`: base URL, token file location and flags from the environment.
// - `credentials`: reads the token file.
// - `api`: blocking HTTP client for balance, user lookup and transfers.
// - `fee`: the transfer fee.
// - `session`: the transfer state machine and its gates.
// - `ui`: terminal prompts and output for the session.
pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fee;
pub mod session;
pub mod ui;

pub use error::{PointsError, Result};
