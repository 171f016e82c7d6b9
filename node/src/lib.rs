//! HEALCHAIN development host
//!
//! Opens a ledger store, seeds genesis records and serves the fund
//! operations over HTTP:
//! - `GET /health`
//! - `POST /invoke`
//! - `GET /history/:key`

mod api;
mod logging;
mod runtime;

pub use api::*;
pub use logging::*;
pub use runtime::*;
