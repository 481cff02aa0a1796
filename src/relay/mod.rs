//! Relay engine
//!
//! The local listener, the per-connection pipeline, the bidirectional
//! session and the controller tying them to one cancellation scope.

mod connection;
mod controller;
mod listener;
mod session;

pub use connection::handle_connection;
pub use controller::{RelayState, SocksRelay};
pub use listener::LocalListener;
pub use session::{Direction, PipeEnd, PipeOutcome, Session, SessionSummary};
