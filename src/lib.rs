//! jitb — an autonomous jackbox.tv player.
//!
//! The binary wires four layers together: the CDP-backed DOM facade, the
//! page classifier, the chat-model client, and the per-game controllers.
//! This crate owns only the glue: CLI, logging bootstrap, and the session
//! driver that joins a room and runs the play loop.

pub mod cli;
pub mod logging;
pub mod session;

pub use session::{SessionConfig, SessionDriver, SessionError};
