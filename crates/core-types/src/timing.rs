//! Process-wide timing and retry constants.
//!
//! The bot is a single cooperative loop; these values are the only knobs
//! that control how hard it leans on the host site and the chat service.

use std::time::Duration;

/// Delay between play-loop ticks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Delay after a successful submit so the next tick observes the next
/// screen rather than the stale one.
pub const POST_SUBMIT_DELAY: Duration = Duration::from_secs(10);

/// Sleep inside the vote loop when the vote text has not changed.
pub const VOTE_IDLE_SLEEP: Duration = Duration::from_secs(1);

/// Upper bound on prompt re-samples before giving up on a fresh prompt.
pub const PROMPT_SAMPLE_ATTEMPTS: u32 = 10;

/// Idle vote-loop iterations tolerated before the loop bails out.
pub const VOTE_IDLE_LIMIT: u32 = 40;

/// Retries against the chat service before a transport failure bubbles up.
pub const CHAT_RETRY_BUDGET: u32 = 3;

/// Attempts to click an avatar before character selection gives up.
pub const AVATAR_CLICK_ATTEMPTS: u32 = 5;

/// Consecutive `Unknown` ticks that end the Blather guess loop.
pub const GUESS_UNKNOWN_RUN: u32 = 3;

/// Budget for locating the login fields after navigation (the facade has no
/// implicit wait, so the join ceremony retries at the poll interval).
pub const JOIN_FIELD_WAIT: Duration = Duration::from_secs(2);
