//! The tenant chat assistant.
//!
//! A turn flows through four pieces: the snapshot formatter renders the
//! store, the prompt assembler wraps it in the persona, the tool router asks
//! the model whether to file an issue, and the conversation loop records
//! everything in the session history.

pub mod snapshot;
pub mod prompt;
pub mod history;
pub mod tools;
pub mod router;
pub mod conversation;

pub use conversation::{AssistantService, Conversation, INTERRUPTED_REPLY};
pub use history::SessionHistory;
pub use router::{Route, ToolRouter};
pub use tools::IssueToolOutcome;
