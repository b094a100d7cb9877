//! Service layer for reply scraping.
//!
//! Domain logic separated from UI concerns, used by the CLI.

pub mod replies;

pub use replies::{ReplyService, ReplySource, ThreadProposals, ThreadReplies};
