//! Data models for stopthecount.

mod post;
mod proposal;
mod reply;

pub use post::PostKey;
pub use proposal::{ProposalResult, NO_PROPOSAL};
pub use reply::{ReplyRecord, ScrapeResult};
