//! stopthecount - scrape x.com reply threads and extract what they propose.
//!
//! Replies are collected by scrolling the post page in a browser, located
//! with persisted CSS selectors that can be re-derived from a known
//! reference post, cached on disk, and optionally fed to an LLM that names
//! the entities each reply proposes.

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod scrapers;
pub mod selectors;
pub mod services;
pub mod storage;

pub use config::{Config, Settings};
pub use error::{Result, ScrapeError};
