//! Cache module - in-memory caches backed by Moka.
//!
//! Components own their caches directly:
//! - the text formatter keeps rendered fancy text keyed by input
//! - the chat pipeline keeps a ledger of answered feedback keyboards

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
