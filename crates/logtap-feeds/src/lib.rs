//! logtap-feeds — line sources for logtap.
//!
//! A feed yields raw, non-blank lines one at a time, in input order. The
//! only production source is stdin; [`stdin::LineFeed`] works over any
//! buffered async reader so tests and benches can feed it from memory.

pub mod stdin;

pub use stdin::{FeedStats, LineFeed};
