//! Core data types for the USD1 daily report.
//!
//! Records produced by the fetchers, rate breakdowns, amount formatting,
//! and the pure text formatter that turns a [`Report`] into a message.

pub mod amount;
pub mod error;
pub mod format;
pub mod rate;
pub mod record;
pub mod report;

pub use amount::*;
pub use error::*;
pub use format::*;
pub use rate::*;
pub use record::*;
pub use report::*;
