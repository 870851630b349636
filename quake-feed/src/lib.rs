//! Canonical earthquake event model and upstream feed access.
//!
//! Raw feed records stay untyped JSON ([`raw::RawRecord`]) until they pass
//! through the [`normalizer`]; everything downstream works with [`event::Event`].

pub mod error;
pub mod event;
pub mod normalizer;
pub mod query;
pub mod raw;
pub mod source;

#[cfg(feature = "api")]
pub mod client;

pub use error::FeedError;
pub use event::{Coordinates, Event};
pub use query::FeedQuery;
pub use raw::RawRecord;
pub use source::EventSource;
