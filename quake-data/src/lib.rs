//! Aggregation of normalized earthquake events into chart-ready views.
//!
//! Everything in this crate is pure: given the same events and the same
//! resolved ranges it produces the same buckets, rankings and series.

pub mod aggregate;
pub mod bucket;
pub mod range;
pub mod series;
pub mod view;

pub use aggregate::{aggregate, Aggregation, RangeBuckets, TopEntry};
pub use bucket::TimeBucket;
pub use range::{BucketWidth, RangeKind, TimeRange};
pub use series::{Series, SeriesPoint};
pub use view::{DashboardView, RangeSeries, SeriesStatus, ViewStatus};
