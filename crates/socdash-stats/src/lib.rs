//! Monthly social statistics aggregation.
//!
//! Reads the collector's cached snapshot, derives the current month's
//! follower and like totals, persists them once per day (or on demand), and
//! assembles the 12-month series the dashboard renders.

pub mod aggregator;
pub mod markers;
pub mod source;
pub mod store;

pub use aggregator::{SaveOutcome, SeriesPoint, SeriesSource, StatsAggregator};
pub use markers::{MemoryMarkers, SaveMarkers};
pub use source::{FileSnapshotSource, SnapshotError, SnapshotSource};
pub use store::{MonthlyStatsStore, PgStatsStore};
