//! Statistics engine components.
//!
//! One module per computation. Builders are pure functions of a
//! [`FilteredGames`](filter::FilteredGames) snapshot and the engine
//! configuration; `report` composes them.

pub mod chug_summary;
pub mod cross_tab;
pub mod duration;
pub mod filter;
pub mod geo;
pub mod histogram;
pub mod outcomes;
pub mod report;
pub mod seat_stats;
pub mod theory;

pub use chug_summary::compute_chug_summary;
pub use cross_tab::{AxisBins, CrossTabBuilder};
pub use duration::DurationHistogramBuilder;
pub use filter::{FilteredGames, RecordFilter};
pub use geo::GeoAggregator;
pub use histogram::EmpiricalHistogramBuilder;
pub use outcomes::{DurationOutcome, IntegerOutcome, IntegerSamples};
pub use report::{compute_outcome_report, StatsReportAssembler, StatsService};
pub use seat_stats::compute_seat_stats;
pub use theory::{Distribution, Pmf, TheoreticalDistributionModel};
