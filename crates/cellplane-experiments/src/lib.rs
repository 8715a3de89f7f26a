//! cellplane-experiments — controlled change for placement policy.
//!
//! - A/B experiments on scoring weights, with deterministic hash
//!   bucketing so a request always lands in the same arm.
//! - Feature flags consulted by the scheduler.
//! - Placement analytics: distributions and running means that let an
//!   operator compare experiment arms before a full rollout.

pub mod analytics;
pub mod error;
pub mod experiments;
pub mod flags;

pub use analytics::{AnalyticsRecorder, AnalyticsSummary, PlacementRecord};
pub use error::{ExperimentError, ExperimentResult};
pub use experiments::{ExperimentAssignment, ExperimentSpec, ExperimentStore};
pub use flags::FlagStore;
