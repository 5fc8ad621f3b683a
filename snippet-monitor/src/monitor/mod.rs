//! Zone monitor module.
//!
//! The monitor is responsible for:
//! - Enumerating every zone visible to each configured token
//! - Probing the Snippets endpoint of each zone in fixed-size batches
//! - Classifying probe responses into outcomes
//! - Driving the on-demand and scheduled pipelines

mod paginator;
mod pipeline;
mod probe;
mod retry;
mod scheduler;

pub use paginator::{DEFAULT_PER_PAGE, PaginatedZones, ZonePaginator};
pub use pipeline::{AuditPipeline, CONFIG_MISSING_MESSAGE, ScheduledRun};
pub use probe::{FeatureProbe, classify};
pub use retry::{RetryPolicy, retry_async};
pub use scheduler::{DEFAULT_BATCH_SIZE, ProbeScheduler};
