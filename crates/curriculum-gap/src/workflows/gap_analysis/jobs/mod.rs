mod record;
mod store;
mod tracker;

pub use record::{
    JobRecord, JobStatus, PipelineStage, ReportPaths, COMPLETED_PROGRESS, FAILED_PROGRESS,
};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use tracker::{JobTracker, JobTransitionError};
