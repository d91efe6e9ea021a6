pub mod engine;
pub mod etl;
pub mod extract;

pub use crate::domain::model::{
    CpuRecord, MasterUnsupportedSet, Snapshot, SnapshotSeries, StepReport, Vendor,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
