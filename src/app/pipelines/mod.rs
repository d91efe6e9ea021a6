pub mod snapshot_pipeline;
pub mod unsupported_pipeline;
