use crate::domain::model::ReleaseSource;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Release pages in chronological order, oldest first. The last entry per
    /// vendor is the baseline release.
    fn releases(&self) -> &[ReleaseSource];
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
}

/// Extract → transform → load, with stage payloads chosen per pipeline so the
/// snapshot stage and the analysis stage both run under the same engine.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Raw: Send;
    type Transformed: Send;

    async fn extract(&self) -> Result<Vec<Self::Raw>>;
    async fn transform(&self, data: Vec<Self::Raw>) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
