use crate::domain::model::{CostAnalysis, Period, Sample, SourceData};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// A public dataset that yields half-hourly MW samples for a period.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Cache key, also used in log lines.
    fn name(&self) -> &str;
    async fn fetch(&self, period: &Period) -> Result<Vec<Sample>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceData>;
    async fn transform(&self, data: SourceData) -> Result<CostAnalysis>;
    async fn load(&self, analysis: &CostAnalysis) -> Result<String>;
}
