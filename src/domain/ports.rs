use crate::domain::model::{Record, TransformOutput};
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
    fn target_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn input_files(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn max_retries(&self) -> u32;
    fn dry_run(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformOutput>;
    async fn load(&self, result: TransformOutput) -> Result<String>;
}
