use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct MigrationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MigrationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting migration run");

        // Extract
        let phase = Instant::now();
        let raw_data = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} rows in {:?}",
            raw_data.len(),
            phase.elapsed()
        );

        // Transform
        let phase = Instant::now();
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Transformed {} rows ({} rejected) in {:?}",
            transformed.accepted_count(),
            transformed.rejected.len(),
            phase.elapsed()
        );

        // Load
        let phase = Instant::now();
        let summary = self.pipeline.load(transformed).await?;
        tracing::info!("Load finished in {:?}", phase.elapsed());

        tracing::info!("Migration run finished in {:?}", started.elapsed());
        Ok(summary)
    }
}
