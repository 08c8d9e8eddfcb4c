use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ImportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let start = Instant::now();
        tracing::info!("Starting import process...");

        // Extract
        tracing::info!("📥 Reading and parsing input file...");
        let parsed = self.pipeline.extract().await?;
        tracing::info!(
            "Parsed {} row(s) from '{}' ({:?} orientation)",
            parsed.rows.len(),
            parsed.file_name,
            parsed.orientation
        );

        // Transform
        tracing::info!("🧮 Validating and mapping data...");
        let mapped = self.pipeline.transform(parsed).await?;
        tracing::info!(
            "Mapped {} variable(s), {} entities, {} value(s)",
            mapped.data.variables.len(),
            mapped.data.entity_names().len(),
            mapped.data.point_count()
        );

        // Load
        tracing::info!("📤 Importing...");
        let outcome = self.pipeline.load(mapped).await?;
        tracing::info!("Finished in {:?}: {}", start.elapsed(), outcome);

        Ok(outcome)
    }
}
