use crate::core::report::render_report;
use crate::core::Pipeline;
use crate::domain::model::CostAnalysis;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub output_path: String,
    pub report: String,
    pub analysis: CostAnalysis,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("Starting cost analysis...");
        self.monitor.log_stats("start");

        // Extract
        let data = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} wind, {} solar and {} demand samples",
            data.wind.len(),
            data.solar.len(),
            data.demand.len()
        );
        self.monitor.log_stats("extract");

        // Transform
        let analysis = self.pipeline.transform(data).await?;
        tracing::info!("Computed profiles for {} days", analysis.profiles.len());
        self.monitor.log_stats("transform");

        // Load
        let output_path = self.pipeline.load(&analysis).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(EtlOutcome {
            output_path,
            report: render_report(&analysis.summary, &analysis.costs),
            analysis,
        })
    }
}
