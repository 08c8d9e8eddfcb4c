use anyhow::Context;
use clap::Parser;
use dataset_importer::utils::error::ErrorSeverity;
use dataset_importer::utils::{logger, validation::Validate};
use dataset_importer::{CliArgs, CsvImportPipeline, Dispatcher, ImportEngine, LocalStorage, ProgressReporter};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_format == "json" {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting dataset-importer CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    // 載入並驗證配置
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 進度事件由 reporter 輸出到終端機
    let dispatcher = Arc::new(Dispatcher::new());
    let reporter = ProgressReporter::new();
    reporter.attach(&dispatcher);

    let storage = LocalStorage::new(String::new());
    let pipeline = CsvImportPipeline::with_http(storage, config, Arc::clone(&dispatcher))
        .context("failed to set up the HTTP import client")?;
    let engine = ImportEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Import completed successfully!");
            println!("✅ Import completed successfully!");
            println!("📁 Result: {}", outcome);
        }
        Err(e) => {
            tracing::error!(
                "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            if let Some(last) = reporter.last() {
                eprintln!("   Progress: {}/{} step(s)", last.step, last.total);
            }

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
