use clap::Parser;
use std::sync::Arc;
use vcolors::core::ramps;
use vcolors::domain::ports::ColorTableStore;
use vcolors::utils::error::{ColorError, ErrorSeverity};
use vcolors::utils::{logger, validation::Validate};
use vcolors::{CliConfig, ColorEngine, DatasetPipeline, LocalStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting vcolors CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if config.list {
        print_ramps();
        return Ok(());
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let outcome = if config.remove {
        remove_table(&config).await
    } else {
        derive_table(&config).await
    };

    if let Err(e) = outcome {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ vcolors failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
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

    Ok(())
}

fn print_ramps() {
    for name in ramps::list_names() {
        match ramps::describe(&name) {
            Some(description) => println!("{:<12} {}", name, description),
            None => println!("{}", name),
        }
    }
}

async fn remove_table(config: &CliConfig) -> Result<(), ColorError> {
    let dataset = config.dataset_name()?;
    let store = LocalStore::new(&config.store);

    let removed = store.remove(&dataset).await?;
    if removed == 0 {
        tracing::warn!("⚠️  Color table of <{}> not found", dataset);
        println!("Color table of <{}> not found", dataset);
    } else {
        println!("🗑️  Color table of <{}> removed", dataset);
    }
    Ok(())
}

async fn derive_table(config: &CliConfig) -> Result<(), ColorError> {
    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let job = config.to_job()?;
    let records = config.record_source()?;
    let store = LocalStore::new(&config.store);

    let pipeline = DatasetPipeline::new(records.clone(), store, job).with_histogram(Arc::new(records));
    let engine = ColorEngine::new_with_monitoring(pipeline, monitor_enabled);

    let summary = engine.run().await?;
    println!(
        "✅ Color table for <{}> set to '{}' ({} breakpoints)",
        summary.dataset, summary.style, summary.breakpoints
    );
    Ok(())
}
