use clap::Parser;
use std::sync::Arc;
use vcolors::config::toml_config::TomlConfig;
use vcolors::utils::error::ErrorSeverity;
use vcolors::utils::{logger, validation::Validate};
use vcolors::{ColorEngine, DatasetPipeline, LocalStore};

#[derive(Parser)]
#[command(name = "toml-colors")]
#[command(about = "Derives a color table from a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "vcolors.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show the job without reading the dataset
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        let level = if args.verbose {
            Some("debug")
        } else {
            config.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
        };
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based color job");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let job = match config.to_job() {
        Ok(job) => job,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No color table will be written");
        println!("✅ Dry run complete. Job <{}> would use '{}'.", job.dataset, job.style.describe());
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let records = config.record_source();
    let store = LocalStore::new(&config.store.path);
    let pipeline = DatasetPipeline::new(records.clone(), store, job).with_histogram(Arc::new(records));
    let engine = ColorEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Color job completed successfully!");
            println!(
                "✅ Color table for <{}> set to '{}' ({} breakpoints)",
                summary.dataset, summary.style, summary.breakpoints
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Color job failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Job Summary:");
    println!("  Job: {}", config.job.name);
    if let Some(description) = &config.job.description {
        println!("  Description: {}", description);
    }
    println!("  Dataset: {}", config.dataset.path);
    println!(
        "  Column: {}",
        config.colors.column.as_deref().unwrap_or("(identifiers)")
    );
    println!("  Store: {}", config.store.path);

    if let Some(transform) = &config.transform {
        let enabled: Vec<&str> = [
            ("invert", transform.invert),
            ("log", transform.log_scale),
            ("abs-log", transform.abs_log_scale),
            ("equalize", transform.histogram_equalize),
        ]
        .into_iter()
        .filter(|(_, on)| on.unwrap_or(false))
        .map(|(name, _)| name)
        .collect();
        if !enabled.is_empty() {
            println!("  Transforms: {}", enabled.join(", "));
        }
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
