use anyhow::Context;
use clap::Parser;
use renewable_cost::adapters::elexon::demand_windows;
use renewable_cost::config::{CacheMode, WindSource};
use renewable_cost::utils::error::{CostError, ErrorSeverity};
use renewable_cost::utils::{logger, validation::Validate};
use renewable_cost::{CliArgs, CostPipeline, EtlEngine, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting renewable-cost");
    if let Some(path) = &args.config {
        tracing::info!("📁 Loading configuration from: {}", path);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No data will be fetched");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = match CostPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(&e),
    };
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Cost analysis completed successfully!");
            println!();
            print!("{}", outcome.report);
            println!();
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn exit_with(e: &CostError) -> ! {
    tracing::error!(
        "❌ Cost analysis failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn display_config_summary(config: &TomlConfig, args: &CliArgs) {
    println!("📋 Configuration Summary:");
    println!("  Analysis: {}", config.analysis.name);
    println!(
        "  Period: {} .. {} ({} days)",
        config.analysis.start,
        config.analysis.end,
        config.period().days()
    );
    println!("  Wind source: {:?}", config.sources.wind);
    println!("  Demand measure: {}", config.sources.demand_measure.as_str());
    println!(
        "  Cache: {:?} ({})",
        config.cache.mode, config.cache.directory
    );
    println!("  Output: {}", config.output_path());
    println!(
        "  Battery cost: £{}/kWh, wind capital £{}/kW, solar capital £{}/kW",
        config.assumptions.battery_cost_kwh,
        config.assumptions.wind.capital_cost_kw,
        config.assumptions.solar.capital_cost_kw
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    if config.cache.mode == CacheMode::Offline {
        println!("  Offline mode: all data will be read from {}", config.cache.directory);
        return Ok(());
    }

    let period = config.period();
    let start = period.start_time().format("%Y-%m-%dT%H:%M:%S").to_string();
    let end = period.end_time().format("%Y-%m-%dT%H:%M:%S").to_string();

    match config.sources.wind {
        WindSource::Elexon => {
            let url = url::Url::parse_with_params(
                &format!(
                    "{}/generation/outturn/summary",
                    config.sources.elexon_base_url.trim_end_matches('/')
                ),
                &[("startTime", &start), ("endTime", &end)],
            )
            .context("invalid Elexon base URL")?;
            println!("  Wind:   GET {}", url);
        }
        WindSource::NationalGrid => {
            println!(
                "  Wind:   SQL query on {} (resource {})",
                config.sources.national_grid_url, config.sources.national_grid_resource_id
            );
        }
    }

    let solar = url::Url::parse_with_params(
        &format!(
            "{}/gsp/0",
            config.sources.sheffield_base_url.trim_end_matches('/')
        ),
        &[("start", &start), ("end", &end)],
    )
    .context("invalid Sheffield base URL")?;
    println!("  Solar:  GET {}", solar);

    let windows = demand_windows(&period, config.sources.demand_page_days);
    println!(
        "  Demand: {} request(s) of up to {} days",
        windows.len(),
        config.sources.demand_page_days
    );
    for (from, to) in &windows {
        println!("          {} .. {}", from, to);
    }

    Ok(())
}
