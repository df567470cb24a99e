use clap::Parser;
use std::io::Write;
use txn_analytics::utils::error::Result;
use txn_analytics::utils::logger;
use txn_analytics::{AnalyticsEngine, CliConfig, LocalStorage, Report, Settings, TransactionLoader};

fn run(settings: &Settings) -> Result<String> {
    let loader = TransactionLoader::new(LocalStorage::default());
    let records = loader.load(&settings.data_file)?;

    let engine =
        AnalyticsEngine::new(records).with_missing_issue_id_policy(settings.missing_issue_id);
    let report = Report::build(&engine, &settings.query())?;
    report.render(settings.format)
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting txn-analytics");
    tracing::debug!("CLI config: {:?}", config);

    let outcome = config.resolve().and_then(|settings| {
        tracing::debug!("Resolved settings: {:?}", settings);
        run(&settings)
    });

    match outcome {
        Ok(rendered) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            tracing::info!("✅ Report completed");
        }
        Err(e) => {
            tracing::error!(
                "❌ Report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
