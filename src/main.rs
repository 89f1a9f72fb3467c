use clap::Parser;
use page_imgzip::utils::error::{ErrorSeverity, HarvestError};
use page_imgzip::utils::logger;
use page_imgzip::{BatchOrchestrator, CliConfig};

fn exit_code(e: &HarvestError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: HarvestError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e));
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting page-imgzip");
    tracing::debug!("CLI args: {:?}", cli);

    let config = cli.resolve().unwrap_or_else(|e| fail(e));
    tracing::debug!("Resolved config: {:?}", config);

    let orchestrator = BatchOrchestrator::new(config).unwrap_or_else(|e| fail(e));
    let report = orchestrator.run().await.unwrap_or_else(|e| fail(e));

    println!(
        "✅ {} archived, {} without images, {} failed",
        report.archived(),
        report.skipped(),
        report.failed()
    );

    if report.has_failures() {
        std::process::exit(2);
    }
}
