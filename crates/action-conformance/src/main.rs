use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use action_conformance::{
    FixtureDriver, RunnerSettings, StdioEndpoint, ToolingSession, config::LogLevel, discover_cases,
};

#[derive(Parser, Debug)]
#[command(name = "action-conformance", version, about)]
struct Args {
    /// Fixture roots to run, each holding `config/` and `source/` directories.
    fixtures: Vec<PathBuf>,

    /// Runner configuration file (conformance.toml).
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Command that launches the tooling server on stdio.
    #[arg(long)]
    server: Option<String>,

    /// Extra argument passed to the server command (repeatable).
    #[arg(long = "server-arg")]
    server_args: Vec<String>,

    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match args.config.as_deref().map(RunnerSettings::load).transpose() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(2);
        },
    };

    init_logging(&args, &settings);

    info!("Starting action-conformance v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = args.server.clone().or_else(|| settings.server.command.clone()) else {
        error!("no tooling server command given (pass --server or set [server].command)");
        return ExitCode::from(2);
    };
    let server_args = if args.server_args.is_empty() {
        settings.server.args.clone()
    } else {
        args.server_args.clone()
    };
    let roots = if args.fixtures.is_empty() {
        settings.fixtures.roots.clone()
    } else {
        args.fixtures.clone()
    };
    if roots.is_empty() {
        error!("no fixture roots given (pass them as arguments or set [fixtures].roots)");
        return ExitCode::from(2);
    }

    match run(&command, &server_args, &roots).await {
        Ok(true) => {
            info!("conformance suite passed");
            ExitCode::SUCCESS
        },
        Ok(false) => {
            error!("conformance suite failed");
            ExitCode::FAILURE
        },
        Err(error) => {
            error!("conformance run aborted: {error}");
            ExitCode::from(2)
        },
    }
}

async fn run(
    command: &str,
    server_args: &[String],
    roots: &[PathBuf],
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut cases = Vec::new();
    for root in roots {
        cases.extend(discover_cases(root)?);
    }
    info!(cases = cases.len(), "discovered conformance cases");

    let endpoint = StdioEndpoint::spawn(command, server_args)?;
    let session = ToolingSession::initialize(endpoint).await?;
    let mut driver = FixtureDriver::new(session);
    let report = driver.run_suite(&cases).await;
    driver.finish().await?;

    info!(
        passed = report.passed_cases(),
        failed = report.failed_cases(),
        errored = report.errored_cases(),
        "conformance suite finished"
    );
    Ok(report.passed())
}

fn init_logging(
    args: &Args,
    settings: &RunnerSettings,
) {
    let level = if args.verbose { LogLevel::Debug } else { settings.logging.level };
    let directive = format!("action_conformance={}", level.as_directive());

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new(&directive));

    match &args.log_file {
        Some(log_file) => {
            let path = PathBuf::from(log_file);
            let file_appender = tracing_appender::rolling::never(
                path.parent().unwrap_or(std::path::Path::new(".")),
                path.file_name().unwrap_or(std::ffi::OsStr::new("action-conformance.log")),
            );
            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new(&directive));
            tracing_subscriber::registry().with(stderr_layer).with(file_layer).init();
        },
        None => {
            tracing_subscriber::registry().with(stderr_layer).init();
        },
    }
}
