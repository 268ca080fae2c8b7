mod cli;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, EventFormat};
use vendorize::core::events::{EventSink, JsonLinesEventSink, LoggingEventSink};
use vendorize::{GoPathResolver, Vendorizer};

const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = cli.to_config()?;
    let sink: Arc<dyn EventSink> = match cli.events {
        EventFormat::Text => Arc::new(LoggingEventSink),
        EventFormat::Json => Arc::new(JsonLinesEventSink::stdout()),
    };
    let resolver =
        Arc::new(GoPathResolver::new(config.search.clone()).with_build_context(cli.build_context()));

    let report = Vendorizer::new(config, resolver)
        .with_event_sink(sink)
        .run()
        .await?;

    for notice in &report.notices {
        tracing::info!("{}", notice);
    }
    for err in &report.errors {
        error!("{}", err);
    }
    if cli.graph {
        print!("{}", report.graph.to_dot());
    }
    eprintln!(
        "Vendorized {} imports in {:?}",
        report.rewrite_count(),
        report.elapsed
    );

    Ok(report.exit_code())
}
