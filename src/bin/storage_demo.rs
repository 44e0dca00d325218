use anyhow::Result;
use clap::Parser;
use storage_demo::{
    config::{CliArgs, DemoConfig},
    report::display_run_summary,
    workflow,
};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli_args = CliArgs::parse();
    let config = DemoConfig::load(cli_args)?;

    match workflow::run(&config).await {
        Ok(report) => {
            display_run_summary(&report);
            Ok(())
        }
        Err(aborted) => {
            error!(
                stage = %aborted.stage,
                kind = aborted.error.kind(),
                error = %aborted.error,
                "Run aborted"
            );
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}
