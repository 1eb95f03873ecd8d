//! # Gas sponsor
//!
//! Executes calls from EIP-7702 accounts with gas paid from a prepaid ledger balance.
use clap::Parser;
use gas_sponsor::cli::Args;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    // Enable backtraces unless a RUST_BACKTRACE value has already been explicitly provided.
    if std::env::var_os("RUST_BACKTRACE").is_none() {
        // SAFETY: the runtime is not started yet, no other thread reads the environment.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {err}");
            std::process::exit(1);
        }
    };
    runtime.block_on(run());
}

async fn run() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    if let Err(err) = args.run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
