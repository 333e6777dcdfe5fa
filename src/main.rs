//! Entry point.

use std::{io, path::PathBuf, process::ExitCode};

use chrono::Utc;
use clap::Parser;
use log::{debug, error, info};

use mindergas_rs::{
    context::RunContext,
    delivery::DeliveryClient,
    job::{Job, Mode, RunError},
    logging::{self, LogOptions},
    settings::Settings,
    store::PgReadingStore,
};

#[derive(Parser, Debug)]
#[command(name = "mindergas", version, about)]
struct Opts {
    /// Path to JSON config file
    #[arg(long, default_value = "config/example.json")]
    config: PathBuf,

    /// Build payload but do not POST
    #[arg(long)]
    dry_run: bool,

    /// Show only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    silent: bool,

    /// Show all log messages
    #[arg(short, long, conflicts_with = "silent")]
    verbose: bool,

    /// Suppress timestamps in logs, useful with journald
    #[arg(long)]
    suppress_log_timestamps: bool,
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    logging::init(LogOptions {
        silent: opts.silent,
        verbose: opts.verbose,
        suppress_timestamps: opts.suppress_log_timestamps,
    });

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("[{}] {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<(), RunError> {
    info!("reading settings from {}", opts.config.display());
    let settings = Settings::load(&opts.config)?;
    debug!(
        "settings: table={} timezone={} url={}",
        settings.readings_table, settings.timezone, settings.post_url
    );

    let (ctx, _cancel) = match settings.run_timeout() {
        Some(timeout) => RunContext::with_timeout(timeout),
        None => RunContext::unbounded(),
    };

    let client = DeliveryClient::new(settings.delivery_config())?;
    let mut store = PgReadingStore::open(&ctx, &settings.db_dsn, &settings.readings_table)?;

    let job = Job {
        zone: settings.zone(),
        mode: if opts.dry_run {
            Mode::DryRun
        } else {
            Mode::Deliver {
                url: settings.post_url.clone(),
                auth_token: settings.auth_token.clone(),
            }
        },
    };
    let mut stdout = io::stdout().lock();
    job.run(&ctx, &mut store, &client, Utc::now(), &mut stdout)?;
    Ok(())
}
