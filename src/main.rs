//! Session ledger: HTTP service entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v`/`-q` flags > env > config)
//!   4. Init logger once
//!   5. Open the ledger store
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Serve HTTP until shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use session_ledger::config;
use session_ledger::error::AppError;
use session_ledger::http::{AppState, HttpServer};
use session_ledger::ledger::{LedgerService, stores};
use session_ledger::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let log = logger::resolve(args.log_level, &config.log_level)?;
    logger::init(&log)?;

    info!(
        bind = %config.bind,
        store_backend = ?config.store.backend,
        configured_log_level = %config.log_level,
        effective_log_level = %log.level,
        "config loaded"
    );

    let store = stores::open(&config.store)?;
    let service = LedgerService::new(store);
    let state = AppState::new(service, config.session.clone());

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    HttpServer::new(config.bind, state).run(shutdown).await
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity: i8 = 0;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: session-ledger [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv                    Increase logging verbosity (debug, trace)");
                println!("  -q, -qq                    Decrease logging verbosity (warn, error)");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            "--quiet" => verbosity = verbosity.saturating_sub(1),
            a if a.len() > 1 && a.starts_with('-') && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as i8);
            }
            a if a.len() > 1 && a.starts_with('-') && a.chars().skip(1).all(|c| c == 'q') => {
                verbosity = verbosity.saturating_sub((a.len() - 1) as i8);
            }
            _ => {}
        }
    }

    let log_level = match verbosity {
        0 => None,
        i8::MIN..=-2 => Some("error"),
        -1 => Some("warn"),
        1 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
