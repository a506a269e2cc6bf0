//! Vault CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};
use vault::audit::AuditLog;
use vault::cli::{commands, Cli, Commands};
use vault::config::ConfigManager;
use vault::error::VaultResult;
use vault::factory::create_vault;
use vault::Context;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> VaultResult<()> {
    let cli = Cli::parse();
    let logging = init_logging(cli.verbose);

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let mut config = config_manager.load().await?;
    if let Some(namespace) = cli.namespace {
        config.vault.namespace = Some(namespace);
    }

    if config.general.log_format == "json" {
        if let Err(e) = logging.reload(json_layer()) {
            warn!("Failed to switch to JSON logs: {}", e);
        }
    }

    // Ctrl-C cancels whatever backend or provider call is in flight
    let ctx = Context::background();
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let vault = create_vault(&config);
    let audit = AuditLog::new(&config);

    match cli.command {
        Commands::Get(args) => commands::get(args, &vault, &ctx).await,
        Commands::Set(args) => commands::set(args, &vault, &ctx, &audit).await,
        Commands::Delete(args) => commands::delete(args, &vault, &ctx, &audit).await,
        Commands::List(args) => commands::list(args, &vault, &ctx).await,
        Commands::Refresh => commands::refresh(&vault, &ctx, &audit).await,
        Commands::Config(args) => commands::config(args, &config_manager, &config).await,
    }
}

type LogSubscriber = Layered<EnvFilter, Registry>;
type LogLayer = Box<dyn Layer<LogSubscriber> + Send + Sync>;

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr so values on stdout
/// stay pipeable. Starts as text; the handle swaps in JSON once the config
/// asks for it.
fn init_logging(verbose: u8) -> reload::Handle<LogLayer, LogSubscriber> {
    let filter = match verbose {
        0 => EnvFilter::new("vault=warn"),
        1 => EnvFilter::new("vault=info"),
        _ => EnvFilter::new("vault=debug"),
    };

    let (layer, handle) = reload::Layer::new(text_layer());
    tracing_subscriber::registry().with(filter).with(layer).init();
    handle
}

fn text_layer() -> LogLayer {
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .boxed()
}

fn json_layer() -> LogLayer {
    fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .boxed()
}
