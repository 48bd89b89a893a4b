use anyhow::Context;
use clap::Parser;
use setu_core::{LockScope, MessageEvent, SetuConfig, TriggerProfile};
use setu_onebot::{IncomingMessage, OneBotClient, OneBotMessageEvent};
use setu_plugin::SetuPlugin;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod console;

use console::ConsoleEvent;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "SETU_CONFIG", default_value = "setu.toml")]
    config: PathBuf,

    /// OneBot forward WebSocket URL (overrides config)
    #[arg(long)]
    ws_url: Option<String>,

    /// OneBot access token (overrides config)
    #[arg(long)]
    access_token: Option<String>,

    /// Trigger profile: classic or qualifier
    #[arg(long)]
    profile: Option<TriggerProfile>,

    /// Image directory (overrides config)
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Lock scope for the image directory: global or per_file
    #[arg(long)]
    lock_scope: Option<LockScope>,

    /// Also write daily-rotated logs into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Handle a single message locally, print the replies and exit
    #[arg(long, value_name = "TEXT")]
    once: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut SetuConfig) {
        if let Some(url) = &self.ws_url {
            let token = self
                .access_token
                .clone()
                .or_else(|| config.onebot.as_ref().and_then(|o| o.access_token.clone()));
            config.onebot = Some(setu_core::config::OneBotConfig {
                ws_url: url.clone(),
                access_token: token,
            });
        } else if let (Some(token), Some(onebot)) = (&self.access_token, config.onebot.as_mut()) {
            onebot.access_token = Some(token.clone());
        }
        if let Some(profile) = self.profile {
            config.plugin.profile = profile;
        }
        if let Some(dir) = &self.image_dir {
            config.store.image_dir = dir.clone();
        }
        if let Some(scope) = self.lock_scope {
            config.store.lock_scope = scope;
        }
    }
}

/// Console logging on stderr, plus a rolling file when `log_dir` is given.
/// Stdout carries `--once` replies only. The guard must live as long as the
/// program.
fn init_logging(log_dir: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "setu.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(console).init();
            None
        }
    }
}

async fn dispatch(plugin: Arc<SetuPlugin>, client: OneBotClient, message: IncomingMessage) {
    let event = OneBotMessageEvent::new(client, message);
    let reply = plugin.on_message(&event).await;
    if reply.is_empty() {
        return;
    }
    if let Err(e) = event.send(reply).await {
        warn!("Failed to deliver final reply for message {}: {}", event.message().message_id, e);
    }
}

async fn serve(plugin: Arc<SetuPlugin>, config: &SetuConfig) -> anyhow::Result<()> {
    let onebot = config
        .onebot
        .as_ref()
        .context("No OneBot connection configured; set [onebot] ws_url, ONEBOT_WS_URL or --ws-url")?;
    let (client, mut messages) = OneBotClient::new(&onebot.ws_url, onebot.access_token.as_deref())?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            Some(message) = messages.recv() => {
                tasks.spawn(dispatch(plugin.clone(), client.clone(), message));
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    error!("Message task failed: {}", e);
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    let mut config = SetuConfig::load_or_default(&args.config);
    args.apply(&mut config);

    info!(
        "Starting setu (profile {:?}, images in {}, lock scope {:?})",
        config.plugin.profile,
        config.store.image_dir.display(),
        config.store.lock_scope
    );
    let plugin = Arc::new(SetuPlugin::from_config(&config)?);

    let leftovers = plugin.store().list_images().await;
    if !leftovers.is_empty() {
        warn!("{} image(s) left over from a previous run", leftovers.len());
    }

    let result = match &args.once {
        Some(text) => {
            let event = ConsoleEvent::new(text);
            let reply = plugin.on_message(&event).await;
            event.send(reply).await.map_err(anyhow::Error::from)
        }
        None => serve(plugin.clone(), &config).await,
    };

    plugin.terminate().await;
    result
}
