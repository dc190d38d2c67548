//! troet-bridge - IRC to Mastodon bridge.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use troet_bridge::app::App;
use troet_bridge::config::{Config, validate};
use troet_bridge::db::Database;
use troet_bridge::irc::{
    DispatchTable, Identity, IrcClient, IrcConnector, LifecycleTimings, Session,
};
use troet_bridge::mastodon::MastodonClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(problems) = validate(&config) {
        for problem in &problems {
            error!(error = %problem, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            problems.len()
        ));
    }

    info!(
        server = %config.irc.host,
        channel = %config.irc.channel,
        instance = %config.mastodon.base_url,
        "Starting troet-bridge"
    );

    let db = Database::new(&config.database.path).await?;

    let connector = IrcConnector::new(&config.irc)?;
    let identity = Identity {
        nick: config.irc.nick.clone(),
        realname: config.irc.realname.clone(),
        channel: config.irc.channel.clone(),
        nick_password: config.irc.nick_password.clone(),
    };
    let session = Arc::new(Session::new(
        identity,
        config.irc.queue_capacity,
        Arc::new(db.clone()),
    ));
    let irc = IrcClient::new(
        connector,
        session,
        DispatchTable::standard()?,
        LifecycleTimings {
            read_timeout: config.irc.read_timeout(),
            reconnect_backoff: config.irc.reconnect_backoff(),
        },
    );

    let mastodon = Arc::new(MastodonClient::connect(&config.mastodon, db).await?);
    let app = App::new(irc, mastodon);

    // Shutdown on Ctrl-C
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested");
                    cancel.cancel();
                }
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    app.run(cancel).await;
    Ok(())
}
