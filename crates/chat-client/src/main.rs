//! Chat client demo
//!
//! Run with:
//! ```bash
//! CHAT_TOKEN=... cargo run -p chat-client
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).
//! Logs Ready and Message events until the session ends or Ctrl-C.

use chat_client::Client;
use chat_common::{try_init_tracing, ClientConfig};
use chat_gateway::events::{MessageEvent, ReadyEvent};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Client failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting chat client...");

    let config = ClientConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        api = %config.api.base_url,
        gateway = %config.gateway.url,
        encoding = config.gateway.encoding.as_str(),
        "Configuration loaded"
    );

    let client = Client::new(config)?;

    client.on::<ReadyEvent, _>(|_, ready| {
        info!(
            users = ready.users.len(),
            servers = ready.servers.len(),
            channels = ready.channels.len(),
            "Ready"
        );
        Ok(())
    });
    client.on::<MessageEvent, _>(|_, MessageEvent(message)| {
        info!(
            channel = %message.channel,
            author = %message.author,
            content = %message.content,
            "Message"
        );
        Ok(())
    });
    client.dispatcher().on_error(|ctx, err| {
        warn!(event_type = %ctx.event_type(), error = %err, "Handler error");
    });

    match client.rest().fetch_self().await {
        Ok(me) => info!(user = %me.tag(), "Authenticated as"),
        Err(e) if e.is_api_error() => return Err(e.into()),
        Err(e) => warn!(error = %e, "Could not fetch own account"),
    }

    client.open().await?;

    tokio::select! {
        reason = client.wait() => {
            info!(reason = ?reason, "Session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            client.close().await;
        }
    }

    Ok(())
}
