use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ServerConfig};
use crate::http::connection::Connection;
use crate::http::framer::RequestFramer;
use crate::server::dispatcher::Dispatcher;

pub async fn run(cfg: &Config, dispatcher: Dispatcher) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.listen_addr))?;
    info!(
        addr = %cfg.server.listen_addr,
        root = %dispatcher.sandbox().root().display(),
        "Listening"
    );

    serve(listener, &cfg.server, dispatcher).await
}

/// Accepts connections forever, one task per connection.
///
/// At most `max_connections` tasks run at once; further clients wait in the
/// kernel backlog until a permit frees up. There is no read timeout, so a
/// client that stalls mid-request holds its permit until it disconnects.
pub async fn serve(
    listener: TcpListener,
    cfg: &ServerConfig,
    dispatcher: Dispatcher,
) -> anyhow::Result<()> {
    let permits = Arc::new(Semaphore::new(cfg.max_connections.max(1)));
    let framer = RequestFramer::from_config(cfg);

    loop {
        let permit = Arc::clone(&permits).acquire_owned().await?;

        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };
        debug!(%peer, "Accepted connection");

        let dispatcher = dispatcher.clone();
        let framer = framer.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, dispatcher, framer);
            if let Err(e) = conn.run().await {
                error!(%peer, error = %e, "Connection error");
            }
            drop(permit);
        });
    }
}
