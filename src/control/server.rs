//! Loopback TCP listener that toggles suppression.
//!
//! Connections are served one at a time: accept, read one request, apply,
//! acknowledge, close. Nothing a single client does (disconnecting early,
//! stalling, sending garbage) can stop the accept loop.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use super::protocol::{ControlCommand, ACK, MAX_REQUEST_LEN};
use crate::error::ControlError;
use crate::state::SuppressionState;

/// Default control port.
pub const DEFAULT_PORT: u16 = 6741;

/// Default upper bound on waiting for a client's request.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listener settings. The bind host is always the IPv4 loopback address.
#[derive(Debug, Clone)]
pub struct ControlSettings {
    pub port: u16,
    pub read_timeout: Duration,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A bound control listener.
pub struct ControlServer {
    listener: TcpListener,
    state: Arc<SuppressionState>,
    read_timeout: Duration,
}

impl ControlServer {
    /// Bind `127.0.0.1:<port>`. Port 0 picks an ephemeral port.
    pub async fn bind(
        settings: &ControlSettings,
        state: Arc<SuppressionState>,
    ) -> Result<Self, ControlError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, settings.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ControlError::Bind { addr, source })?;
        Ok(Self {
            listener,
            state,
            read_timeout: settings.read_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ControlError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections forever.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => self.handle_connection(stream, peer).await,
                Err(e) => {
                    warn!("Control accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let mut buf = [0u8; MAX_REQUEST_LEN];
        let read = tokio::time::timeout(self.read_timeout, stream.read(&mut buf)).await;
        let len = match read {
            Ok(Ok(0)) => {
                debug!(%peer, "Control client closed without a request");
                return;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!(%peer, "Control read failed: {}", e);
                return;
            }
            Err(_) => {
                warn!(%peer, timeout_ms = self.read_timeout.as_millis() as u64, "Control read timed out");
                return;
            }
        };

        let Some(command) = ControlCommand::parse(&buf[..len]) else {
            debug!(
                %peer,
                request = %String::from_utf8_lossy(&buf[..len]).escape_debug(),
                "Ignoring unrecognized control request"
            );
            return;
        };

        let previous = command.apply(&self.state);
        let changed = previous != command.target_state();
        match command {
            ControlCommand::Block => info!(%peer, changed, "Windows key blocking ENABLED"),
            ControlCommand::Unblock => info!(%peer, changed, "Windows key blocking DISABLED"),
        }

        if let Err(e) = stream.write_all(ACK).await {
            warn!(%peer, "Failed to acknowledge {}: {}", command, e);
            return;
        }
        if let Err(e) = stream.shutdown().await {
            debug!(%peer, "Control shutdown failed: {}", e);
        }
    }
}

/// Run the control channel on its own named thread with a single-threaded
/// runtime. The thread is never joined; bind and runtime failures are
/// logged and end only this thread.
pub fn spawn_control_channel(
    settings: ControlSettings,
    state: Arc<SuppressionState>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("control-channel".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to start control channel runtime: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                let server = match ControlServer::bind(&settings, state).await {
                    Ok(server) => server,
                    Err(e) => {
                        error!("Control listener unavailable: {}", e);
                        return;
                    }
                };
                info!(port = settings.port, "TCP listener started");
                server.run().await;
            });
        })
}
