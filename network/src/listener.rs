//! Server side: accept client connections and run one session per
//! connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use prand_protocol::{
    ServerIdentity, ServerSession, SessionConfig, SessionError, SessionOutcome, TransportError,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::framing::{read_frame, write_frame};
use crate::NetworkError;

/// Accepts client connections for one server identity.
pub struct ServerListener {
    identity: Arc<ServerIdentity>,
    config: SessionConfig,
    read_timeout: Duration,
    listener: TcpListener,
}

impl ServerListener {
    pub async fn bind(
        addr: &str,
        identity: Arc<ServerIdentity>,
        config: SessionConfig,
        read_timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| NetworkError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            identity,
            config,
            read_timeout,
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.listener
            .local_addr()
            .map_err(|e| NetworkError::Io(e.to_string()))
    }

    /// Accept connections until `shutdown` fires. Sessions already running
    /// finish on their own.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            server = self.identity.index(),
            addr = ?self.listener.local_addr().ok(),
            "listener started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("listener shutting down");
                    break;
                }
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.spawn_session(stream, peer),
                        Err(e) => tracing::warn!("accept failed: {e}"),
                    }
                }
            }
        }
    }

    fn spawn_session(&self, mut stream: tokio::net::TcpStream, peer: SocketAddr) {
        let session = match ServerSession::new(Arc::clone(&self.identity), self.config) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("cannot start session: {e}");
                return;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, "set_nodelay failed: {e}");
        }
        let read_timeout = self.read_timeout;
        let span = tracing::info_span!("session", server = self.identity.index(), %peer);

        tokio::spawn(
            async move {
                match serve_connection(session, &mut stream, read_timeout).await {
                    Ok(outcome) => tracing::info!(
                        responses = outcome.responses,
                        shares = outcome.shares_revealed,
                        "session complete"
                    ),
                    Err(e) => tracing::debug!("session ended: {e}"),
                }
            }
            .instrument(span),
        );
    }
}

/// Run `session` to completion over one framed async stream.
pub async fn serve_connection<S: AsyncRead + AsyncWrite + Unpin>(
    mut session: ServerSession,
    stream: &mut S,
    read_timeout: Duration,
) -> Result<SessionOutcome, SessionError> {
    loop {
        if let Some(outcome) = session.outcome() {
            return Ok(outcome);
        }
        let inbound = match tokio::time::timeout(read_timeout, read_frame(stream)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(session.abort(e.into())),
            Err(_) => return Err(session.abort(TransportError::Timeout.into())),
        };
        let (returned, handled) = handle_blocking(session, inbound).await?;
        session = returned;
        let reply = handled?;
        if let Err(e) = write_frame(stream, &reply).await {
            return Err(session.abort(e.into()));
        }
    }
}

/// Run one protocol step on the blocking pool. Round 3 decrypts and checks
/// every relayed deal, which is too slow for an executor thread.
async fn handle_blocking(
    mut session: ServerSession,
    inbound: Vec<u8>,
) -> Result<(ServerSession, Result<Vec<u8>, SessionError>), SessionError> {
    tokio::task::spawn_blocking(move || {
        let handled = session.handle(&inbound);
        (session, handled)
    })
    .await
    .map_err(|e| {
        tracing::error!("session task failed: {e}");
        SessionError::Internal(format!("session task failed: {e}"))
    })
}
