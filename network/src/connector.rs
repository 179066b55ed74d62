//! Client side: connect to every roster server and run the four rounds
//! over all connections in parallel.

use std::time::Duration;

use futures_util::future::join_all;
use prand_protocol::{ClientSession, RandomOutput, Transcript, TransportError};
use tokio::net::TcpStream;

use crate::framing::{read_frame, write_frame};
use crate::NetworkError;

#[derive(Clone, Debug)]
pub struct ConnectorConfig {
    /// Timeout for each TCP connection attempt.
    pub connect_timeout: Duration,
    /// Timeout for each server reply.
    pub read_timeout: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Drive `session` against the servers at `addrs`, in roster order.
///
/// Unreachable or failing servers count as missing replies; the run only
/// fails when the client session itself does.
pub async fn run_client(
    mut session: ClientSession,
    addrs: &[String],
    config: &ConnectorConfig,
) -> Result<(RandomOutput, Transcript), NetworkError> {
    if addrs.len() != session.roster().len() {
        return Err(NetworkError::ConnectionFailed(format!(
            "{} addresses for a roster of {}",
            addrs.len(),
            session.roster().len()
        )));
    }

    let mut streams: Vec<Option<TcpStream>> = join_all(
        addrs
            .iter()
            .enumerate()
            .map(|(server, addr)| connect(server, addr, config.connect_timeout)),
    )
    .await;
    if streams.iter().all(Option::is_none) {
        return Err(NetworkError::ConnectionFailed("no server reachable".into()));
    }

    let timeout = config.read_timeout;
    let i1 = session.start()?;
    let r1s = exchange(&mut streams, &i1, timeout).await;
    let i2 = session.on_r1s(&r1s)?;
    let r2s = exchange(&mut streams, &i2, timeout).await;
    let i3 = session.on_r2s(&r2s)?;
    let r3s = exchange(&mut streams, &i3, timeout).await;
    let i4 = session.on_r3s(&r3s)?;
    let r4s = exchange(&mut streams, &i4, timeout).await;
    let output = session.on_r4s(&r4s)?;

    tracing::info!(dealers = ?output.dealers, "randomness generated");
    Ok((output, session.into_transcript()))
}

async fn connect(server: usize, addr: &str, timeout: Duration) -> Option<TcpStream> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!(server, addr, "set_nodelay failed: {e}");
            }
            Some(stream)
        }
        Ok(Err(e)) => {
            tracing::warn!(server, addr, "TCP connect failed: {e}");
            None
        }
        Err(_) => {
            tracing::warn!(server, addr, "connection timed out");
            None
        }
    }
}

async fn round_trip(stream: &mut TcpStream, message: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError> {
    write_frame(stream, message).await?;
    tokio::time::timeout(timeout, read_frame(stream))
        .await
        .map_err(|_| TransportError::Timeout)?
}

/// Send `message` to every live server and wait for all replies. A server
/// that fails is dropped for the rest of the run.
async fn exchange(
    streams: &mut [Option<TcpStream>],
    message: &[u8],
    timeout: Duration,
) -> Vec<Option<Vec<u8>>> {
    join_all(
        streams
            .iter_mut()
            .enumerate()
            .map(|(server, slot)| async move {
                let result = match slot.as_mut() {
                    Some(stream) => round_trip(stream, message, timeout).await,
                    None => return None,
                };
                match result {
                    Ok(reply) => Some(reply),
                    Err(error) => {
                        tracing::debug!(server, %error, "dropping server");
                        *slot = None;
                        None
                    }
                }
            }),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_disables_nagle() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let stream = connect(0, &addr, Duration::from_secs(5)).await.unwrap();
        assert!(stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn refused_connection_is_a_missing_server() {
        let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = unused.local_addr().unwrap().to_string();
        drop(unused);
        assert!(connect(0, &addr, Duration::from_secs(5)).await.is_none());
    }
}
