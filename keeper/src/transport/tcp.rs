//! Default transport: raw bytes over a plain TCP connection.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::{ReplayResponse, Transport};
use crate::error::TransportError;
use crate::models::{Scheme, TargetRequest};

/// Writes the captured bytes to the endpoint verbatim and reads whatever
/// comes back until the peer closes the connection.
///
/// Handles `http` targets only. TLS termination belongs to the hosting tool;
/// an `https` capture needs a TLS-capable [`Transport`] implementation
/// injected in its place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

#[async_trait]
impl Transport for TcpTransport {
    async fn replay(
        &self,
        target: &TargetRequest,
    ) -> Result<Option<ReplayResponse>, TransportError> {
        if target.scheme == Scheme::Https {
            return Err(TransportError::new(
                "https targets require a TLS-capable transport",
            ));
        }

        let mut stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
        stream.write_all(&target.raw).await?;
        // Close our write half so servers that wait for EOF respond.
        stream.shutdown().await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        debug!(endpoint = %target.endpoint(), bytes = raw.len(), "replay round trip");

        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(ReplayResponse::from_raw(raw)?))
    }
}
