//! Client side of the control channel.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::protocol::{ACK, MAX_REQUEST_LEN};

/// What the server sent back before closing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK`: the command was applied.
    Acknowledged,
    /// Closed without a single byte: the request was not recognized.
    Closed,
    /// Anything else.
    Unexpected(Vec<u8>),
}

impl Reply {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Self::Closed
        } else if bytes == ACK {
            Self::Acknowledged
        } else {
            Self::Unexpected(bytes)
        }
    }
}

/// Send one raw request and wait for the server to close the connection.
///
/// The whole exchange (connect, write, read to EOF) is bounded by `timeout`.
pub async fn send_command(
    addr: SocketAddr,
    request: &[u8],
    timeout: Duration,
) -> std::io::Result<Reply> {
    if request.len() > MAX_REQUEST_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "request too long: {} bytes (max {})",
                request.len(),
                MAX_REQUEST_LEN
            ),
        ));
    }

    let exchange = async {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(request).await?;
        stream.shutdown().await?;

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await?;
        Ok::<_, std::io::Error>(Reply::from_bytes(reply))
    };

    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "control request timed out"))?
}
