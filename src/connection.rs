//! Buffered TCP connection to the engine.
//!
//! One [`Connection`] owns one socket and supports two interaction shapes:
//! a single request/response round trip, and a pipelined batch where all
//! commands are written back-to-back and the replies are read in command
//! order — the engine answers in order, so the batch is one transport
//! round trip regardless of its size.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::TransportError;
use crate::reply::Reply;
use crate::resp;

/// Default read/write buffer size (8 KB).
const DEFAULT_BUF_SIZE: usize = 8 * 1024;

/// Settings for connecting to an engine.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Engine host.
    pub host: String,
    /// Engine port.
    pub port: u16,
    /// Optional password for AUTH on connect.
    pub password: Option<String>,
    /// Read/write buffer size in bytes.
    pub buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 6379,
            password: None,
            buffer_size: DEFAULT_BUF_SIZE,
        }
    }
}

impl ConnectionConfig {
    /// Create a config from host and port.
    pub fn from_addr(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }
}

/// A TCP connection with buffered RESP I/O.
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Connection {
    /// Open a connection and authenticate if configured.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, TransportError> {
        let addr = format!("{}:{}", config.host, config.port);
        let stream = TcpStream::connect(&addr).await?;
        stream.set_nodelay(true)?;

        let mut conn = Self {
            stream,
            read_buf: BytesMut::with_capacity(config.buffer_size),
            write_buf: BytesMut::with_capacity(config.buffer_size),
        };

        if let Some(ref password) = config.password {
            let reply = conn
                .request(&[Bytes::from("AUTH"), Bytes::copy_from_slice(password.as_bytes())])
                .await?;
            match reply {
                Reply::Simple(ref s) if s == "OK" => {}
                other => return Err(TransportError::Auth(format!("unexpected AUTH reply: {}", other))),
            }
        }

        Ok(conn)
    }

    /// Send one command and read its reply.
    pub async fn request(&mut self, args: &[Bytes]) -> Result<Reply, TransportError> {
        self.write_buf.clear();
        resp::encode_command(args, &mut self.write_buf);
        self.flush_writes().await?;
        self.read_reply().await
    }

    /// Send a batch of commands as one pipelined round trip.
    ///
    /// Replies come back in command order; an error reply occupies its
    /// slot as a [`Reply::Error`] value rather than aborting the batch.
    pub async fn request_pipeline(
        &mut self,
        commands: &[Vec<Bytes>],
    ) -> Result<Vec<Reply>, TransportError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        self.write_buf.clear();
        for cmd in commands {
            resp::encode_command(cmd, &mut self.write_buf);
        }
        self.flush_writes().await?;

        let mut replies = Vec::with_capacity(commands.len());
        for _ in 0..commands.len() {
            replies.push(self.read_reply().await?);
        }
        Ok(replies)
    }

    async fn flush_writes(&mut self) -> Result<(), TransportError> {
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        self.write_buf.clear();
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply, TransportError> {
        loop {
            if let Some(reply) = resp::decode_reply(&mut self.read_buf)? {
                return Ok(reply);
            }
            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(TransportError::ConnectionClosed);
            }
        }
    }
}
