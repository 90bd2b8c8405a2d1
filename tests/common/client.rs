//! Test IRC client.
//!
//! Runs a [`Connection`] on a spawned task and talks to it over
//! `tokio::io::duplex`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tkellem::config::BouncerConfig;
use tkellem::{Connection, ConnectionError, Registry};
use tkellem_proto::Message;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// A test IRC client.
pub struct TestClient {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    task: JoinHandle<Result<(), ConnectionError>>,
}

impl TestClient {
    /// Start a connection task for `registry` and return its client side.
    pub fn connect(registry: Arc<dyn Registry>) -> Self {
        Self::connect_with(registry, &BouncerConfig::default())
    }

    /// Like [`TestClient::connect`] with explicit connection limits.
    pub fn connect_with(registry: Arc<dyn Registry>, config: &BouncerConfig) -> Self {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(Connection::with_config(server, registry, false, config).run());
        let (read_half, write_half) = tokio::io::split(client);

        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            task,
        }
    }

    /// Send a raw line, adding CRLF when missing.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one raw line without its terminator.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await??;
        anyhow::ensure!(n > 0, "connection closed");
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }

    /// Receive and parse one message.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        let line = self.recv_line().await?;
        line.parse::<Message>()
            .map_err(|e| anyhow::anyhow!("Parse error: {}", e))
    }

    /// Receive `n` raw lines.
    pub async fn recv_lines(&mut self, n: usize) -> anyhow::Result<Vec<String>> {
        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(self.recv_line().await?);
        }
        Ok(lines)
    }

    /// Assert nothing arrives within `dur`.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        match timeout(dur, self.reader.read_line(&mut line)).await {
            Err(_) => Ok(()),
            Ok(Ok(0)) => anyhow::bail!("connection closed"),
            Ok(_) => anyhow::bail!("unexpected line: {}", line.trim_end()),
        }
    }

    /// Wait for the server side to close the stream.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await??;
        anyhow::ensure!(n == 0, "expected EOF, got: {}", line.trim_end());
        Ok(())
    }

    /// Standard handshake for `alice` on `net1` as client `laptop`.
    pub async fn login(&mut self) -> anyhow::Result<()> {
        self.send_raw("PASS secret").await?;
        self.send_raw("USER net1 laptop").await?;
        self.send_raw("NICK alice").await
    }

    /// Close the client side and wait for the connection task.
    pub async fn finish(mut self) -> anyhow::Result<Result<(), ConnectionError>> {
        self.writer.shutdown().await?;
        drop(self.writer);
        Ok(timeout(Duration::from_secs(5), self.task).await??)
    }

    /// Wait for the connection task without closing the client side.
    pub async fn join(self) -> anyhow::Result<Result<(), ConnectionError>> {
        Ok(timeout(Duration::from_secs(5), self.task).await??)
    }
}
