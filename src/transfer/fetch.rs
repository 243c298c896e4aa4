use crate::error::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// One notification from an in-flight fetch.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// More bytes have reached the destination since the last event.
    Progress,
    /// The underlying mechanism finished; `Err` carries a failure description.
    Done(std::result::Result<(), String>),
}

/// A transfer mechanism capable of continuing a partially-written file.
#[async_trait]
pub trait ResumableFetch {
    /// Begin a resumable transfer of `url` into `dest` and return its
    /// notification stream.
    ///
    /// Implementations must continue from the current length of an existing
    /// partial file rather than rewriting it, and must create the
    /// destination before the first event is sent.
    async fn start(&self, url: &str, dest: &Path) -> Result<mpsc::Receiver<FetchEvent>>;
}

/// Built-in transfer mechanism: a range-requesting HTTP client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                Error::TransferMechanismUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ResumableFetch for HttpFetcher {
    async fn start(&self, url: &str, dest: &Path) -> Result<mpsc::Receiver<FetchEvent>> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dest)
            .await?;
        let offset = file.metadata().await?.len();

        let mut request = self.client.get(url);
        if offset > 0 {
            tracing::info!("Resuming transfer from byte {}", offset);
            request = request.header(reqwest::header::RANGE, format!("bytes={}-", offset));
        }

        let response = request.send().await.map_err(|e| {
            Error::TransferMechanismUnavailable(format!("request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        let (tx, rx) = mpsc::channel(16);

        if status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            // the partial file already covers the requested range
            let _ = tx.try_send(FetchEvent::Done(Ok(())));
            return Ok(rx);
        }
        if !status.is_success() {
            return Err(Error::TransferFailed(format!(
                "HTTP status {} for {}",
                status, url
            )));
        }
        if offset > 0 && status != reqwest::StatusCode::PARTIAL_CONTENT {
            // server ignored the range request; the partial bytes cannot be
            // trusted against the fresh body
            tracing::warn!("Server did not honor the range request, restarting from zero");
            file.set_len(0).await?;
        }

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut failure: Option<String> = None;

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        if let Err(e) = file.write_all(&bytes).await {
                            failure = Some(format!("write failed: {}", e));
                            break;
                        }
                        let _ = tx.try_send(FetchEvent::Progress);
                    }
                    Err(e) => {
                        failure = Some(format!("stream failed: {}", e));
                        break;
                    }
                }
            }

            if failure.is_none() {
                if let Err(e) = file.flush().await {
                    failure = Some(format!("flush failed: {}", e));
                }
            }

            let done = match failure {
                None => Ok(()),
                Some(detail) => Err(detail),
            };
            let _ = tx.send(FetchEvent::Done(done)).await;
        });

        Ok(rx)
    }
}

/// External transfer mechanism: `wget -c`, the continue flag doing the
/// resume work.
pub struct WgetFetcher;

#[async_trait]
impl ResumableFetch for WgetFetcher {
    async fn start(&self, url: &str, dest: &Path) -> Result<mpsc::Receiver<FetchEvent>> {
        // wget creates the file only after its first server response;
        // create it up front so progress stats never race the spawn
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dest)
            .await?;

        let mut child = Command::new("wget")
            .arg("-c")
            .arg(url)
            .arg("-O")
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::TransferMechanismUnavailable(format!("failed to spawn wget: {}", e))
            })?;

        let stderr = child.stderr.take().ok_or_else(|| {
            Error::TransferMechanismUnavailable("wget stderr was not captured".to_string())
        })?;

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            // wget's progress display is carriage-return driven, so read raw
            // chunks rather than lines; any stderr activity is a tick
            let mut reader = BufReader::new(stderr);
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let _ = tx.try_send(FetchEvent::Progress);
                    }
                    Err(_) => break,
                }
            }

            let done = match child.wait().await {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(format!("wget exited with {}", status)),
                Err(e) => Err(format!("failed to wait for wget: {}", e)),
            };
            let _ = tx.send(FetchEvent::Done(done)).await;
        });

        Ok(rx)
    }
}
