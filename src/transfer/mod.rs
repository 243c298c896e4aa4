pub mod fetch;

pub use fetch::{FetchEvent, HttpFetcher, ResumableFetch, WgetFetcher};

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Minimum seconds between accepted progress samples.
pub const SAMPLE_INTERVAL_SECONDS: f64 = 0.5;

/// Exponential moving average factor for the speed estimate.
pub const SPEED_TWEEN_FACTOR: f64 = 0.1;

/// One artifact transfer: where the bytes come from, where they land, and
/// the authoritative total used as the percent-complete denominator.
#[derive(Debug, Clone)]
pub struct TransferTarget {
    pub source_url: String,
    pub destination_path: PathBuf,
    pub expected_final_size: u64,
}

/// Progress bookkeeping owned by a single transfer.
///
/// The downloaded byte count is always re-read from the destination file,
/// never tracked in memory: the file's on-disk length is what survives a
/// process restart, so it is the only count that stays correct across a
/// resumed transfer.
#[derive(Debug, Default)]
struct TransferState {
    downloaded_bytes: u64,
    last_sample_time_seconds: Option<f64>,
    last_sample_bytes: u64,
    estimated_speed: f64,
}

impl TransferState {
    /// First sample is always accepted; later ones only after the sampling
    /// interval has elapsed.
    fn should_sample(&self, now_seconds: f64) -> bool {
        match self.last_sample_time_seconds {
            None => true,
            Some(last) => now_seconds - last >= SAMPLE_INTERVAL_SECONDS,
        }
    }

    fn record_sample(&mut self, downloaded: u64, now_seconds: f64) {
        if let Some(last) = self.last_sample_time_seconds {
            let delta_seconds = now_seconds - last;
            if delta_seconds > 0.0 {
                let delta_bytes = downloaded.saturating_sub(self.last_sample_bytes);
                let instantaneous = delta_bytes as f64 / delta_seconds;
                self.estimated_speed +=
                    (instantaneous - self.estimated_speed) * SPEED_TWEEN_FACTOR;
            }
        }

        self.last_sample_time_seconds = Some(now_seconds);
        self.last_sample_bytes = downloaded;
        self.downloaded_bytes = downloaded;
    }
}

fn render_progress(target: &TransferTarget, state: &TransferState) -> String {
    let name = target
        .destination_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.destination_path.display().to_string());

    let mib = state.downloaded_bytes as f64 / 1024.0 / 1024.0;
    let percent = if target.expected_final_size == 0 {
        100.0
    } else {
        state.downloaded_bytes as f64 / target.expected_final_size as f64 * 100.0
    };
    let speed_mib = state.estimated_speed / 1024.0 / 1024.0;

    format!(
        "{} {:.2} MiB {:.2}% {:.2} MiB/s",
        name, mib, percent, speed_mib
    )
}

async fn stat_len(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::DestinationUnreadable(format!("{}: {}", path.display(), e)))?;
    Ok(metadata.len())
}

/// Drives one resumable transfer to completion, emitting throttled progress
/// lines to `on_progress`.
pub struct Transferor<F: ResumableFetch> {
    fetcher: F,
}

impl<F: ResumableFetch> Transferor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Transfer `target` to disk.
    ///
    /// A partial file at the destination is continued, not overwritten. The
    /// partial file is also left in place on failure so that a retry
    /// resumes instead of restarting. Only one transfer may write a given
    /// destination path at a time.
    pub async fn transfer(
        &self,
        target: &TransferTarget,
        mut on_progress: impl FnMut(&str),
    ) -> Result<()> {
        let mut events = self
            .fetcher
            .start(&target.source_url, &target.destination_path)
            .await?;

        let started = Instant::now();
        let mut state = TransferState::default();
        let mut outcome: Option<std::result::Result<(), String>> = None;

        while let Some(event) = events.recv().await {
            match event {
                FetchEvent::Progress => {
                    let now = started.elapsed().as_secs_f64();
                    if !state.should_sample(now) {
                        continue;
                    }
                    let downloaded = stat_len(&target.destination_path).await?;
                    state.record_sample(downloaded, now);
                    on_progress(&render_progress(target, &state));
                }
                FetchEvent::Done(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }

        // One final sample regardless of the throttle, so the last emitted
        // line reflects the bytes actually on disk.
        let now = started.elapsed().as_secs_f64();
        let downloaded = stat_len(&target.destination_path).await?;
        state.record_sample(downloaded, now);
        on_progress(&render_progress(target, &state));

        match outcome {
            Some(Ok(())) => Ok(()),
            Some(Err(detail)) => Err(Error::TransferFailed(detail)),
            None => Err(Error::TransferFailed(
                "transfer ended without a completion signal".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    fn target(dest: &Path, expected: u64) -> TransferTarget {
        TransferTarget {
            source_url: "https://example.com/m.Q4_0.gguf".to_string(),
            destination_path: dest.to_path_buf(),
            expected_final_size: expected,
        }
    }

    #[test]
    fn test_first_sample_always_accepted() {
        let state = TransferState::default();
        assert!(state.should_sample(0.0));
    }

    #[test]
    fn test_throttle_rejects_close_samples() {
        let mut state = TransferState::default();
        state.record_sample(100, 1.0);
        assert!(!state.should_sample(1.2));
        assert!(state.should_sample(1.5));
        assert!(state.should_sample(3.0));
    }

    #[test]
    fn test_first_sample_sets_no_speed() {
        let mut state = TransferState::default();
        state.record_sample(1_000_000, 1.0);
        assert_eq!(state.estimated_speed, 0.0);
        assert_eq!(state.downloaded_bytes, 1_000_000);
    }

    #[test]
    fn test_speed_unchanged_when_no_time_elapsed() {
        let mut state = TransferState::default();
        state.record_sample(1_000_000, 1.0);
        state.record_sample(2_000_000, 2.0);
        let speed = state.estimated_speed;

        state.record_sample(3_000_000, 2.0);
        assert_eq!(state.estimated_speed, speed);
        assert_eq!(state.last_sample_bytes, 3_000_000);
    }

    #[test]
    fn test_ema_converges_toward_constant_speed() {
        let mut state = TransferState::default();
        let rate = 1_000_000u64;

        let mut previous = 0.0;
        for step in 1..=50u64 {
            state.record_sample(rate * step, step as f64);
            let speed = state.estimated_speed;
            // monotonically approaches 1 MB/s from below
            assert!(speed >= previous);
            assert!(speed <= rate as f64);
            previous = speed;
        }
        assert!((state.estimated_speed - rate as f64).abs() / (rate as f64) < 0.01);
    }

    #[test]
    fn test_ema_single_step_weight() {
        let mut state = TransferState::default();
        state.record_sample(0, 0.0);
        state.record_sample(1_000_000, 1.0);
        // one update from zero moves a tenth of the way
        assert!((state.estimated_speed - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_render_progress_halfway() {
        let tgt = target(Path::new("/tmp/m.Q4_0.gguf"), 2_000_000);
        let mut state = TransferState::default();
        state.record_sample(1_000_000, 1.0);

        let line = render_progress(&tgt, &state);
        assert!(line.starts_with("m.Q4_0.gguf"));
        assert!(line.contains("50.00%"));
        assert!(line.contains("0.95 MiB"));
    }

    /// Scripted fetcher: appends chunks to the destination, emitting one
    /// progress event per chunk, then completes.
    struct ScriptedFetcher {
        chunks: Vec<Vec<u8>>,
        completion: std::result::Result<(), String>,
        create_destination: bool,
    }

    #[async_trait]
    impl ResumableFetch for ScriptedFetcher {
        async fn start(
            &self,
            _url: &str,
            dest: &Path,
        ) -> Result<mpsc::Receiver<FetchEvent>> {
            let (tx, rx) = mpsc::channel(64);
            if self.create_destination {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dest)
                    .await?;
                for chunk in &self.chunks {
                    file.write_all(chunk).await?;
                    file.flush().await?;
                    let _ = tx.send(FetchEvent::Progress).await;
                }
            } else {
                let _ = tx.send(FetchEvent::Progress).await;
            }
            let _ = tx.send(FetchEvent::Done(self.completion.clone())).await;
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn test_transfer_emits_final_line_with_full_percent() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("m.Q4_0.gguf");
        let fetcher = ScriptedFetcher {
            chunks: vec![vec![0u8; 600], vec![0u8; 400]],
            completion: Ok(()),
            create_destination: true,
        };

        let mut lines = Vec::new();
        Transferor::new(fetcher)
            .transfer(&target(&dest, 1000), |line| lines.push(line.to_string()))
            .await
            .unwrap();

        assert!(!lines.is_empty());
        let last = lines.last().unwrap();
        assert!(last.contains("100.00%"), "unexpected final line: {}", last);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 1000);
    }

    #[tokio::test]
    async fn test_transfer_resumes_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("m.Q4_0.gguf");
        std::fs::write(&dest, vec![0u8; 500]).unwrap();

        let fetcher = ScriptedFetcher {
            chunks: vec![vec![0u8; 500]],
            completion: Ok(()),
            create_destination: true,
        };

        let mut lines = Vec::new();
        Transferor::new(fetcher)
            .transfer(&target(&dest, 1000), |line| lines.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 1000);
        assert!(lines.last().unwrap().contains("100.00%"));
    }

    #[tokio::test]
    async fn test_failed_completion_surfaces_after_final_emit() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("m.Q4_0.gguf");
        let fetcher = ScriptedFetcher {
            chunks: vec![vec![0u8; 250]],
            completion: Err("connection reset".to_string()),
            create_destination: true,
        };

        let mut lines = Vec::new();
        let err = Transferor::new(fetcher)
            .transfer(&target(&dest, 1000), |line| lines.push(line.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TransferFailed(_)));
        // final emit happened and the partial file is intact for a retry
        assert!(lines.last().unwrap().contains("25.00%"));
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 250);
    }

    #[tokio::test]
    async fn test_missing_destination_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("never-created.gguf");
        let fetcher = ScriptedFetcher {
            chunks: Vec::new(),
            completion: Ok(()),
            create_destination: false,
        };

        let err = Transferor::new(fetcher)
            .transfer(&target(&dest, 1000), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DestinationUnreadable(_)));
        assert!(!dest.exists());
    }
}
