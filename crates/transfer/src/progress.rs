use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

/// Default time window for throughput estimation.
const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Default cap on retained samples.
const DEFAULT_MAX_SAMPLES: usize = 100;

/// Which way the bytes are moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// Snapshot emitted after each acknowledged part or delivered window.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub direction: Direction,
    /// Upload file id, or the remote file id for downloads.
    pub file_id: String,
    /// Parts acknowledged or windows delivered so far.
    pub units_done: u32,
    /// Known for uploads and for downloads with a declared size.
    pub total_units: Option<u32>,
    pub bytes_done: u64,
    pub total_bytes: Option<u64>,
    pub bytes_per_second: f64,
    /// Time left at the current speed; `None` without a declared size or a
    /// speed estimate.
    pub eta: Option<Duration>,
}

// ---------------------------------------------------------------------------
// SpeedCalculator
// ---------------------------------------------------------------------------

struct SpeedSample {
    bytes: u64,
    timestamp: Instant,
}

/// Throughput over a sliding window of samples.
pub struct SpeedCalculator {
    samples: VecDeque<SpeedSample>,
    max_samples: usize,
    window: Duration,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_SAMPLES)
    }
}

impl SpeedCalculator {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples: max_samples.max(2),
            window,
        }
    }

    /// Records `bytes` moved at the current instant.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(bytes, Instant::now());
    }

    fn record_at(&mut self, bytes: u64, now: Instant) {
        self.samples.push_back(SpeedSample {
            bytes,
            timestamp: now,
        });

        while let Some(first) = self.samples.front() {
            if now.duration_since(first.timestamp) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Average bytes/second across the window; 0.0 with fewer than two samples.
    ///
    /// The first sample only marks the window start, its bytes are not counted.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if self.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        let moved: u64 = self.samples.iter().skip(1).map(|s| s.bytes).sum();
        moved as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to move `remaining` bytes, `None` while speed is unknown.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Per-transfer progress bookkeeping. Never blocks the transfer: a full or
/// closed channel just drops the snapshot.
pub(crate) struct ProgressReporter {
    tx: Option<mpsc::Sender<TransferProgress>>,
    speed: SpeedCalculator,
    snapshot: TransferProgress,
}

impl ProgressReporter {
    pub(crate) fn new(
        tx: Option<mpsc::Sender<TransferProgress>>,
        direction: Direction,
        file_id: String,
        total_units: Option<u32>,
        total_bytes: Option<u64>,
    ) -> Self {
        let mut speed = SpeedCalculator::default();
        speed.record(0);
        Self {
            tx,
            speed,
            snapshot: TransferProgress {
                direction,
                file_id,
                units_done: 0,
                total_units,
                bytes_done: 0,
                total_bytes,
                bytes_per_second: 0.0,
                eta: None,
            },
        }
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        self.speed.record(bytes as u64);
        self.snapshot.units_done += 1;
        self.snapshot.bytes_done += bytes as u64;
        self.snapshot.bytes_per_second = self.speed.bytes_per_second();
        self.snapshot.eta = self
            .snapshot
            .total_bytes
            .and_then(|total| self.speed.eta(total.saturating_sub(self.snapshot.bytes_done)));

        if let Some(tx) = &self.tx {
            let _ = tx.try_send(self.snapshot.clone());
        }
    }
}
