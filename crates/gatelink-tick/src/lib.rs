//! Fixed-rate frame clock for Gatelink.
//!
//! The session machine has no clock of its own: every timeout is measured in
//! the `dt` handed to `Connection::main_process`. A [`FramePacer`] produces
//! those deltas at a steady rate (1–240 Hz) so an async host can drive the
//! machine the way a render loop would.
//!
//! # Integration
//!
//! The pacer sits inside the driver's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(req) = requests.recv() => { /* handle control requests */ }
//!         frame = pacer.wait_for_frame() => {
//!             conn.main_process(frame.dt);
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a frame wakes up late.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramePolicy {
    /// Count the missed frames and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the planned cadence; the next frame fires at its planned time.
    Drop,
}

/// Configuration for a [`FramePacer`].
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frames per second.
    pub frame_rate_hz: u32,
    pub policy: FramePolicy,
    /// Random delay (0–max µs) added to the first frame so pacers started
    /// together don't wake in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            policy: FramePolicy::default(),
            initial_jitter_us: 0,
        }
    }
}

impl FrameConfig {
    pub const MIN_FRAME_RATE_HZ: u32 = 1;
    pub const MAX_FRAME_RATE_HZ: u32 = 240;

    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self {
            frame_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps `frame_rate_hz` into
    /// [`MIN_FRAME_RATE_HZ`](Self::MIN_FRAME_RATE_HZ)..=[`MAX_FRAME_RATE_HZ`](Self::MAX_FRAME_RATE_HZ).
    ///
    /// Called automatically by [`FramePacer::new`].
    pub fn validated(mut self) -> Self {
        let clamped = self
            .frame_rate_hz
            .clamp(Self::MIN_FRAME_RATE_HZ, Self::MAX_FRAME_RATE_HZ);
        if clamped != self.frame_rate_hz {
            warn!(
                rate = self.frame_rate_hz,
                clamped, "frame_rate_hz out of range, clamping"
            );
            self.frame_rate_hz = clamped;
        }
        self
    }

    /// Nominal length of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Frame info
// ---------------------------------------------------------------------------

/// One fired frame, returned by [`FramePacer::wait_for_frame`].
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Time since the previous frame (or since the pacer started or
    /// resumed). Equals the nominal frame length unless the frame was late,
    /// so state-machine timeouts still see the real elapsed time.
    pub dt: Duration,
    /// The frame woke more than 10% of a frame late.
    pub overrun: bool,
    /// Whole frames missed before this one (Skip policy only).
    pub skipped: u64,
}

/// Counters kept by the pacer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    pub total_frames: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

/// Fixed-rate frame clock. One per driven session.
#[derive(Debug)]
pub struct FramePacer {
    config: FrameConfig,
    frame_duration: Duration,
    frame_count: u64,
    next_frame: Instant,
    last_frame: Instant,
    paused: bool,
    metrics: FrameMetrics,
}

impl FramePacer {
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let frame_duration = config.frame_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        let now = Instant::now();

        debug!(
            rate_hz = config.frame_rate_hz,
            policy = ?config.policy,
            jitter_us = jitter.as_micros() as u64,
            "frame pacer created"
        );

        Self {
            config,
            frame_duration,
            frame_count: 0,
            next_frame: now + frame_duration + jitter,
            last_frame: now,
            paused: false,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(frame_rate_hz))
    }

    /// Waits until the next frame is due.
    ///
    /// While paused this future never resolves; other `select!` branches
    /// keep running.
    pub async fn wait_for_frame(&mut self) -> FrameInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_frame;
        time::sleep_until(due).await;

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > self.frame_duration / 10;
        let mut skipped = 0u64;

        self.next_frame = match self.config.policy {
            FramePolicy::Skip => {
                if overrun {
                    skipped = (late_by.as_nanos() / self.frame_duration.as_nanos()) as u64;
                    if skipped > 0 {
                        warn!(
                            frame = self.frame_count,
                            skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "frame overrun, skipping ahead"
                        );
                    }
                }
                now + self.frame_duration
            }
            FramePolicy::Drop => {
                if overrun {
                    warn!(
                        frame = self.frame_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "frame overrun, keeping cadence"
                    );
                }
                due + self.frame_duration
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += skipped;
        self.metrics.total_frames += 1;

        trace!(frame = self.frame_count, ?dt, overrun, "frame");

        FrameInfo {
            frame: self.frame_count,
            dt,
            overrun,
            skipped,
        }
    }

    /// Stops frames until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(frame = self.frame_count, "frame pacer paused");
        }
    }

    /// Restarts frames one frame from now. Time spent paused is not
    /// reported in the next `dt`.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            let now = Instant::now();
            self.last_frame = now;
            self.next_frame = now + self.frame_duration;
            debug!(frame = self.frame_count, "frame pacer resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn frame_rate_hz(&self) -> u32 {
        self.config.frame_rate_hz
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }
}
