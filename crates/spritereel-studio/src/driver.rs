//! Drives a controlled recording in real time: one render+capture per
//! tick at the capture frame rate until the planned length is reached.

use std::time::Duration;

use spritereel_core::{ReelError, ReelResult};
use tokio::time::{Instant, MissedTickBehavior};

use crate::session::Still;
use crate::studio::Studio;

/// What to do during an unattended recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlan {
    pub length: Duration,
    /// Advance to the next sprite (wrapping) this often.
    pub cycle_every: Option<Duration>,
    /// Take a still at each of these offsets.
    pub snapshots_at: Vec<Duration>,
}

impl RecordingPlan {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            ..Default::default()
        }
    }

    pub fn cycle_every(mut self, every: Duration) -> Self {
        self.cycle_every = Some(every).filter(|d| !d.is_zero());
        self
    }

    pub fn snapshot_at(mut self, at: Duration) -> Self {
        self.snapshots_at.push(at);
        self
    }
}

#[derive(Debug)]
pub struct RecordingReport {
    pub ticks: u64,
    pub stills: Vec<Still>,
    pub elapsed_label: String,
}

pub fn tick_period(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

/// Run `plan` against `studio`, leaving the finished artifact in its
/// session.
pub async fn run_recording(studio: &mut Studio, plan: &RecordingPlan) -> ReelResult<RecordingReport> {
    if !studio.start_recording()? {
        return Err(ReelError::InvalidArgument(
            "no sprites loaded, nothing to record".into(),
        ));
    }

    let mut snapshots = plan.snapshots_at.clone();
    snapshots.sort();
    let mut snapshots = snapshots.into_iter().peekable();
    let mut next_cycle = plan.cycle_every;
    let mut stills = Vec::new();
    let mut ticks = 0u64;

    let mut interval = tokio::time::interval(tick_period(studio.fps()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    // The first tick completes immediately; the start frame is already in.
    interval.tick().await;

    loop {
        interval.tick().await;
        let elapsed = started.elapsed();
        if elapsed >= plan.length || !studio.session().is_active() {
            break;
        }

        if let (Some(due), Some(every)) = (next_cycle, plan.cycle_every) {
            if elapsed >= due {
                if !studio.next() {
                    if let Some(first) = studio.sprites().at(0).map(|s| s.id()) {
                        studio.select(first);
                    }
                }
                next_cycle = Some(due + every);
            }
        }

        if let Err(e) = studio.tick() {
            tracing::error!("recording aborted: {}", e);
            return Err(e);
        }
        ticks += 1;

        while snapshots.next_if(|at| elapsed >= *at).is_some() {
            if let Some(still) = studio.snapshot()? {
                tracing::info!("captured {} at {:?}", still.file_name, elapsed);
                stills.push(still);
            }
        }
    }

    studio.stop_recording()?;
    let elapsed_label = studio.session().duration_label();
    Ok(RecordingReport {
        ticks,
        stills,
        elapsed_label,
    })
}
