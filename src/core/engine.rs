//! Fixed-timestep game loop.
//!
//! Every outer iteration runs, in order: input sampling, as many fixed-size
//! update ticks as the accumulated lag allows, one render, then a sleep that
//! paces the iteration toward the target frame rate.
//!
//! Cancellation is cooperative. [`StopHandle::stop`] only flips a flag that
//! is read at the top of the next iteration, so a callback that never returns
//! stalls the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument, Span};

/// Highest accepted rate; one tick (or frame) must last at least a nanosecond.
pub const MAX_RATE: u32 = 1_000_000_000;

/// Update callback, invoked with the fixed tick length in seconds.
pub type UpdateFn = Box<dyn FnMut(f64) -> anyhow::Result<()>>;
/// Render or input callback.
pub type FrameFn = Box<dyn FnMut() -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSlot {
    Update,
    Render,
    Input,
}

impl std::fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Update => "update",
            Self::Render => "render",
            Self::Input => "input",
        })
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("{name} must be between 1 and {max}, got {value}", max = MAX_RATE)]
    InvalidRate { name: &'static str, value: u32 },

    #[error("an update callback must be set before starting the game loop")]
    MissingUpdate,

    #[error("game loop already ran; create a new instance to run again")]
    AlreadyStopped,

    #[error("{slot} callback failed")]
    Callback {
        slot: CallbackSlot,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Counters reported when the loop exits cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub ticks: u64,
    pub dropped_ticks: u64,
}

/// Cloneable stop token. Safe to trigger from inside any callback.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!("game loop stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Lag accumulator that converts elapsed wall time into whole ticks.
#[derive(Debug, Clone)]
pub struct Accumulator {
    step: Duration,
    lag: Duration,
    max_steps: Option<u32>,
}

/// Outcome of feeding elapsed time into an [`Accumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Steps {
    pub run: u32,
    pub dropped: u64,
}

impl Accumulator {
    pub fn new(step: Duration, max_steps: Option<u32>) -> Self {
        Self {
            step: step.max(Duration::from_nanos(1)),
            lag: Duration::ZERO,
            max_steps,
        }
    }

    pub fn lag(&self) -> Duration {
        self.lag
    }

    /// Add `elapsed` to the lag and take out every whole step it now holds.
    ///
    /// With a step cap, whole steps past the cap are discarded and only the
    /// sub-step remainder is carried over.
    pub fn advance(&mut self, elapsed: Duration) -> Steps {
        self.lag += elapsed;

        let mut steps = Steps::default();
        while self.lag >= self.step {
            if self.max_steps.is_some_and(|max| steps.run >= max) {
                let step = self.step.as_nanos();
                let lag = self.lag.as_nanos();
                steps.dropped = (lag / step) as u64;
                self.lag = Duration::from_nanos((lag % step) as u64);
                break;
            }
            self.lag -= self.step;
            steps.run += 1;
        }
        steps
    }
}

pub struct GameLoop {
    target_fps: u32,
    update_rate: u32,
    frame_time: Duration,
    update_time: Duration,
    max_catch_up: Option<u32>,
    state: LoopState,
    stop: StopHandle,
    update: Option<UpdateFn>,
    render: Option<FrameFn>,
    input: Option<FrameFn>,
    span: Span,
}

impl GameLoop {
    pub fn new(target_fps: u32, update_rate: u32) -> Result<Self, LoopError> {
        if !(1..=MAX_RATE).contains(&target_fps) {
            return Err(LoopError::InvalidRate { name: "target_fps", value: target_fps });
        }
        if !(1..=MAX_RATE).contains(&update_rate) {
            return Err(LoopError::InvalidRate { name: "update_rate", value: update_rate });
        }

        info!(target_fps, update_rate, "game loop initialized");
        Ok(Self {
            target_fps,
            update_rate,
            frame_time: Duration::from_secs_f64(1.0 / f64::from(target_fps)),
            update_time: Duration::from_secs_f64(1.0 / f64::from(update_rate)),
            max_catch_up: None,
            state: LoopState::Idle,
            stop: StopHandle::default(),
            update: None,
            render: None,
            input: None,
            span: Span::none(),
        })
    }

    /// Cap the number of catch-up ticks per iteration.
    pub fn with_max_catch_up(mut self, max_ticks: Option<u32>) -> Self {
        self.max_catch_up = max_ticks.map(|max| max.max(1));
        self
    }

    /// Span the loop runs (and logs) under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn update_rate(&self) -> u32 {
        self.update_rate
    }

    /// Seconds per rendered frame.
    pub fn frame_time(&self) -> f64 {
        1.0 / f64::from(self.target_fps)
    }

    /// Seconds per update tick.
    pub fn update_time(&self) -> f64 {
        1.0 / f64::from(self.update_rate)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Request a stop at the next iteration boundary. Idempotent.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn set_update_callback(&mut self, callback: impl FnMut(f64) -> anyhow::Result<()> + 'static) {
        self.update = Some(Box::new(callback));
    }

    pub fn set_render_callback(&mut self, callback: impl FnMut() -> anyhow::Result<()> + 'static) {
        self.render = Some(Box::new(callback));
    }

    pub fn set_input_callback(&mut self, callback: impl FnMut() -> anyhow::Result<()> + 'static) {
        self.input = Some(Box::new(callback));
    }

    /// Run until a stop is requested or a callback fails.
    pub async fn start(&mut self) -> Result<LoopStats, LoopError> {
        if self.state != LoopState::Idle {
            return Err(LoopError::AlreadyStopped);
        }
        let update = self.update.take().ok_or(LoopError::MissingUpdate)?;

        let span = self.span.clone();
        self.state = LoopState::Running;
        let result = self.run(update).instrument(span).await;
        self.state = LoopState::Stopped;
        result
    }

    async fn run(&mut self, mut update: UpdateFn) -> Result<LoopStats, LoopError> {
        if self.render.is_none() {
            warn!("no render callback set");
        }

        info!(
            frame_ms = self.frame_time.as_secs_f64() * 1000.0,
            tick_ms = self.update_time.as_secs_f64() * 1000.0,
            max_catch_up = ?self.max_catch_up,
            "starting game loop"
        );

        let delta = self.update_time();
        let mut accumulator = Accumulator::new(self.update_time, self.max_catch_up);
        let mut stats = LoopStats::default();
        let mut last_time = Instant::now();

        while !self.stop.is_stopped() {
            let iteration_start = Instant::now();
            let elapsed = iteration_start.duration_since(last_time);
            last_time = iteration_start;

            if let Some(input) = self.input.as_mut() {
                input().map_err(|source| LoopError::Callback { slot: CallbackSlot::Input, source })?;
            }

            let steps = accumulator.advance(elapsed);
            for _ in 0..steps.run {
                update(delta).map_err(|source| LoopError::Callback { slot: CallbackSlot::Update, source })?;
            }
            stats.ticks += u64::from(steps.run);
            if steps.dropped > 0 {
                stats.dropped_ticks += steps.dropped;
                warn!(dropped = steps.dropped, ran = steps.run, "update fell behind; dropping ticks");
            }

            if let Some(render) = self.render.as_mut() {
                render().map_err(|source| LoopError::Callback { slot: CallbackSlot::Render, source })?;
            }

            stats.iterations += 1;

            if self.stop.is_stopped() {
                break;
            }
            let busy = iteration_start.elapsed();
            if let Some(remaining) = self.frame_time.checked_sub(busy) {
                if !remaining.is_zero() {
                    tokio::time::sleep(remaining).await;
                }
            } else {
                debug!(busy_ms = busy.as_secs_f64() * 1000.0, "frame over budget; not sleeping");
            }
        }

        info!(
            iterations = stats.iterations,
            ticks = stats.ticks,
            dropped_ticks = stats.dropped_ticks,
            "game loop stopped"
        );
        Ok(stats)
    }
}
