//! Volume envelope scheduling for fades around track boundaries
//!
//! A fade is a run of discrete volume-set steps. Step `i` fires at
//! `run_start + i * step_duration`; each step is delivered back to the
//! playback timeline as an [`EnvelopeStep`] carrying the generation of the
//! run that scheduled it. Starting or cancelling a run bumps the generation,
//! so steps from a superseded run are discarded when they arrive.
//!
//! # Fade-out
//!
//! Steps `0..steps`, volume `initial * curve.fade_out(i / steps)`. With the
//! quadratic curve and 5 steps from 1.0: `[1.0, 0.64, 0.36, 0.16, 0.04]`.
//! The step at `steps / 2` also fires the "preload next item" effect.
//!
//! # Fade-in
//!
//! Steps `0..=steps`, volume `target * curve.fade_in(i / steps)`. The
//! terminal step lands exactly on the target volume.

use crate::config::PlayerConfig;
use segue_common::FadeCurve;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    FadeOut,
    FadeIn,
}

impl std::fmt::Display for FadeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FadeDirection::FadeOut => write!(f, "fade-out"),
            FadeDirection::FadeIn => write!(f, "fade-in"),
        }
    }
}

/// Shape of one fade: direction, step count, reference volume and duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeRun {
    pub direction: FadeDirection,
    pub step_count: u32,
    /// Starting volume of a fade-out, target volume of a fade-in
    pub reference_volume: f32,
    pub total_duration: Duration,
    pub curve: FadeCurve,
}

/// One step of a planned run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedStep {
    pub index: u32,
    /// Delay from the run start
    pub offset: Duration,
    pub volume: f32,
    pub preload: bool,
}

impl EnvelopeRun {
    pub fn fade_out(
        step_count: u32,
        total_duration: Duration,
        initial_volume: f32,
        curve: FadeCurve,
    ) -> Self {
        Self {
            direction: FadeDirection::FadeOut,
            step_count: step_count.max(1),
            reference_volume: initial_volume,
            total_duration,
            curve,
        }
    }

    pub fn fade_in(
        step_count: u32,
        total_duration: Duration,
        target_volume: f32,
        curve: FadeCurve,
    ) -> Self {
        Self {
            direction: FadeDirection::FadeIn,
            step_count: step_count.max(1),
            reference_volume: target_volume,
            total_duration,
            curve,
        }
    }

    pub fn step_duration(&self) -> Duration {
        self.total_duration / self.step_count
    }

    /// Index of the final scheduled step
    pub fn last_step(&self) -> u32 {
        match self.direction {
            FadeDirection::FadeOut => self.step_count - 1,
            FadeDirection::FadeIn => self.step_count,
        }
    }

    pub fn offset(&self, index: u32) -> Duration {
        self.step_duration() * index
    }

    pub fn volume_at(&self, index: u32) -> f32 {
        let t = index as f32 / self.step_count as f32;
        match self.direction {
            FadeDirection::FadeOut => self.reference_volume * self.curve.calculate_fade_out(t),
            FadeDirection::FadeIn => self.reference_volume * self.curve.calculate_fade_in(t),
        }
    }

    /// Midpoint of a fade-out, where the next item starts preparing
    pub fn fires_preload(&self, index: u32) -> bool {
        self.direction == FadeDirection::FadeOut && index == self.step_count / 2
    }

    pub fn plan(&self) -> Vec<PlannedStep> {
        (0..=self.last_step())
            .map(|index| PlannedStep {
                index,
                offset: self.offset(index),
                volume: self.volume_at(index),
                preload: self.fires_preload(index),
            })
            .collect()
    }
}

/// Deferred step delivered back to the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeStep {
    pub direction: FadeDirection,
    pub generation: u64,
    pub index: u32,
}

/// What applying a live step asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEffect {
    pub volume: f32,
    /// Fire the "preload next item" side effect
    pub preload: bool,
    /// This was the run's final step
    pub completed: bool,
}

#[derive(Debug, Clone)]
struct ActiveRun {
    run: EnvelopeRun,
    generation: u64,
    preload_fired: bool,
}

/// Owns the in-flight fade runs: at most one fade-out and one fade-in
#[derive(Debug, Clone)]
pub struct EnvelopeScheduler {
    curve: FadeCurve,
    fade_out_steps: u32,
    fade_out_duration: Duration,
    fade_in_steps: u32,
    fade_in_duration: Duration,
    /// Output level outside of fades
    base_volume: f32,
    generation: u64,
    fade_out: Option<ActiveRun>,
    fade_in: Option<ActiveRun>,
}

impl EnvelopeScheduler {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            curve: config.fade_curve,
            fade_out_steps: config.fade_out_steps,
            fade_out_duration: config.fade_out_duration(),
            fade_in_steps: config.fade_in_steps,
            fade_in_duration: config.fade_in_duration(),
            base_volume: 1.0,
            generation: 0,
            fade_out: None,
            fade_in: None,
        }
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    pub fn set_base_volume(&mut self, volume: f32) {
        self.base_volume = volume.clamp(0.0, 1.0);
    }

    /// Start (or restart) the fade-out from `initial_volume`
    ///
    /// A fade-in still in flight is cancelled first; pass the output level it
    /// reached as `initial_volume`. Returns each step with its delay from
    /// now, for the timeline to schedule.
    pub fn start_fade_out(&mut self, initial_volume: f32) -> Vec<(Duration, EnvelopeStep)> {
        self.cancel_fade_in();
        let run = EnvelopeRun::fade_out(
            self.fade_out_steps,
            self.fade_out_duration,
            initial_volume,
            self.curve,
        );
        let generation = self.bump();
        self.fade_out = Some(ActiveRun {
            run,
            generation,
            preload_fired: false,
        });
        debug!("Starting {} run (generation {}, {} steps)", run.direction, generation, run.step_count);
        Self::schedule(&run, generation)
    }

    /// Start (or restart) the fade-in up to the base volume
    pub fn start_fade_in(&mut self) -> Vec<(Duration, EnvelopeStep)> {
        if self.fade_out.take().is_some() {
            debug!("Fade-in supersedes running fade-out");
        }
        let run = EnvelopeRun::fade_in(
            self.fade_in_steps,
            self.fade_in_duration,
            self.base_volume,
            self.curve,
        );
        let generation = self.bump();
        self.fade_in = Some(ActiveRun {
            run,
            generation,
            preload_fired: false,
        });
        debug!("Starting {} run (generation {}, {} steps)", run.direction, generation, run.step_count);
        Self::schedule(&run, generation)
    }

    /// Apply a delivered step; None if its run was superseded or cancelled
    pub fn apply(&mut self, step: EnvelopeStep) -> Option<StepEffect> {
        let slot = match step.direction {
            FadeDirection::FadeOut => &mut self.fade_out,
            FadeDirection::FadeIn => &mut self.fade_in,
        };

        let active = match slot.as_mut() {
            Some(active) if active.generation == step.generation => active,
            _ => {
                debug!(
                    "Discarding stale {} step {} (generation {})",
                    step.direction, step.index, step.generation
                );
                return None;
            }
        };

        let volume = active.run.volume_at(step.index);
        let preload = active.run.fires_preload(step.index) && !active.preload_fired;
        if preload {
            active.preload_fired = true;
        }
        let completed = step.index >= active.run.last_step();
        if completed {
            *slot = None;
        }

        Some(StepEffect {
            volume,
            preload,
            completed,
        })
    }

    /// Cancel every run; true if any was still in flight
    pub fn cancel_all(&mut self) -> bool {
        let was_active = self.is_active();
        self.fade_out = None;
        self.fade_in = None;
        self.bump();
        was_active
    }

    /// Drop the fade-in run so its pending steps are discarded; true if one was live
    pub fn cancel_fade_in(&mut self) -> bool {
        let Some(active) = self.fade_in.take() else {
            return false;
        };
        debug!(
            "Cancelling fade-in at generation {} (reference {})",
            active.generation, active.run.reference_volume
        );
        self.bump();
        true
    }

    pub fn is_active(&self) -> bool {
        self.fade_out.is_some() || self.fade_in.is_some()
    }

    pub fn is_fading_out(&self) -> bool {
        self.fade_out.is_some()
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn schedule(run: &EnvelopeRun, generation: u64) -> Vec<(Duration, EnvelopeStep)> {
        (0..=run.last_step())
            .map(|index| {
                (
                    run.offset(index),
                    EnvelopeStep {
                        direction: run.direction,
                        generation,
                        index,
                    },
                )
            })
            .collect()
    }
}
