//! Transition detection near the end of the current item
//!
//! Two independent edge-triggers report the same track boundary: the
//! periodic position poll handled here, and the engine's own end-of-media
//! callback. Both must pass through one [`TransitionGuard`] so that at most
//! one queue advance happens per boundary.

use super::engine::LoadToken;
use std::time::Duration;
use tracing::trace;

/// Compare-and-set latch around the boundary handoff
///
/// Keyed by the load token of the item that is ending: a boundary can be
/// claimed once per token, and never while another handoff is in flight.
#[derive(Debug, Default, Clone)]
pub struct TransitionGuard {
    handoff_in_flight: bool,
    /// Token whose boundary has already been claimed
    settled: Option<LoadToken>,
}

impl TransitionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the boundary of `token`; false if already claimed or busy
    pub fn try_begin(&mut self, token: LoadToken) -> bool {
        if self.handoff_in_flight || self.settled == Some(token) {
            return false;
        }
        self.handoff_in_flight = true;
        self.settled = Some(token);
        true
    }

    /// Handoff finished: next item loaded and playback (re)started
    pub fn finish(&mut self) {
        self.handoff_in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.handoff_in_flight
    }

    /// Whether the boundary of `token` can no longer be claimed
    pub fn blocks(&self, token: LoadToken) -> bool {
        self.handoff_in_flight || self.settled == Some(token)
    }

    /// Allow the boundary of the current item to be claimed again
    ///
    /// Used when playback of the same load jumps back (seek, replay).
    pub fn rearm(&mut self) {
        self.settled = None;
    }
}

/// One reading of the engine's position feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSample {
    pub elapsed: Duration,
    pub duration: Duration,
    pub token: LoadToken,
}

impl PositionSample {
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

/// What the controller should do after a position sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Nothing to do
    Idle,
    /// Remaining time entered the fade lead: start the fade-out run
    BeginFadeOut,
    /// Remaining time reached the dwell threshold: hand off
    Boundary,
}

/// Samples the position feed and decides when to fade out and hand off
#[derive(Debug, Clone)]
pub struct TransitionDetector {
    end_threshold: Duration,
    fade_lead: Duration,
    guard: TransitionGuard,
    /// Token whose fade-out has already been started
    fade_started: Option<LoadToken>,
    last_remaining: Option<Duration>,
}

impl TransitionDetector {
    /// `fade_lead` is the remaining time at which fade-out begins; it is
    /// never shorter than `end_threshold`.
    pub fn new(end_threshold: Duration, fade_lead: Duration) -> Self {
        Self {
            end_threshold,
            fade_lead: fade_lead.max(end_threshold),
            guard: TransitionGuard::new(),
            fade_started: None,
            last_remaining: None,
        }
    }

    /// Evaluate one position sample
    ///
    /// Does not claim the guard; the caller routes `Boundary` through the
    /// same guarded path as the engine's end-of-media callback.
    pub fn on_sample(&mut self, sample: PositionSample) -> Detection {
        if sample.duration.is_zero() {
            return Detection::Idle;
        }

        let remaining = sample.remaining();
        self.last_remaining = Some(remaining);
        trace!("Position sample {:?} remaining for {}", remaining, sample.token);

        if self.guard.blocks(sample.token) {
            return Detection::Idle;
        }

        if remaining <= self.end_threshold {
            return Detection::Boundary;
        }

        if remaining <= self.fade_lead && self.fade_started != Some(sample.token) {
            self.fade_started = Some(sample.token);
            return Detection::BeginFadeOut;
        }

        Detection::Idle
    }

    /// Forget boundary and fade latches for the current load
    pub fn rearm(&mut self) {
        self.guard.rearm();
        self.fade_started = None;
        self.last_remaining = None;
    }

    pub fn guard(&self) -> &TransitionGuard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut TransitionGuard {
        &mut self.guard
    }

    pub fn last_remaining(&self) -> Option<Duration> {
        self.last_remaining
    }

    pub fn end_threshold(&self) -> Duration {
        self.end_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(elapsed_ms: u64, duration_ms: u64, token: u64) -> PositionSample {
        PositionSample {
            elapsed: Duration::from_millis(elapsed_ms),
            duration: Duration::from_millis(duration_ms),
            token: LoadToken::new(token),
        }
    }

    fn detector() -> TransitionDetector {
        TransitionDetector::new(Duration::from_millis(100), Duration::from_millis(300))
    }

    #[test]
    fn test_guard_claims_once_per_token() {
        let mut guard = TransitionGuard::new();
        let token = LoadToken::new(1);

        assert!(guard.try_begin(token));
        assert!(guard.is_in_flight());
        assert!(!guard.try_begin(token));

        guard.finish();
        assert!(!guard.try_begin(token));
        assert!(guard.try_begin(token.next()));
    }

    #[test]
    fn test_guard_blocks_other_tokens_while_in_flight() {
        let mut guard = TransitionGuard::new();
        assert!(guard.try_begin(LoadToken::new(1)));
        assert!(!guard.try_begin(LoadToken::new(2)));
    }

    #[test]
    fn test_guard_rearm() {
        let mut guard = TransitionGuard::new();
        let token = LoadToken::new(3);
        assert!(guard.try_begin(token));
        guard.finish();
        guard.rearm();
        assert!(guard.try_begin(token));
    }

    #[test]
    fn test_far_from_end_is_idle() {
        let mut detector = detector();
        assert_eq!(detector.on_sample(sample(1_000, 10_000, 1)), Detection::Idle);
        assert_eq!(detector.last_remaining(), Some(Duration::from_millis(9_000)));
    }

    #[test]
    fn test_fade_out_starts_once_per_token() {
        let mut detector = detector();
        assert_eq!(
            detector.on_sample(sample(9_750, 10_000, 1)),
            Detection::BeginFadeOut
        );
        assert_eq!(detector.on_sample(sample(9_800, 10_000, 1)), Detection::Idle);
        assert_eq!(
            detector.on_sample(sample(9_750, 10_000, 2)),
            Detection::BeginFadeOut
        );
    }

    #[test]
    fn test_boundary_at_threshold() {
        let mut detector = detector();
        assert_eq!(
            detector.on_sample(sample(9_900, 10_000, 1)),
            Detection::Boundary
        );
        // Past the end counts as zero remaining
        assert_eq!(
            detector.on_sample(sample(10_500, 10_000, 1)),
            Detection::Boundary
        );
    }

    #[test]
    fn test_claimed_boundary_is_not_reported_again() {
        let mut detector = detector();
        let token = LoadToken::new(1);
        assert_eq!(detector.on_sample(sample(9_950, 10_000, 1)), Detection::Boundary);

        assert!(detector.guard_mut().try_begin(token));
        detector.guard_mut().finish();

        assert_eq!(detector.on_sample(sample(9_990, 10_000, 1)), Detection::Idle);
    }

    #[test]
    fn test_unknown_duration_is_ignored() {
        let mut detector = detector();
        assert_eq!(detector.on_sample(sample(0, 0, 1)), Detection::Idle);
        assert_eq!(detector.last_remaining(), None);
    }

    #[test]
    fn test_fade_lead_never_below_threshold() {
        let mut detector =
            TransitionDetector::new(Duration::from_millis(100), Duration::from_millis(10));
        assert_eq!(detector.on_sample(sample(950, 1_000, 1)), Detection::Boundary);
    }
}
