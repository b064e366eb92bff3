use crate::{
    config::{MAX_SPEED, PlaybackConfig},
    foundation::core::{Millis, clamp01},
    model::Document,
};

/// Slack for the frame throttle, so ticks spaced exactly one frame apart
/// are not dropped to float rounding.
const FRAME_EPSILON_MS: Millis = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Idle,
    Running,
    Paused,
}

/// Snapshot handed to consumers after every emitted tick.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatorState {
    pub idx: usize,
    pub t01: f64,
    pub step_elapsed_ms: Millis,
    pub playing: bool,
    pub paused: bool,
    pub speed: f64,
    pub finished: bool,
}

/// Step-by-step playback clock driven by externally supplied timestamps.
///
/// The animator never reads a clock itself: the host calls [`tick`](Self::tick)
/// with monotonic milliseconds (a frame callback, a test loop, ...). Time spent
/// paused is not counted, and a tick that spans several steps carries the
/// overflow into the following steps. Reaching the end of the last step stops
/// playback with `t01 == 1`.
#[derive(Clone, Debug)]
pub struct Animator {
    durations: Vec<Millis>,
    idx: usize,
    local_ms: Millis, // scaled elapsed time within the current step
    last_now: Option<Millis>,
    last_emit: Option<Millis>,
    frame_ms: Option<Millis>,
    speed: f64,
    paused: bool,
    autoplay: bool,
    finished: bool,
}

impl Animator {
    /// Durations are per step, in ms. Negative or non-finite values count as `0`.
    pub fn new(durations: Vec<Millis>) -> Self {
        let durations = durations
            .into_iter()
            .map(|d| if d.is_finite() { d.max(0.0) } else { 0.0 })
            .collect();
        Self {
            durations,
            idx: 0,
            local_ms: 0.0,
            last_now: None,
            last_emit: None,
            frame_ms: None,
            speed: 1.0,
            paused: false,
            autoplay: true,
            finished: false,
        }
    }

    pub fn for_document(doc: &Document, cfg: &PlaybackConfig) -> Self {
        let durations = doc
            .steps
            .iter()
            .map(|s| cfg.duration_for(&s.id))
            .collect();
        let mut out = Self::new(durations).with_autoplay(cfg.autoplay);
        out.set_speed(cfg.speed);
        if let Some(fps) = cfg.fps {
            out = out.with_frame_rate(fps);
        }
        out
    }

    /// Limits emitted snapshots to one per `1000 / fps` ms. Time still advances
    /// on throttled ticks.
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_ms = (fps.is_finite() && fps > 0.0).then(|| 1000.0 / fps);
        self
    }

    /// With autoplay off the first tick leaves the animator paused.
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self.paused = !autoplay;
        self
    }

    pub fn step_count(&self) -> usize {
        self.durations.len()
    }

    pub fn durations(&self) -> &[Millis] {
        &self.durations
    }

    pub fn total_ms(&self) -> Millis {
        self.durations.iter().sum()
    }

    pub fn play_state(&self) -> PlayState {
        match (self.last_now, self.paused) {
            (None, _) => PlayState::Idle,
            (Some(_), true) => PlayState::Paused,
            (Some(_), false) => PlayState::Running,
        }
    }

    /// Advances the clock to `now_ms` and returns a snapshot, or `None` when
    /// the frame-rate throttle drops this tick.
    pub fn tick(&mut self, now_ms: Millis) -> Option<AnimatorState> {
        let now = if now_ms.is_finite() { now_ms } else { 0.0 };
        let Some(last) = self.last_now else {
            self.last_now = Some(now);
            tracing::debug!(steps = self.durations.len(), "playback started");
            return self.emit(now);
        };

        // Timestamps that go backwards count as no elapsed time.
        let dt = (now - last).max(0.0);
        self.last_now = Some(now.max(last));
        if self.is_playing() {
            self.advance(dt * self.speed);
        }
        self.emit(now)
    }

    pub fn play(&mut self) {
        if self.finished {
            self.idx = 0;
            self.local_ms = 0.0;
            self.finished = false;
        }
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Flips pause; returns whether the animator is now paused.
    pub fn toggle(&mut self) -> bool {
        if self.paused {
            self.play();
        } else {
            self.pause();
        }
        self.paused
    }

    /// Clamped to `[0, 4]`; NaN becomes `0`.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_nan() {
            0.0
        } else {
            speed.clamp(0.0, MAX_SPEED)
        };
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Jumps to step `idx` (clamped) with progress `0`.
    pub fn goto(&mut self, idx: usize) {
        self.idx = idx.min(self.durations.len().saturating_sub(1));
        self.local_ms = 0.0;
        self.finished = false;
    }

    pub fn next(&mut self) {
        self.goto(self.idx.saturating_add(1));
    }

    pub fn prev(&mut self) {
        self.goto(self.idx.saturating_sub(1));
    }

    /// Back to step 0 and to the idle state; the next tick restarts the clock.
    pub fn reset(&mut self) {
        self.goto(0);
        self.last_now = None;
        self.last_emit = None;
        self.paused = !self.autoplay;
    }

    pub fn state(&self) -> AnimatorState {
        let t01 = match self.durations.get(self.idx) {
            Some(&d) if d > 0.0 => clamp01(self.local_ms / d),
            Some(_) => 1.0,
            None => 0.0,
        };
        AnimatorState {
            idx: self.idx,
            t01,
            step_elapsed_ms: self.local_ms,
            playing: self.is_playing(),
            paused: self.paused,
            speed: self.speed,
            finished: self.finished,
        }
    }

    fn is_playing(&self) -> bool {
        !self.paused && !self.finished && !self.durations.is_empty()
    }

    fn advance(&mut self, delta: Millis) {
        self.local_ms += delta;
        while let Some(&dur) = self.durations.get(self.idx) {
            if self.local_ms < dur {
                break;
            }
            if self.idx + 1 < self.durations.len() {
                self.local_ms -= dur;
                self.idx += 1;
                tracing::trace!(idx = self.idx, "step advanced");
            } else {
                self.local_ms = dur;
                self.finished = true;
                tracing::debug!(idx = self.idx, "playback finished");
                break;
            }
        }
    }

    fn emit(&mut self, now: Millis) -> Option<AnimatorState> {
        if let (Some(frame_ms), Some(prev)) = (self.frame_ms, self.last_emit)
            && now - prev + FRAME_EPSILON_MS < frame_ms
        {
            return None;
        }
        self.last_emit = Some(now);
        Some(self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn started(durations: Vec<f64>) -> Animator {
        let mut a = Animator::new(durations);
        a.tick(0.0);
        a
    }

    #[test]
    fn first_tick_starts_at_zero_progress() {
        let mut a = Animator::new(vec![100.0, 100.0]);
        assert_eq!(a.play_state(), PlayState::Idle);
        let s = a.tick(5_000.0).unwrap();
        assert_eq!((s.idx, s.t01, s.playing), (0, 0.0, true));
        assert_eq!(a.play_state(), PlayState::Running);
    }

    #[test]
    fn progression_is_monotonic_and_carries_overflow() {
        let d = 200.0;
        for k in 0..4usize {
            let mut a = started(vec![d; 4]);
            let s = a.tick(k as f64 * d + 50.0).unwrap();
            assert_eq!(s.idx, k);
            assert!(approx(s.t01, 0.25), "k={k} t01={}", s.t01);
        }

        let mut a = started(vec![d; 4]);
        let mut prev = (0usize, 0.0f64);
        for i in 1..=100 {
            let s = a.tick(i as f64 * 7.3).unwrap();
            assert!((s.idx, s.t01) >= prev, "went backwards at tick {i}");
            prev = (s.idx, s.t01);
        }
    }

    #[test]
    fn stops_at_last_step() {
        let mut a = started(vec![100.0, 100.0, 100.0]);
        let s = a.tick(10_000.0).unwrap();
        assert_eq!(s.idx, 2);
        assert_eq!(s.t01, 1.0);
        assert!(!s.playing);
        assert!(s.finished);

        a.play();
        let s = a.state();
        assert_eq!((s.idx, s.t01, s.playing), (0, 0.0, true));
    }

    #[test]
    fn pause_resume_is_idempotent_and_paused_time_is_skipped() {
        let mut a = started(vec![100.0, 100.0]);
        let before = a.tick(30.0).unwrap();
        a.pause();
        a.play();
        assert_eq!(a.state().idx, before.idx);
        assert_eq!(a.state().t01, before.t01);

        a.pause();
        let held = a.tick(5_000.0).unwrap();
        assert!(held.paused && !held.playing);
        assert_eq!(held.t01, before.t01);
        assert_eq!(a.play_state(), PlayState::Paused);

        a.play();
        let s = a.tick(5_020.0).unwrap();
        assert_eq!(s.idx, 0);
        assert!(approx(s.t01, 0.5));
    }

    #[test]
    fn speed_is_clamped() {
        let mut a = Animator::new(vec![100.0]);
        for (input, want) in [(7.0, 4.0), (-1.0, 0.0), (f64::NAN, 0.0), (2.5, 2.5)] {
            a.set_speed(input);
            assert_eq!(a.speed(), want);
        }
    }

    #[test]
    fn speed_scales_elapsed_time() {
        let mut a = started(vec![100.0, 100.0]);
        a.set_speed(2.0);
        let s = a.tick(75.0).unwrap();
        assert_eq!(s.idx, 1);
        assert!(approx(s.t01, 0.5));

        a.set_speed(0.0);
        let s = a.tick(1_000.0).unwrap();
        assert!(approx(s.t01, 0.5));
        assert!(s.playing);
    }

    #[test]
    fn goto_clamps_and_resets_progress() {
        let mut a = started(vec![100.0; 3]);
        a.tick(50.0);
        a.goto(99);
        assert_eq!((a.state().idx, a.state().t01), (2, 0.0));
        a.prev();
        assert_eq!(a.state().idx, 1);
        a.next();
        a.next();
        assert_eq!(a.state().idx, 2);
        a.goto(0);
        a.prev();
        assert_eq!(a.state().idx, 0);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut a = started(vec![100.0; 2]);
        a.tick(150.0);
        a.reset();
        assert_eq!(a.play_state(), PlayState::Idle);
        let s = a.tick(9_000.0).unwrap();
        assert_eq!((s.idx, s.t01), (0, 0.0));
    }

    #[test]
    fn empty_document_never_plays() {
        let mut a = Animator::new(vec![]);
        let s = a.tick(0.0).unwrap();
        assert!(!s.playing);
        let s = a.tick(1_000.0).unwrap();
        assert_eq!((s.idx, s.t01, s.playing), (0, 0.0, false));
        a.goto(3);
        assert_eq!(a.state().idx, 0);
    }

    #[test]
    fn zero_duration_steps_are_skipped() {
        let mut a = started(vec![0.0, 0.0, 100.0]);
        let s = a.tick(10.0).unwrap();
        assert_eq!(s.idx, 2);
        assert!(approx(s.t01, 0.1));
    }

    #[test]
    fn backwards_timestamps_count_as_zero() {
        let mut a = started(vec![100.0]);
        a.tick(40.0);
        let s = a.tick(10.0).unwrap();
        assert!(approx(s.t01, 0.4));
        let s = a.tick(50.0).unwrap();
        assert!(approx(s.t01, 0.5));
    }

    #[test]
    fn frame_rate_throttles_snapshots_not_time() {
        let mut a = Animator::new(vec![1_000.0]).with_frame_rate(10.0);
        assert!(a.tick(0.0).is_some());
        assert!(a.tick(50.0).is_none());
        let s = a.tick(100.0).unwrap();
        assert!(approx(s.step_elapsed_ms, 100.0));
    }

    #[test]
    fn ticks_one_frame_apart_are_never_throttled() {
        let frame = 1000.0 / 60.0;
        let mut a = Animator::new(vec![10_000.0]).with_frame_rate(60.0);
        let mut now = 0.0;
        let mut dropped = 0;
        for _ in 0..300 {
            if a.tick(now).is_none() {
                dropped += 1;
            }
            now += frame;
        }
        assert_eq!(dropped, 0);
    }

    #[test]
    fn autoplay_off_waits_for_play() {
        let mut a = Animator::new(vec![100.0]).with_autoplay(false);
        a.tick(0.0);
        let s = a.tick(50.0).unwrap();
        assert!(s.paused);
        assert_eq!(s.t01, 0.0);
        assert!(!a.toggle());
        let s = a.tick(100.0).unwrap();
        assert!(approx(s.t01, 0.5));
    }

    #[test]
    fn for_document_uses_config_durations() {
        let doc = Document {
            steps: vec![
                crate::model::Step::new("s1", "a"),
                crate::model::Step::new("s2", "b"),
            ],
            ..Document::default()
        };
        let mut cfg = PlaybackConfig::default();
        cfg.step_ms.insert("s2".into(), 300.0);
        cfg.speed = 9.0;
        let a = Animator::for_document(&doc, &cfg);
        assert_eq!(a.durations(), &[900.0, 300.0]);
        assert_eq!(a.speed(), 4.0);
        assert_eq!(a.total_ms(), 1_200.0);
    }
}
