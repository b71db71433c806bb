//! Session state machine
//!
//! `SessionState::next` is a pure transition function; `SessionController`
//! wraps it with the side effects (capture start/stop, physics, callbacks).
//!
//! ```text
//! Ready --start--> Running --target reached--> GameOver { won: true }
//!                     |
//!                     +------fell-----------> GameOver { won: false }
//! (any) --reset--> Ready
//! ```

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::{LevelReceiver, LevelSender, LoudnessSample, LoudnessSource, level_channel};
use crate::consts::LEVEL_CHANNEL_CAPACITY;
use crate::settings::Settings;
use crate::sim::{AnimationState, Rect, RunnerSimulation, TerrainGenerator, Viewport};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Idle: no physics, no capture
    Ready,
    /// Physics and capture active
    Running,
    /// Terminal until reset
    GameOver { won: bool },
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    /// One qualifying forward step
    Step,
    /// Avatar dropped below the fall threshold
    Fell,
    Reset,
}

/// Phase plus progress; the single source of truth for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub steps: u32,
    pub target: u32,
}

impl SessionState {
    pub fn new(target: u32) -> Self {
        Self {
            phase: SessionPhase::Ready,
            steps: 0,
            target: target.max(1),
        }
    }

    /// Pure transition
    ///
    /// Events that make no sense in the current phase leave the state as is.
    pub fn next(self, event: SessionEvent) -> Self {
        use SessionEvent as E;
        use SessionPhase as P;

        match (self.phase, event) {
            (_, E::Reset) => Self::new(self.target),
            (P::Ready, E::Start) => Self {
                phase: P::Running,
                ..self
            },
            (P::Running, E::Step) => {
                let steps = self.steps.saturating_add(1);
                let phase = if steps >= self.target {
                    P::GameOver { won: true }
                } else {
                    P::Running
                };
                Self {
                    phase,
                    steps,
                    ..self
                }
            }
            (P::Running, E::Fell) => Self {
                phase: P::GameOver { won: false },
                ..self
            },
            _ => self,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// `Some(won)` once the session has ended
    pub fn outcome(&self) -> Option<bool> {
        match self.phase {
            SessionPhase::GameOver { won } => Some(won),
            _ => None,
        }
    }
}

/// Read-only view for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub steps: u32,
    pub target: u32,
    pub avatar: Rect,
    pub animation: AnimationState,
    pub world_offset: f32,
    /// Tiles in scene space
    pub tiles: Vec<Rect>,
}

/// Called with the step count whenever it changes
pub type StepCallback = Box<dyn FnMut(u32)>;
/// Called exactly once per session with the outcome
pub type OutcomeCallback = Box<dyn FnMut(bool)>;

/// Owns one runner session and drives it frame by frame
pub struct SessionController<S: LoudnessSource, R = Pcg32> {
    settings: Settings,
    state: SessionState,
    sim: RunnerSimulation<R>,
    source: S,
    sender: LevelSender,
    receiver: LevelReceiver,
    /// Reused drain buffer
    pending: Vec<LoudnessSample>,
    reported_drops: u64,
    on_step_count: Option<StepCallback>,
    on_outcome: Option<OutcomeCallback>,
}

impl<S: LoudnessSource> SessionController<S, Pcg32> {
    /// New session with an unseeded bridge
    pub fn new(settings: Settings, source: S) -> Self {
        let settings = settings.validate();
        let terrain = TerrainGenerator::unseeded(settings.terrain_params(&Viewport::default()));
        Self::with_terrain(settings, source, terrain)
    }

    /// New session with a reproducible bridge
    pub fn seeded(settings: Settings, source: S, seed: u64) -> Self {
        let settings = settings.validate();
        let terrain =
            TerrainGenerator::seeded(settings.terrain_params(&Viewport::default()), seed);
        Self::with_terrain(settings, source, terrain)
    }
}

impl<S: LoudnessSource, R: Rng> SessionController<S, R> {
    pub fn with_terrain(settings: Settings, source: S, terrain: TerrainGenerator<R>) -> Self {
        let settings = settings.validate();
        let sim = RunnerSimulation::new(Viewport::default(), settings.runner_params(), terrain);
        let (sender, receiver) = level_channel(LEVEL_CHANNEL_CAPACITY);
        Self {
            state: SessionState::new(settings.target_steps),
            settings,
            sim,
            source,
            sender,
            receiver,
            pending: Vec::new(),
            reported_drops: 0,
            on_step_count: None,
            on_outcome: None,
        }
    }

    /// Register the step-count callback
    pub fn on_step_count(&mut self, f: impl FnMut(u32) + 'static) {
        self.on_step_count = Some(Box::new(f));
    }

    /// Register the terminal-outcome callback
    pub fn on_outcome(&mut self, f: impl FnMut(bool) + 'static) {
        self.on_outcome = Some(Box::new(f));
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn steps(&self) -> u32 {
        self.state.steps
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn simulation(&self) -> &RunnerSimulation<R> {
        &self.sim
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Producer handle for the current session's queue
    pub fn level_sender(&self) -> LevelSender {
        self.sender.clone()
    }

    /// Ready → Running; ignored in any other phase
    pub fn start(&mut self) {
        let prev = self.state;
        self.state = self.state.next(SessionEvent::Start);
        if self.state == prev {
            log::debug!("Start ignored in {:?}", prev.phase);
            return;
        }

        self.receiver.discard();
        self.sim.activate();
        self.source.start(self.sender.clone());
        log::info!("Session started (target {} steps)", self.state.target);

        if let Some(db) = self.settings.start_kick_db {
            self.handle_sample(LoudnessSample(db));
            self.settle(prev.steps, SessionPhase::Running);
        }
    }

    /// Advance one frame: drain queued loudness, then step physics
    pub fn tick(&mut self, dt: f32) -> SessionPhase {
        if !self.state.is_running() {
            // Late hand-offs from a stopped source
            self.receiver.discard();
            return self.state.phase;
        }
        self.report_drops();

        let steps_before = self.state.steps;
        self.pending.extend(self.receiver.drain());
        let pending = std::mem::take(&mut self.pending);
        for &sample in &pending {
            if !self.state.is_running() {
                break;
            }
            self.handle_sample(sample);
        }
        self.pending = pending;
        self.pending.clear();

        if self.settle(steps_before, SessionPhase::Running) {
            return self.state.phase;
        }

        let report = self.sim.advance(dt);
        if report.fell {
            self.state = self.state.next(SessionEvent::Fell);
            self.settle(self.state.steps, SessionPhase::Running);
        }
        self.state.phase
    }

    /// Discard everything and go back to Ready
    pub fn reset(&mut self) {
        self.source.stop();
        // Fresh queue: anything a stale producer still holds goes nowhere
        let (sender, receiver) = level_channel(LEVEL_CHANNEL_CAPACITY);
        self.sender = sender;
        self.receiver = receiver;
        self.reported_drops = 0;
        self.state = self.state.next(SessionEvent::Reset);
        self.sim.reset();
        log::info!("Session reset");
    }

    /// Teardown from the presentation layer: release capture, no outcome
    pub fn stop(&mut self) {
        self.reset();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let avatar = self.sim.avatar();
        SessionSnapshot {
            phase: self.state.phase,
            steps: self.state.steps,
            target: self.state.target,
            avatar: avatar.bounds(),
            animation: avatar.animation,
            world_offset: self.sim.world_offset(),
            tiles: self.sim.visible_tiles().collect(),
        }
    }

    /// Classify one sample and apply it; returns whether a step was taken
    fn handle_sample(&mut self, sample: LoudnessSample) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let tier = self.settings.breakpoints.classify(sample);
        if !self.sim.apply_tier(tier) {
            return false;
        }
        self.state = self.state.next(SessionEvent::Step);
        true
    }

    /// Fire callbacks for changes since `steps_before`/`phase_before`;
    /// returns true if the session just ended
    fn settle(&mut self, steps_before: u32, phase_before: SessionPhase) -> bool {
        if self.state.steps != steps_before {
            let steps = self.state.steps;
            if let Some(cb) = self.on_step_count.as_mut() {
                cb(steps);
            }
        }

        match (phase_before, self.state.phase) {
            (SessionPhase::Running, SessionPhase::GameOver { won }) => {
                self.finish(won);
                true
            }
            _ => false,
        }
    }

    fn finish(&mut self, won: bool) {
        self.source.stop();
        let discarded = self.receiver.discard();
        self.sim.freeze();
        if won {
            log::info!("Victory after {} steps", self.state.steps);
        } else {
            log::info!(
                "Fell after {} of {} steps",
                self.state.steps,
                self.state.target
            );
        }
        if discarded > 0 {
            log::debug!("Discarded {} queued samples", discarded);
        }
        if let Some(cb) = self.on_outcome.as_mut() {
            cb(won);
        }
    }

    fn report_drops(&mut self) {
        let dropped = self.receiver.dropped();
        if dropped > self.reported_drops {
            log::debug!(
                "Level queue full, {} samples dropped",
                dropped - self.reported_drops
            );
            self.reported_drops = dropped;
        }
    }
}

impl<S: LoudnessSource, R> Drop for SessionController<S, R> {
    fn drop(&mut self) {
        self.source.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::JumpImpulses;
    use crate::consts::SIM_DT;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records lifecycle calls; tests post samples through its sink
    #[derive(Default)]
    struct FakeSource {
        sink: Option<LevelSender>,
        starts: u32,
        stops: u32,
    }

    impl FakeSource {
        fn say(&self, db: f32) {
            if let Some(sink) = &self.sink {
                sink.send(LoudnessSample(db));
            }
        }
    }

    impl LoudnessSource for FakeSource {
        fn start(&mut self, sink: LevelSender) {
            self.sink = Some(sink);
            self.starts += 1;
        }

        fn stop(&mut self) {
            if self.sink.take().is_some() {
                self.stops += 1;
            }
        }

        fn is_active(&self) -> bool {
            self.sink.is_some()
        }
    }

    fn solid_settings() -> Settings {
        Settings {
            tile_probability: 1.0,
            ..Default::default()
        }
    }

    fn gaps_only_settings() -> Settings {
        Settings {
            tile_probability: 0.0,
            ..Default::default()
        }
    }

    fn record_outcomes(session: &mut SessionController<FakeSource>) -> Rc<RefCell<Vec<bool>>> {
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let sink = outcomes.clone();
        session.on_outcome(move |won| sink.borrow_mut().push(won));
        outcomes
    }

    #[test]
    fn test_pure_transitions() {
        let s = SessionState::new(3);
        assert_eq!(s.phase, SessionPhase::Ready);
        assert_eq!(s.next(SessionEvent::Step), s);
        assert_eq!(s.next(SessionEvent::Fell), s);

        let s = s.next(SessionEvent::Start);
        assert!(s.is_running());
        assert_eq!(s.next(SessionEvent::Start), s);

        let s = s.next(SessionEvent::Step).next(SessionEvent::Step);
        assert_eq!(s.steps, 2);
        assert!(s.is_running());
        let s = s.next(SessionEvent::Step);
        assert_eq!(s.outcome(), Some(true));

        // Terminal until reset
        assert_eq!(s.next(SessionEvent::Step), s);
        assert_eq!(s.next(SessionEvent::Fell), s);
        assert_eq!(s.next(SessionEvent::Start), s);

        let s = s.next(SessionEvent::Reset);
        assert_eq!(s, SessionState::new(3));
    }

    #[test]
    fn test_fall_transition() {
        let s = SessionState::new(10)
            .next(SessionEvent::Start)
            .next(SessionEvent::Step)
            .next(SessionEvent::Fell);
        assert_eq!(s.phase, SessionPhase::GameOver { won: false });
        assert_eq!(s.steps, 1);
    }

    #[test]
    fn test_start_begins_capture_once() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 1);
        assert!(!session.simulation().avatar().dynamic);
        session.start();
        session.start();
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.source().starts, 1);
        assert!(session.simulation().avatar().dynamic);
    }

    #[test]
    fn test_ready_session_ignores_ticks_and_samples() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 1);
        let sender = session.level_sender();
        sender.send(LoudnessSample(-5.0));
        assert_eq!(session.tick(SIM_DT), SessionPhase::Ready);
        session.start();
        session.tick(SIM_DT);
        assert_eq!(session.steps(), 0);
    }

    #[test]
    fn test_first_tick_without_sound_does_not_fall() {
        let mut session = SessionController::new(Settings::default(), FakeSource::default());
        session.start();
        assert_eq!(session.tick(SIM_DT), SessionPhase::Running);
    }

    #[test]
    fn test_victory_after_exactly_target_steps() {
        let settings = Settings {
            impulses: JumpImpulses {
                small: 0.0,
                medium: 0.0,
                large: 0.0,
            },
            ..solid_settings()
        };
        let mut session = SessionController::seeded(settings, FakeSource::default(), 3);
        let outcomes = record_outcomes(&mut session);
        let counts = Rc::new(RefCell::new(Vec::new()));
        let sink = counts.clone();
        session.on_step_count(move |n| sink.borrow_mut().push(n));

        session.start();
        for _ in 0..33 {
            for _ in 0..3 {
                session.source().say(-30.0);
            }
            assert_eq!(session.tick(SIM_DT), SessionPhase::Running);
        }
        assert_eq!(session.steps(), 99);

        session.source().say(-30.0);
        session.source().say(-30.0);
        assert_eq!(session.tick(SIM_DT), SessionPhase::GameOver { won: true });
        assert_eq!(session.steps(), 100);
        assert_eq!(*outcomes.borrow(), vec![true]);
        assert_eq!(counts.borrow().last(), Some(&100));
        assert_eq!(session.source().stops, 1);
        assert!(!session.source().is_active());

        // Nothing more happens once the session is over
        session.tick(SIM_DT);
        session.tick(SIM_DT);
        assert_eq!(outcomes.borrow().len(), 1);
    }

    #[test]
    fn test_quiet_samples_do_not_step() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 4);
        session.start();
        session.source().say(-45.0);
        session.source().say(-41.0);
        session.tick(SIM_DT);
        assert_eq!(session.steps(), 0);
        session.source().say(-39.0);
        session.tick(SIM_DT);
        assert_eq!(session.steps(), 1);
    }

    #[test]
    fn test_two_large_events_in_one_tick_do_not_stack() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 5);
        session.start();
        session.source().say(-5.0);
        session.source().say(-5.0);
        session.tick(SIM_DT);

        let settings = session.settings();
        let launch = settings.impulses.large / crate::consts::AVATAR_MASS;
        let expected = launch - crate::consts::GRAVITY * SIM_DT;
        assert!((session.simulation().avatar().vel.y - expected).abs() < 1e-2);
        assert_eq!(session.steps(), 2);
    }

    #[test]
    fn test_falling_ends_session_lost() {
        let mut session =
            SessionController::seeded(gaps_only_settings(), FakeSource::default(), 6);
        let outcomes = record_outcomes(&mut session);
        session.start();

        let mut phase = SessionPhase::Running;
        for _ in 0..3000 {
            if session.simulation().avatar().grounded {
                session.source().say(-30.0);
            }
            phase = session.tick(SIM_DT);
            if phase != SessionPhase::Running {
                break;
            }
        }
        assert_eq!(phase, SessionPhase::GameOver { won: false });
        assert_eq!(*outcomes.borrow(), vec![false]);
        assert!(session.steps() < session.state().target);
        assert_eq!(session.source().stops, 1);
    }

    #[test]
    fn test_reset_returns_to_ready() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 7);
        session.start();
        for _ in 0..5 {
            session.source().say(-15.0);
            session.tick(SIM_DT);
        }
        assert_eq!(session.steps(), 5);

        let stale = session.level_sender();
        session.reset();
        stale.send(LoudnessSample(-5.0));

        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.steps(), 0);
        assert!(!session.simulation().avatar().dynamic);
        assert!(!session.source().is_active());

        session.start();
        session.tick(SIM_DT);
        assert_eq!(session.steps(), 0);
        assert_eq!(session.source().starts, 2);
    }

    #[test]
    fn test_start_kick_counts_as_step() {
        let settings = Settings {
            start_kick_db: Some(-15.0),
            ..solid_settings()
        };
        let mut session = SessionController::seeded(settings, FakeSource::default(), 8);
        session.start();
        assert_eq!(session.steps(), 1);
        assert!(session.simulation().avatar().vel.y > 0.0);
    }

    #[test]
    fn test_start_kick_can_win_immediately() {
        let settings = Settings {
            start_kick_db: Some(-15.0),
            target_steps: 1,
            ..solid_settings()
        };
        let mut session = SessionController::seeded(settings, FakeSource::default(), 9);
        let outcomes = record_outcomes(&mut session);
        session.start();
        assert_eq!(session.phase(), SessionPhase::GameOver { won: true });
        assert_eq!(*outcomes.borrow(), vec![true]);
    }

    #[test]
    fn test_stop_releases_capture_without_outcome() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 10);
        let outcomes = record_outcomes(&mut session);
        session.start();
        session.stop();
        assert!(!session.source().is_active());
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(outcomes.borrow().is_empty());
    }

    #[test]
    fn test_snapshot_reflects_progress() {
        let mut session = SessionController::seeded(solid_settings(), FakeSource::default(), 11);
        session.start();
        session.source().say(-30.0);
        session.tick(SIM_DT);
        let snap = session.snapshot();
        assert_eq!(snap.steps, 1);
        assert_eq!(snap.target, 100);
        assert_eq!(snap.phase, SessionPhase::Running);
        assert_eq!(snap.animation, AnimationState::Running);
        assert!(!snap.tiles.is_empty());
        assert!(serde_json::to_string(&snap).is_ok());
    }
}
