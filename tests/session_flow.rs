//! End-to-end sessions driven through the cross-thread loudness hand-off

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use voice_runner::consts::SIM_DT;
use voice_runner::session::SessionPhase;
use voice_runner::{LoudnessSource, ScriptedVoice, SessionController, Settings};

/// Tick until the session leaves Running or the frame budget runs out
fn run_until_done(session: &mut SessionController<ScriptedVoice>, max_frames: usize) -> SessionPhase {
    for _ in 0..max_frames {
        let phase = session.tick(SIM_DT);
        if phase != SessionPhase::Running {
            return phase;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    session.phase()
}

#[test]
fn test_scripted_voice_crosses_solid_bridge() {
    let settings = Settings {
        tile_probability: 1.0,
        target_steps: 20,
        ..Default::default()
    };
    let voice = ScriptedVoice::new(vec![-30.0, -15.0], Duration::from_millis(2));
    let mut session = SessionController::seeded(settings, voice, 42);

    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let sink = outcomes.clone();
    session.on_outcome(move |won| sink.borrow_mut().push(won));

    session.start();
    let phase = run_until_done(&mut session, 5000);

    assert_eq!(phase, SessionPhase::GameOver { won: true });
    assert_eq!(session.steps(), 20);
    assert_eq!(*outcomes.borrow(), vec![true]);
    assert!(session.simulation().is_scrolling());
}

#[test]
fn test_scripted_voice_falls_through_gaps() {
    let settings = Settings {
        tile_probability: 0.0,
        ..Default::default()
    };
    // One burst of small hops carries the avatar past the end of the bridge
    let voice = ScriptedVoice::new(vec![-35.0; 30], Duration::ZERO).once();
    let mut session = SessionController::seeded(settings, voice, 7);
    session.start();

    let phase = run_until_done(&mut session, 20_000);
    assert_eq!(phase, SessionPhase::GameOver { won: false });
    assert!(session.steps() < 100);
}

#[test]
fn test_silence_keeps_runner_standing() {
    let voice = ScriptedVoice::new(vec![-80.0, -55.0, -45.0], Duration::from_millis(1));
    let mut session = SessionController::seeded(Settings::default(), voice, 3);
    session.start();

    for _ in 0..120 {
        assert_eq!(session.tick(SIM_DT), SessionPhase::Running);
    }
    assert_eq!(session.steps(), 0);
    assert!(session.simulation().avatar().grounded);

    session.reset();
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(!session.source().is_active());
}

#[test]
fn test_snapshot_serializes_for_display() {
    let mut session = SessionController::seeded(
        Settings::default(),
        ScriptedVoice::new(Vec::new(), Duration::ZERO),
        1,
    );
    session.start();
    session.tick(SIM_DT);

    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["steps"], 0);
    assert_eq!(json["target"], 100);
    assert!(json["tiles"].as_array().is_some_and(|t| !t.is_empty()));
}
