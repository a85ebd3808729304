use std::cell::RefCell;
use std::rc::Rc;

use zerostart::core::engine::{CallbackSlot, LoopError};
use zerostart::core::input::{NullKeys, ScriptedKeys};
use zerostart::core::renderer::Panels;
use zerostart::games::adventure::{Outcome, Rules};
use zerostart::{run_game, GameConfig, GameRenderer, SessionError, Snapshot};

/// Keeps the panel text of every frame so tests can look at it afterwards.
#[derive(Clone, Default)]
struct RecordingRenderer {
    frames: Rc<RefCell<Vec<Panels>>>,
    titles: Rc<RefCell<Vec<String>>>,
    fail_after: Option<usize>,
}

impl GameRenderer for RecordingRenderer {
    fn render(&mut self, snapshot: &Snapshot<'_>) -> anyhow::Result<()> {
        let mut frames = self.frames.borrow_mut();
        if self.fail_after.is_some_and(|limit| frames.len() >= limit) {
            anyhow::bail!("terminal went away");
        }
        frames.push(Panels::from_snapshot(snapshot));
        Ok(())
    }

    fn show_title(&mut self, title: &str) -> anyhow::Result<()> {
        self.titles.borrow_mut().push(title.to_string());
        Ok(())
    }
}

fn config(rules: Rules) -> GameConfig {
    GameConfig {
        show_title: false,
        rules,
        ..GameConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn quit_key_ends_the_session_in_the_same_iteration() {
    let renderer = RecordingRenderer::default();
    let frames = renderer.frames.clone();
    let keys = ScriptedKeys::new([None, Some('d'), None, None, Some('Q')]);

    let report = run_game(&config(Rules::default()), renderer, keys).await.unwrap();

    assert_eq!(report.outcome, Outcome::Quit);
    // The quit key was read on the fifth iteration, which still renders.
    assert_eq!(report.stats.iterations, 5);
    assert_eq!(frames.borrow().len(), 5);

    let last = frames.borrow().last().cloned().unwrap();
    assert_eq!(last.header, "ZeroStart Adventure");
    assert_eq!(last.footer, "WASD to move, Q to quit");
    assert!(last.main.iter().any(|line| line.starts_with("player player at (1")));
    assert!(last.sidebar.contains(&"Entities: 2".to_string()));
}

#[tokio::test(start_paused = true)]
async fn steering_into_the_obstacle_wins() {
    let keys = ScriptedKeys::new([Some('d'), Some('s')]);
    let rules = Rules {
        target_score: Some(10),
        time_limit: Some(10.0),
    };

    let report = run_game(&config(rules), RecordingRenderer::default(), keys).await.unwrap();

    assert_eq!(report.outcome, Outcome::Won);
    assert_eq!(report.score, 10);
    assert!(report.elapsed > 0.8 && report.elapsed < 1.2, "elapsed {}", report.elapsed);
}

#[tokio::test(start_paused = true)]
async fn time_limit_without_input() {
    let renderer = RecordingRenderer::default();
    let frames = renderer.frames.clone();
    let rules = Rules {
        target_score: None,
        time_limit: Some(0.5),
    };

    let report = run_game(&config(rules), renderer, NullKeys).await.unwrap();

    assert_eq!(report.outcome, Outcome::TimeUp);
    assert_eq!(report.score, 0);
    assert!(report.elapsed >= 0.5);
    // 60 updates per second over half a second of simulated time.
    assert!((30..=32).contains(&report.stats.ticks), "ticks {}", report.stats.ticks);

    let last = frames.borrow().last().cloned().unwrap();
    assert!(last.main.contains(&"player player at (10, 10)".to_string()));
    assert!(last.main.contains(&"obstacle obstacle at (15, 15)".to_string()));
}

#[tokio::test(start_paused = true)]
async fn title_screen_is_shown_first() {
    let renderer = RecordingRenderer::default();
    let titles = renderer.titles.clone();
    let game_config = GameConfig {
        show_title: true,
        ..config(Rules::default())
    };

    run_game(&game_config, renderer, ScriptedKeys::new([Some('q')])).await.unwrap();

    assert_eq!(*titles.borrow(), vec!["ZeroStart Adventure".to_string()]);
}

#[tokio::test]
async fn invalid_rates_fail_before_running() {
    let renderer = RecordingRenderer::default();
    let frames = renderer.frames.clone();
    let game_config = GameConfig {
        target_fps: 0,
        ..config(Rules::default())
    };

    let err = run_game(&game_config, renderer, NullKeys).await.unwrap_err();

    assert!(matches!(err, SessionError::Config(LoopError::InvalidRate { .. })));
    assert_eq!(err.final_score(), None);
    assert!(frames.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn renderer_failure_is_reported_with_the_score() {
    let renderer = RecordingRenderer {
        fail_after: Some(3),
        ..RecordingRenderer::default()
    };

    let err = run_game(&config(Rules::default()), renderer, NullKeys).await.unwrap_err();

    match &err {
        SessionError::Run {
            score,
            source: LoopError::Callback { slot, .. },
        } => {
            assert_eq!(*score, 0);
            assert_eq!(*slot, CallbackSlot::Render);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.final_score(), Some(0));
}
