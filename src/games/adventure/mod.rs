pub mod game;

pub use game::{GameSession, Outcome, Rules};

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::{error, info, info_span, Instrument};

use crate::core::engine::{GameLoop, LoopError, LoopStats};
use crate::core::input::KeySource;
use crate::core::registry::RegistryError;
use crate::core::renderer::GameRenderer;

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub name: String,
    pub target_fps: u32,
    pub update_rate: u32,
    pub max_catch_up: Option<u32>,
    pub show_title: bool,
    pub rules: Rules,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "ZeroStart Adventure".to_string(),
            target_fps: 30,
            update_rate: 60,
            max_catch_up: None,
            show_title: true,
            rules: Rules::default(),
        }
    }
}

/// Final state of a session that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub score: u32,
    pub elapsed: f64,
    pub outcome: Outcome,
    pub stats: LoopStats,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to set up the world")]
    Setup(#[from] RegistryError),

    #[error("invalid loop configuration")]
    Config(#[source] LoopError),

    #[error("failed to show the title screen")]
    Title(#[source] anyhow::Error),

    #[error("game loop failed with score {score}")]
    Run {
        score: u32,
        #[source]
        source: LoopError,
    },
}

impl SessionError {
    /// Score reached before the failure, when the loop had started.
    pub fn final_score(&self) -> Option<u32> {
        match self {
            SessionError::Run { score, .. } => Some(*score),
            _ => None,
        }
    }
}

/// Build the world, wire the session into a fixed-timestep loop and run it
/// until the player quits or an end condition fires.
pub async fn run_game<R, K>(config: &GameConfig, renderer: R, keys: K) -> Result<RunReport, SessionError>
where
    R: GameRenderer + 'static,
    K: KeySource + 'static,
{
    let span = info_span!("session", name = %config.name);
    run_session(config, renderer, keys).instrument(span).await
}

async fn run_session<R, K>(config: &GameConfig, mut renderer: R, mut keys: K) -> Result<RunReport, SessionError>
where
    R: GameRenderer + 'static,
    K: KeySource + 'static,
{
    let mut session = GameSession::new(config.name.clone(), config.rules);
    session.initialize()?;

    let mut game_loop = GameLoop::new(config.target_fps, config.update_rate)
        .map_err(SessionError::Config)?
        .with_max_catch_up(config.max_catch_up)
        .with_span(info_span!("game_loop"));
    session.attach_loop(game_loop.stop_handle());

    if config.show_title {
        renderer.show_title(session.name()).map_err(SessionError::Title)?;
        keys.wait_key().map_err(SessionError::Title)?;
    }

    let session = Rc::new(RefCell::new(session));

    let state = session.clone();
    game_loop.set_update_callback(move |delta| {
        state.borrow_mut().update(delta);
        Ok(())
    });

    let state = session.clone();
    game_loop.set_render_callback(move || renderer.render(&state.borrow().snapshot()));

    let state = session.clone();
    game_loop.set_input_callback(move || {
        if let Some(key) = keys.poll_key()? {
            state.borrow_mut().handle_key(key);
        }
        Ok(())
    });

    let result = game_loop.start().await;

    let session = session.borrow();
    match result {
        Ok(stats) => {
            let outcome = session.outcome().unwrap_or(Outcome::Interrupted);
            info!(score = session.score(), elapsed = session.elapsed(), ?outcome, "game ended");
            Ok(RunReport {
                score: session.score(),
                elapsed: session.elapsed(),
                outcome,
                stats,
            })
        }
        Err(source) => {
            error!(score = session.score(), error = %source, "game ended with an error");
            Err(SessionError::Run {
                score: session.score(),
                source,
            })
        }
    }
}
