use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use zerostart::cli::{Cli, RendererKind};
use zerostart::core::input::{CrosstermKeys, NullKeys};
use zerostart::core::terminal::{JsonRenderer, PlainRenderer, TerminalRenderer};
use zerostart::{games, logging};
use zerostart::{run_game, GameConfig, GameRenderer, RunReport, SessionError};

/// Restores cooked mode when the plain renderer reads raw keys.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        crossterm::terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

async fn play<R>(config: &GameConfig, renderer: R, interactive: bool) -> Result<RunReport, SessionError>
where
    R: GameRenderer + 'static,
{
    if interactive {
        run_game(config, renderer, CrosstermKeys::new()).await
    } else {
        if config.rules.target_score.is_none() && config.rules.time_limit.is_none() {
            warn!("no interactive input and no end condition; the game runs until interrupted");
        }
        let config = GameConfig {
            show_title: false,
            ..config.clone()
        };
        run_game(&config, renderer, NullKeys).await
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        println!("🎮 Available games:");
        for game in games::get_all_games() {
            println!("📦 {} ({}) by {}", game.name, game.id, game.author);
            println!("   {}", game.description);
        }
        return Ok(());
    }

    logging::init(cli.log_path().map(|p| p.as_path()))?;

    let config = cli.game_config();
    let interactive = cli.reads_keys(io::stdin().is_terminal());
    info!(renderer = ?cli.renderer, interactive, "starting {}", config.name);

    let result = match cli.renderer {
        RendererKind::Tui => {
            let terminal = ratatui::try_init().context("Failed to initialize terminal")?;
            let result = play(&config, TerminalRenderer::new(terminal), interactive).await;
            ratatui::restore();
            result
        }
        RendererKind::Plain if interactive => {
            let _raw = RawModeGuard::enable()?;
            play(&config, PlainRenderer::interactive(io::stdout()), true).await
        }
        RendererKind::Plain => play(&config, PlainRenderer::new(io::stdout()), false).await,
        RendererKind::Json => {
            let _raw = if interactive { Some(RawModeGuard::enable()?) } else { None };
            play(&config, JsonRenderer::new(io::stdout()), interactive).await
        }
    };

    // JSON frames own stdout; keep the status line out of the stream.
    let status = |line: String| {
        if cli.renderer == RendererKind::Json {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    };

    match result {
        Ok(report) => {
            info!(score = report.score, outcome = ?report.outcome, "game over");
            status(format!("Game Over! Final Score: {}", report.score));
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "game error");
            if let Some(score) = err.final_score() {
                status(format!("Game Over! Final Score: {score}"));
            }
            Err(anyhow::Error::new(err).context("game session failed"))
        }
    }
}
