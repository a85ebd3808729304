use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::core::engine::MAX_RATE;
use crate::games::adventure::{GameConfig, Rules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Full-screen terminal UI
    Tui,
    /// Plain text frames
    Plain,
    /// One JSON snapshot per frame
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "zerostart")]
#[command(about = "🕹️ Fixed-timestep terminal game sample")]
#[command(version)]
pub struct Cli {
    /// Target frames per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RATE)))]
    pub fps: u32,

    /// Fixed logic updates per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RATE)))]
    pub ups: u32,

    /// Maximum catch-up updates per frame (unlimited if not set)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_catch_up: Option<u32>,

    /// How frames are drawn
    #[arg(short, long, value_enum, default_value_t = RendererKind::Tui)]
    pub renderer: RendererKind,

    /// Game title
    #[arg(short, long, default_value = "ZeroStart Adventure")]
    pub name: String,

    /// Start playing immediately
    #[arg(long)]
    pub skip_title: bool,

    /// End the game once this score is reached
    #[arg(long)]
    pub target_score: Option<u32>,

    /// End the game after this many simulated seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Log file path, or "-" for stderr
    #[arg(long, default_value = "logs/game.log")]
    pub log_file: PathBuf,

    /// List available games and exit
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            name: self.name.clone(),
            target_fps: self.fps,
            update_rate: self.ups,
            max_catch_up: self.max_catch_up,
            show_title: !self.skip_title,
            rules: Rules {
                target_score: self.target_score,
                time_limit: self.time_limit,
            },
        }
    }

    /// Whether keys are read from the terminal. The TUI owns the controlling
    /// tty even when stdin is redirected, so it always reads keys.
    pub fn reads_keys(&self, stdin_is_terminal: bool) -> bool {
        self.renderer == RendererKind::Tui || stdin_is_terminal
    }

    /// `None` when logs should go to stderr.
    pub fn log_path(&self) -> Option<&PathBuf> {
        (self.log_file.as_os_str() != "-").then_some(&self.log_file)
    }
}
