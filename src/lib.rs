pub mod cli;
pub mod core;
pub mod games;
pub mod logging;

// Re-export for convenience
pub use crate::core::engine::{GameLoop, LoopError, StopHandle};
pub use crate::core::registry::{Entity, EntityId, EntityRegistry};
pub use crate::core::renderer::{GameRenderer, Snapshot};
pub use crate::games::adventure::{run_game, GameConfig, RunReport, SessionError};
