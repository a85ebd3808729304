//! Renderer interface and the snapshot it consumes.

use serde::Serialize;

use crate::core::component::{Position, Render};
use crate::core::registry::Entity;

pub const NO_ENTITIES: &str = "No entities";
pub const NO_STATS: &str = "No stats";
pub const DEFAULT_TITLE: &str = "Game";

/// Read-only view of the session handed to the renderer each frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot<'a> {
    pub title: Option<String>,
    pub entities: Vec<&'a Entity>,
    pub stats: Vec<(String, String)>,
    pub message: Option<String>,
}

/// Fixed rendering interface. Implementations are picked at compile time.
pub trait GameRenderer {
    /// Draw one frame. Missing snapshot fields degrade to placeholders.
    fn render(&mut self, snapshot: &Snapshot<'_>) -> anyhow::Result<()>;

    /// Draw the title screen shown before the loop starts.
    fn show_title(&mut self, _title: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Entities that should appear on screen: visible, positioned, ordered by
/// `z_index` (stable).
pub fn drawable<'a>(snapshot: &Snapshot<'a>) -> Vec<(&'a Entity, &'a Position)> {
    let mut drawable: Vec<(&'a Entity, &'a Position)> = snapshot
        .entities
        .iter()
        .copied()
        .filter(|entity| entity.get::<Render>().map_or(true, |render| render.visible))
        .filter_map(|entity| entity.get::<Position>().map(|pos| (entity, pos)))
        .collect();
    drawable.sort_by_key(|(entity, _)| entity.get::<Render>().map_or(0, |render| render.z_index));
    drawable
}

/// Text for each screen region, with placeholders already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panels {
    pub header: String,
    pub main: Vec<String>,
    pub sidebar: Vec<String>,
    pub footer: String,
}

impl Panels {
    pub fn from_snapshot(snapshot: &Snapshot<'_>) -> Self {
        let header = snapshot
            .title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let mut main: Vec<String> = drawable(snapshot)
            .into_iter()
            .map(|(entity, pos)| {
                let sprite = entity.get::<Render>().map_or("entity", |render| render.sprite.as_str());
                format!("{} {} at ({}, {})", sprite, entity.id(), pos.x as i64, pos.y as i64)
            })
            .collect();
        if main.is_empty() {
            main.push(NO_ENTITIES.to_string());
        }

        let mut sidebar: Vec<String> = snapshot
            .stats
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect();
        if sidebar.is_empty() {
            sidebar.push(NO_STATS.to_string());
        }

        Self {
            header,
            main,
            sidebar,
            footer: snapshot.message.clone().unwrap_or_default(),
        }
    }
}
