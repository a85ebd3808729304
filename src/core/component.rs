//! Component records attached to entities.
//!
//! Components are plain data. The set of kinds is closed: every record type
//! has a matching [`ComponentKind`] variant and a [`Component`] variant, so a
//! `match` over either is checked for exhaustiveness.

use serde::{Deserialize, Serialize};

/// Discriminant for the kinds of component an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Position,
    Velocity,
    Render,
}

impl ComponentKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Velocity => "velocity",
            Self::Render => "render",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Units per second along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64,
}

impl Velocity {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// How an entity shows up on screen. Higher `z_index` draws later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Render {
    pub visible: bool,
    pub sprite: String,
    pub z_index: i32,
}

impl Render {
    pub fn sprite(sprite: impl Into<String>) -> Self {
        Self {
            sprite: sprite.into(),
            ..Self::default()
        }
    }
}

impl Default for Render {
    fn default() -> Self {
        Self {
            visible: true,
            sprite: "default".to_string(),
            z_index: 0,
        }
    }
}

/// A component instance of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Position(Position),
    Velocity(Velocity),
    Render(Render),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Position(_) => ComponentKind::Position,
            Component::Velocity(_) => ComponentKind::Velocity,
            Component::Render(_) => ComponentKind::Render,
        }
    }
}

/// Typed access to one variant of [`Component`].
///
/// Lets callers write `entity.get::<Position>()` instead of matching on the
/// enum by hand.
pub trait ComponentData: Into<Component> + Sized {
    const KIND: ComponentKind;

    fn from_component(component: &Component) -> Option<&Self>;

    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! impl_component_data {
    ($ty:ident) => {
        impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::$ty(value)
            }
        }

        impl ComponentData for $ty {
            const KIND: ComponentKind = ComponentKind::$ty;

            fn from_component(component: &Component) -> Option<&Self> {
                match component {
                    Component::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                match component {
                    Component::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_component_data!(Position);
impl_component_data!(Velocity);
impl_component_data!(Render);
