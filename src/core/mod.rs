pub mod component;
pub mod engine;    // Fixed-timestep loop
pub mod input;
pub mod registry;  // Entities and their components
pub mod renderer;  // Snapshot + rendering interface
pub mod terminal;  // Concrete renderers
