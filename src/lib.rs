pub mod animation;
pub mod assets;
pub mod cli;
pub mod config;
pub mod context;
pub mod ecs;
pub mod events;
pub mod loader;
pub mod presenter;
pub mod scene;
pub mod selection;
pub mod session;

pub use context::{AppMode, AuthoringContext};
pub use ecs::EcsWorld;
pub use session::{AuthoringSession, SessionSurfaces};
