//! Modifier stacks: ordered layers of interchangeable copies of a scene object, with one layer at a
//! time pinned visible and selectable for comparison.
//!
//! The engine drives a host scene graph through [`scene::SceneGraph`] and keeps no geometry of its
//! own. Start a [`session::Session`] on a selected object to get at its stack.

pub mod config;
pub mod naming;
pub mod scene;
pub mod session;

pub use config::Config;
pub use naming::Naming;
pub use session::Session;
