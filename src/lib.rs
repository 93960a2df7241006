pub mod canvas;
pub mod config;
pub mod debris;
pub mod error;
pub mod explosion;
pub mod firecracker;
pub mod launcher;
pub mod particles;
pub mod physics;
pub mod scene;
pub mod trigger;

pub use config::{Command, Config};
pub use error::{Error, Result};
pub use scene::Scene;
