pub mod adapters;
pub mod controllers;
pub mod core;
#[cfg(feature = "gui")]
pub mod input;
#[cfg(feature = "gui")]
pub mod presenters;

pub use controllers::ascii::AsciiController;
pub use controllers::options::{CliOptions, Frontend, ResolvedOptions};
pub use core::data::plane::{CoordinatePlane, PlaneConfig, PlaneError};

#[cfg(feature = "gui")]
pub use input::gui::run_gui;
