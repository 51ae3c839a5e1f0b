//! Shared types, traits, and configuration for asciiplay.
//!
//! This crate holds everything the render thread and the audio thread agree
//! on: the glyph palette, the luminance/glyph grids, the shutdown flag, the
//! collaborator traits, and the player configuration.

pub mod charset;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod shutdown;
pub mod traits;

pub use charset::Palette;
pub use config::PlayerConfig;
pub use error::CoreError;
pub use frame::{GlyphGrid, LuminanceGrid};
pub use shutdown::ShutdownFlag;
