/// Terminal output and frame timing for asciiplay.
///
/// Provides the full-screen presenter, the drift-correcting frame pacer,
/// and a measured-fps meter.
pub mod fps;
pub mod pacer;
pub mod presenter;
