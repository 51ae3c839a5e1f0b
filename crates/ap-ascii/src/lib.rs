/// ASCII conversion engine for asciiplay.
///
/// Converts luminance grids to glyph grids.
pub mod luminance;
