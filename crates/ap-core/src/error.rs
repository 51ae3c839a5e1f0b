use thiserror::Error;

/// Errors originating from the core module.
///
/// All of these are configuration-class errors: they are raised at startup or
/// construction and are never retried.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Frame rate that cannot drive the pacer (zero, negative, NaN, infinite).
    #[error("Fréquence d'images invalide : {fps}")]
    InvalidFrameRate {
        /// Rejected frames-per-second value.
        fps: f64,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Luminance and glyph grids do not share the same geometry.
    #[error("Dimensions incompatibles : luminance {src_width}×{src_height}, glyphes {dst_width}×{dst_height}")]
    DimensionMismatch {
        /// Luminance grid width.
        src_width: u16,
        /// Luminance grid height.
        src_height: u16,
        /// Glyph grid width.
        dst_width: u16,
        /// Glyph grid height.
        dst_height: u16,
    },

    /// A palette needs at least one glyph.
    #[error("Palette vide")]
    EmptyPalette,
}
