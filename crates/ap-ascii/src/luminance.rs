use ap_core::charset::Palette;
use ap_core::error::CoreError;
use ap_core::frame::{GlyphGrid, LuminanceGrid};

/// Quantize every cell of `frame` into `grid` through `palette`.
///
/// `grid` is overwritten in place; no allocation. Both grids must have the
/// same dimensions, which are fixed for the whole playback.
///
/// # Errors
/// Returns [`CoreError::DimensionMismatch`] if the grids differ in size.
///
/// # Example
/// ```
/// use ap_core::charset::Palette;
/// use ap_core::frame::{GlyphGrid, LuminanceGrid};
/// use ap_ascii::luminance::assemble;
///
/// let palette = Palette::new(" .#@").unwrap();
/// let frame = LuminanceGrid::from_vec(2, 1, vec![0, 255]).unwrap();
/// let mut grid = GlyphGrid::new(2, 1, palette.blank());
/// assemble(&frame, &palette, &mut grid).unwrap();
/// assert_eq!(grid.cells, vec![' ', '@']);
/// ```
pub fn assemble(
    frame: &LuminanceGrid,
    palette: &Palette,
    grid: &mut GlyphGrid,
) -> Result<(), CoreError> {
    if frame.dimensions() != grid.dimensions() {
        return Err(CoreError::DimensionMismatch {
            src_width: frame.width,
            src_height: frame.height,
            dst_width: grid.width,
            dst_height: grid.height,
        });
    }

    for (cell, &lum) in grid.cells.iter_mut().zip(&frame.data) {
        *cell = palette.map(lum);
    }
    Ok(())
}
