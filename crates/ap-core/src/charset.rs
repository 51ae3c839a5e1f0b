use crate::error::CoreError;

/// 70 caractères, Paul Bourke extended, du plus clair au plus dense.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// 10 caractères, compact, bon contraste.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// Palette index for a luminance value.
///
/// `min(len - 1, floor(luminance * len / 256))`. Monotonic in `luminance`,
/// always in `[0, len)` for `len > 0`.
///
/// # Example
/// ```
/// use ap_core::charset::quantize_index;
/// assert_eq!(quantize_index(0, 4), 0);
/// assert_eq!(quantize_index(127, 4), 1);
/// assert_eq!(quantize_index(255, 4), 3);
/// ```
#[inline(always)]
#[must_use]
pub fn quantize_index(luminance: u8, len: usize) -> usize {
    (usize::from(luminance) * len / 256).min(len.saturating_sub(1))
}

/// Ordered glyph palette, sparsest first.
///
/// The luminance → glyph table is pre-computed at construction so the
/// per-cell cost on the hot path is a single indexed load.
///
/// # Example
/// ```
/// use ap_core::charset::Palette;
/// let palette = Palette::new(" .#@").unwrap();
/// assert_eq!(palette.map(0), ' ');
/// assert_eq!(palette.map(255), '@');
/// ```
#[derive(Clone, Debug)]
pub struct Palette {
    glyphs: Vec<char>,
    lut: [char; 256],
}

impl Palette {
    /// Build a palette from a charset ordered sparsest → densest.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyPalette`] if `charset` has no characters.
    pub fn new(charset: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = charset.chars().collect();
        if glyphs.is_empty() {
            return Err(CoreError::EmptyPalette);
        }
        let mut lut = [' '; 256];
        for (lum, slot) in lut.iter_mut().enumerate() {
            *slot = glyphs[quantize_index(lum as u8, glyphs.len())];
        }
        Ok(Self { glyphs, lut })
    }

    /// Same glyphs, densest first (pour fond clair).
    ///
    /// # Example
    /// ```
    /// use ap_core::charset::Palette;
    /// let inv = Palette::new(" .#@").unwrap().inverted();
    /// assert_eq!(inv.map(0), '@');
    /// ```
    #[must_use]
    pub fn inverted(&self) -> Self {
        let reversed: String = self.glyphs.iter().rev().collect();
        // Non-empty by construction.
        Self::new(&reversed).unwrap_or_else(|_| self.clone())
    }

    /// Map a luminance value [0..255] to a glyph.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[luminance as usize]
    }

    /// Number of glyphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyphs in palette order.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// First (sparsest) glyph, used to pre-fill glyph grids.
    #[must_use]
    pub fn blank(&self) -> char {
        self.glyphs[0]
    }

    /// Position of `ch` in the palette, if present.
    #[must_use]
    pub fn index_of(&self, ch: char) -> Option<usize> {
        self.glyphs.iter().position(|&g| g == ch)
    }
}
