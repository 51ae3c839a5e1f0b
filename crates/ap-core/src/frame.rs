use crate::error::CoreError;

/// Grille de luminance 8 bits, row-major, une valeur par cellule.
///
/// Produite par la source vidéo à la taille configurée, consommée une fois
/// par l'assembleur. Le buffer est réutilisé d'une frame à l'autre.
///
/// # Example
/// ```
/// use ap_core::frame::LuminanceGrid;
/// let grid = LuminanceGrid::new(3, 2);
/// assert_eq!(grid.data.len(), 6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LuminanceGrid {
    /// Luminance values, row-major.
    pub data: Vec<u8>,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl LuminanceGrid {
    /// Crée une grille noire pré-allouée.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            data: vec![0u8; usize::from(width) * usize::from(height)],
            width,
            height,
        }
    }

    /// Wrap an existing buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `data.len() != width * height`.
    ///
    /// # Example
    /// ```
    /// use ap_core::frame::LuminanceGrid;
    /// let grid = LuminanceGrid::from_vec(2, 1, vec![0, 255]).unwrap();
    /// assert_eq!(grid.get(1, 0), 255);
    /// ```
    pub fn from_vec(width: u16, height: u16, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != usize::from(width) * usize::from(height) {
            return Err(CoreError::InvalidDimensions {
                width: u32::from(width),
                height: u32::from(height),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Luminance at (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> u8 {
        self.data[usize::from(y) * usize::from(self.width) + usize::from(x)]
    }

    /// One row of luminance values.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> &[u8] {
        let start = usize::from(y) * usize::from(self.width);
        &self.data[start..start + usize::from(self.width)]
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }
}

/// Grille de glyphes de sortie. Pré-allouée, réutilisée chaque frame.
///
/// # Example
/// ```
/// use ap_core::frame::GlyphGrid;
/// let mut grid = GlyphGrid::new(80, 24, ' ');
/// grid.set(0, 0, '@');
/// assert_eq!(grid.get(0, 0), '@');
/// assert_eq!(grid.cells.len(), 80 * 24);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    /// Flat array of glyphs, row-major.
    pub cells: Vec<char>,
    /// Width in characters.
    pub width: u16,
    /// Height in characters.
    pub height: u16,
}

impl GlyphGrid {
    /// Crée une grille remplie de `fill`.
    #[must_use]
    pub fn new(width: u16, height: u16, fill: char) -> Self {
        Self {
            cells: vec![fill; usize::from(width) * usize::from(height)],
            width,
            height,
        }
    }

    /// Set the glyph at (x, y).
    #[inline(always)]
    pub fn set(&mut self, x: u16, y: u16, ch: char) {
        self.cells[usize::from(y) * usize::from(self.width) + usize::from(x)] = ch;
    }

    /// Glyph at (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> char {
        self.cells[usize::from(y) * usize::from(self.width) + usize::from(x)]
    }

    /// One row of glyphs.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> &[char] {
        let start = usize::from(y) * usize::from(self.width);
        &self.cells[start..start + usize::from(self.width)]
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.cells.chunks_exact(usize::from(self.width.max(1)))
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }
}
