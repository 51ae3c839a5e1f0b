use std::io::{self, Write};

use ap_core::frame::GlyphGrid;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

/// Ligne affichée après le dernier effacement.
pub const FAREWELL: &str = "^-^!";

/// Redessine une `GlyphGrid` en plein écran sur un flux terminal.
///
/// Chaque frame : curseur en (0, 0), puis les `height` lignes, chacune suivie
/// d'un saut de ligne, puis flush. Le buffer de ligne est réutilisé.
///
/// Le curseur est masqué par [`Presenter::begin`] et restauré par
/// [`Presenter::finish`], ou au `Drop` si la lecture s'interrompt.
///
/// # Example
/// ```
/// use ap_core::frame::GlyphGrid;
/// use ap_render::presenter::Presenter;
///
/// let mut presenter = Presenter::new(Vec::new());
/// presenter.present(&GlyphGrid::new(2, 2, '#')).unwrap();
/// assert!(presenter.get_ref().ends_with(b"##\n##\n"));
/// ```
pub struct Presenter<W: Write> {
    out: W,
    line: String,
    cursor_hidden: bool,
}

impl<W: Write> Presenter<W> {
    /// Wrap an output stream (stdout in production, `Vec<u8>` in tests).
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: String::new(),
            cursor_hidden: false,
        }
    }

    /// Efface l'écran, place le curseur en haut à gauche et le masque.
    ///
    /// # Errors
    /// Returns any write/flush error from the underlying stream.
    pub fn begin(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0), Hide)?;
        self.cursor_hidden = true;
        self.out.flush()
    }

    /// Draw one full frame and flush before returning.
    ///
    /// # Errors
    /// Returns any write/flush error (e.g. broken pipe). The render loop
    /// treats this as fatal.
    pub fn present(&mut self, grid: &GlyphGrid) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0))?;
        for row in grid.rows().take(usize::from(grid.height)) {
            self.line.clear();
            self.line.extend(row);
            self.line.push('\n');
            self.out.write_all(self.line.as_bytes())?;
        }
        self.out.flush()
    }

    /// Efface l'écran, restaure le curseur et écrit [`FAREWELL`].
    ///
    /// # Errors
    /// Returns any write/flush error from the underlying stream.
    pub fn finish(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Show,
            Print(FAREWELL),
            Print('\n')
        )?;
        self.cursor_hidden = false;
        self.out.flush()
    }

    /// Underlying stream.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Drop for Presenter<W> {
    fn drop(&mut self) {
        if self.cursor_hidden {
            // Best effort : le flux est peut-être déjà cassé.
            let _ = queue!(self.out, Show);
            let _ = self.out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "\x1b[1;1H";
    const CLEAR: &str = "\x1b[2J";

    fn output(presenter: &Presenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.get_ref().clone()).unwrap()
    }

    #[test]
    fn frame_starts_at_home_and_writes_each_row_once() {
        let mut grid = GlyphGrid::new(3, 2, ' ');
        grid.set(0, 0, '@');
        grid.set(2, 1, '#');
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&grid).unwrap();
        assert_eq!(output(&presenter), format!("{HOME}@  \n  #\n"));
    }

    #[test]
    fn consecutive_frames_redraw_from_home() {
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&GlyphGrid::new(1, 1, '.')).unwrap();
        presenter.present(&GlyphGrid::new(1, 1, '@')).unwrap();
        assert_eq!(output(&presenter), format!("{HOME}.\n{HOME}@\n"));
    }

    #[test]
    fn multibyte_glyphs_are_encoded() {
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&GlyphGrid::new(2, 1, '█')).unwrap();
        assert_eq!(output(&presenter), format!("{HOME}██\n"));
    }

    #[test]
    fn begin_and_finish_bracket_playback() {
        let mut presenter = Presenter::new(Vec::new());
        presenter.begin().unwrap();
        presenter.finish().unwrap();
        let out = output(&presenter);
        assert!(out.starts_with(CLEAR));
        assert!(out.contains("\x1b[?25l"));
        assert!(out.contains("\x1b[?25h"));
        assert!(out.ends_with("^-^!\n"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let mut presenter = Presenter::new(BrokenPipe);
        let err = presenter.present(&GlyphGrid::new(2, 2, '#')).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
