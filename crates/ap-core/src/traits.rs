use crate::frame::LuminanceGrid;

/// Fournit des frames de luminance à la taille configurée.
///
/// Implémenté par : `FfmpegVideo` (ap-source), sources synthétiques en test.
///
/// # Example
/// ```
/// use ap_core::traits::VideoSource;
/// use ap_core::frame::LuminanceGrid;
///
/// struct Empty;
/// impl VideoSource for Empty {
///     fn frame_rate(&self) -> f64 { 25.0 }
///     fn next_frame(&mut self, _frame: &mut LuminanceGrid) -> anyhow::Result<bool> { Ok(false) }
/// }
/// ```
pub trait VideoSource {
    /// Fréquence d'images du flux (frames/seconde).
    fn frame_rate(&self) -> f64;

    /// Écrit la frame suivante dans `frame`.
    ///
    /// Retourne `Ok(false)` en fin de flux. `frame` a toujours les
    /// dimensions configurées ; la source ne le redimensionne jamais.
    ///
    /// # Errors
    /// Returns an error on an unrecoverable read failure.
    fn next_frame(&mut self, frame: &mut LuminanceGrid) -> anyhow::Result<bool>;
}

/// Format du flux audio décodé : f32 entrelacé.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioSpec {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Samples per second per channel.
    pub sample_rate: u32,
}

/// Décodeur audio en flux tiré (pull).
///
/// # Example
/// ```
/// use ap_core::traits::{AudioSource, AudioSpec};
///
/// struct Silence(usize);
/// impl AudioSource for Silence {
///     fn spec(&self) -> AudioSpec { AudioSpec { channels: 1, sample_rate: 8000 } }
///     fn next_block(&mut self) -> anyhow::Result<Option<&[f32]>> {
///         if self.0 == 0 { return Ok(None); }
///         self.0 -= 1;
///         Ok(Some(&[0.0; 64]))
///     }
/// }
/// ```
pub trait AudioSource {
    /// Format of every block returned by `next_block`.
    fn spec(&self) -> AudioSpec;

    /// Décode le bloc suivant (échantillons entrelacés).
    ///
    /// Retourne `Ok(None)` en fin de flux.
    ///
    /// # Errors
    /// Returns an error if the stream cannot be read any further.
    fn next_block(&mut self) -> anyhow::Result<Option<&[f32]>>;
}
