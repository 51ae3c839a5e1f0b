use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use ap_ascii::luminance::assemble;
use ap_core::charset::Palette;
use ap_core::clock::Clock;
use ap_core::frame::{GlyphGrid, LuminanceGrid};
use ap_core::shutdown::ShutdownFlag;
use ap_core::traits::VideoSource;
use ap_render::fps::FpsMeter;
use ap_render::pacer::FramePacer;
use ap_render::presenter::Presenter;

/// Raison de sortie de la boucle de rendu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// La source vidéo n'a plus de frames.
    EndOfStream,
    /// Arrêt demandé (signal ou fin d'un autre composant).
    Interrupted,
}

/// Bilan de la boucle de rendu.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackReport {
    /// Raison de sortie de la boucle.
    pub outcome: RenderOutcome,
    /// Frames présentées.
    pub frames: u64,
    /// Re-ancrages du pacer après un retard.
    pub resets: u64,
    /// Fps moyen mesuré sur toute la lecture.
    pub average_fps: f64,
}

/// Boucle de rendu : decode → quantize → assemble → present → pace.
///
/// The shutdown flag is checked once per frame, so a stop request is
/// honoured within one frame period. End of stream also requests shutdown
/// so the audio side stops with the video.
///
/// Frame and glyph buffers are allocated once at `width × height` and
/// reused for every frame.
///
/// # Errors
/// Returns an error if the source fails to produce a frame, or if writing
/// to the terminal fails. Both are fatal for playback.
pub fn run_render_loop<V, W, C>(
    video: &mut V,
    palette: &Palette,
    presenter: &mut Presenter<W>,
    pacer: &mut FramePacer<C>,
    shutdown: &ShutdownFlag,
    width: u16,
    height: u16,
) -> Result<PlaybackReport>
where
    V: VideoSource + ?Sized,
    W: Write,
    C: Clock,
{
    let mut frame = LuminanceGrid::new(width, height);
    let mut glyphs = GlyphGrid::new(width, height, palette.blank());
    let mut meter = FpsMeter::new();

    let outcome = loop {
        if shutdown.is_requested() {
            break RenderOutcome::Interrupted;
        }
        let has_frame = video
            .next_frame(&mut frame)
            .context("Lecture de la frame vidéo")?;
        if !has_frame {
            break RenderOutcome::EndOfStream;
        }
        assemble(&frame, palette, &mut glyphs)?;
        presenter
            .present(&glyphs)
            .context("Écriture sur le terminal")?;
        meter.tick(Instant::now());
        pacer.sleep();
    };

    if outcome == RenderOutcome::EndOfStream {
        log::info!("Fin du flux vidéo");
        shutdown.request();
    }

    Ok(PlaybackReport {
        outcome,
        frames: meter.frames(),
        resets: pacer.resets(),
        average_fps: meter.average_fps(),
    })
}
