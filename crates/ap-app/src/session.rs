use std::io::Write;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use ap_audio::AudioError;
use ap_audio::staging::StagingReport;
use ap_core::charset::Palette;
use ap_core::shutdown::ShutdownFlag;
use ap_core::traits::VideoSource;
use ap_render::pacer::FramePacer;
use ap_render::presenter::Presenter;

use crate::player::{PlaybackReport, run_render_loop};

/// Message affiché une seule fois à la réception d'un signal.
pub const SIGNAL_MESSAGE: &str = "Received signal, stopping...";

/// État global de la lecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Rendu et audio en cours.
    Running,
    /// Arrêt demandé, les boucles sortent à leur prochaine itération.
    StopRequested,
    /// Boucle de rendu sortie et thread audio rejoint. Terminal.
    Stopped,
}

/// Coordonne l'arrêt des deux pipelines.
///
/// `Running → StopRequested` sur signal, fin de flux ou erreur ;
/// `StopRequested → Stopped` une fois les deux threads terminés.
#[derive(Debug)]
pub struct Lifecycle {
    shutdown: ShutdownFlag,
    stopped: bool,
}

impl Lifecycle {
    /// Coordinateur sur `shutdown`, partagé avec les deux pipelines.
    #[must_use]
    pub fn new(shutdown: ShutdownFlag) -> Self {
        Self {
            shutdown,
            stopped: false,
        }
    }

    /// État courant, dérivé du drapeau d'arrêt.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        if self.stopped {
            LifecycleState::Stopped
        } else if self.shutdown.is_requested() {
            LifecycleState::StopRequested
        } else {
            LifecycleState::Running
        }
    }

    /// Demande l'arrêt. `true` pour le premier appel seulement.
    pub fn request_stop(&self) -> bool {
        self.shutdown.request()
    }

    /// Marque la fin : implique une demande d'arrêt.
    pub fn mark_stopped(&mut self) {
        self.shutdown.request();
        self.stopped = true;
    }

    /// Drapeau observé par les boucles de rendu et d'audio.
    #[must_use]
    pub fn shutdown(&self) -> &ShutdownFlag {
        &self.shutdown
    }
}

/// Installe le handler SIGINT/SIGTERM.
///
/// The handler only sets the shared flag and prints the stop message the
/// first time; the render and audio loops observe the flag themselves.
///
/// # Errors
/// Returns an error if a handler is already installed for this process.
pub fn install_signal_handler(shutdown: &ShutdownFlag) -> Result<()> {
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        on_signal(&flag);
    })
    .context("Installation du handler de signal")
}

/// Réaction à un signal : demande l'arrêt, signale et journalise une fois.
///
/// Returns `true` for the signal that actually requested the stop.
pub fn on_signal(shutdown: &ShutdownFlag) -> bool {
    let first = shutdown.request();
    if first {
        eprintln!("\n{SIGNAL_MESSAGE}");
        log::info!("Signal reçu, arrêt demandé");
    }
    first
}

/// Bilan de session.
#[derive(Debug)]
pub struct SessionReport {
    /// Bilan de la boucle de rendu.
    pub playback: PlaybackReport,
    /// `None` si pas d'audio ou si le pipeline audio a échoué.
    pub audio: Option<StagingReport>,
    /// État final, `Stopped` sur le chemin normal.
    pub state: LifecycleState,
}

fn spawn_audio<A>(task: A, shutdown: ShutdownFlag) -> Option<JoinHandle<Option<StagingReport>>>
where
    A: FnOnce(&ShutdownFlag) -> Result<StagingReport, AudioError> + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("ap-audio".into())
        .spawn(move || match task(&shutdown) {
            Ok(report) => {
                log::debug!("Audio terminé : {:?}", report.outcome);
                Some(report)
            }
            Err(e) => {
                log::warn!("Audio indisponible, lecture muette : {e}");
                None
            }
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Thread audio non démarré : {e}");
            None
        }
    }
}

fn join_audio(handle: Option<JoinHandle<Option<StagingReport>>>) -> Option<StagingReport> {
    let handle = handle?;
    match handle.join() {
        Ok(report) => report,
        Err(_) => {
            log::error!("Thread audio paniqué");
            None
        }
    }
}

/// Lecture complète : audio en arrière-plan, rendu sur le thread appelant.
///
/// The audio task, if any, runs on its own thread and receives the shared
/// flag. Audio failures are logged and playback continues silently. On every
/// exit path (end of stream, signal, render error) a stop is requested and
/// the audio thread is joined before returning. The presenter is cleared
/// and the cursor restored when the render loop ends normally.
///
/// # Errors
/// Returns an error if the frame rate is invalid (before audio starts), or
/// if the render loop fails.
pub fn run_session<V, W, A>(
    video: &mut V,
    presenter: &mut Presenter<W>,
    palette: &Palette,
    (width, height): (u16, u16),
    audio: Option<A>,
    shutdown: &ShutdownFlag,
) -> Result<SessionReport>
where
    V: VideoSource + ?Sized,
    W: Write,
    A: FnOnce(&ShutdownFlag) -> Result<StagingReport, AudioError> + Send + 'static,
{
    let mut pacer = FramePacer::new(video.frame_rate())?;
    log::info!(
        "Rendu {width}×{height} à {:.3} fps ({:?}/frame)",
        video.frame_rate(),
        pacer.frame_duration()
    );

    let mut lifecycle = Lifecycle::new(shutdown.clone());
    let audio_handle =
        audio.and_then(|task| spawn_audio(task, lifecycle.shutdown().clone()));

    let rendered = match presenter.begin() {
        Ok(()) => run_render_loop(
            video,
            palette,
            presenter,
            &mut pacer,
            lifecycle.shutdown(),
            width,
            height,
        ),
        Err(e) => Err(e).context("Initialisation du terminal"),
    };

    lifecycle.request_stop();
    let audio = join_audio(audio_handle);

    let playback = rendered?;
    presenter.finish().context("Restauration du terminal")?;
    lifecycle.mark_stopped();

    Ok(SessionReport {
        playback,
        audio,
        state: lifecycle.state(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::RenderOutcome;
    use crate::player::tests::{FailingVideo, SyntheticVideo};
    use ap_audio::staging::StagingOutcome;
    use ap_render::presenter::FAREWELL;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    type AudioTask = fn(&ShutdownFlag) -> Result<StagingReport, AudioError>;

    fn idle_until_stop(flag: &ShutdownFlag) -> Result<StagingReport, AudioError> {
        while !flag.is_requested() {
            thread::sleep(Duration::from_millis(1));
        }
        Ok(StagingReport {
            outcome: StagingOutcome::Interrupted,
            samples_staged: 0,
            underruns: 0,
        })
    }

    #[test]
    fn lifecycle_transitions() {
        let mut lifecycle = Lifecycle::new(ShutdownFlag::new());
        assert_eq!(lifecycle.state(), LifecycleState::Running);
        assert!(lifecycle.request_stop());
        assert!(!lifecycle.request_stop());
        assert_eq!(lifecycle.state(), LifecycleState::StopRequested);
        lifecycle.mark_stopped();
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn signal_is_reported_once() {
        let shutdown = ShutdownFlag::new();
        let lifecycle = Lifecycle::new(shutdown.clone());
        assert!(on_signal(&shutdown));
        assert!(!on_signal(&shutdown));
        assert_eq!(lifecycle.state(), LifecycleState::StopRequested);
    }

    #[test]
    fn unrepresentable_frame_rate_fails_without_panicking() {
        let palette = Palette::new(" #").unwrap();
        let mut video = SyntheticVideo::finite(3, 1e-30);
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();

        let result = run_session(
            &mut video,
            &mut presenter,
            &palette,
            (2, 2),
            None::<AudioTask>,
            &shutdown,
        );
        assert!(result.is_err());
        assert_eq!(video.produced, 0);
    }

    #[test]
    fn end_of_video_stops_audio() {
        let palette = Palette::new(" .#@").unwrap();
        let mut video = SyntheticVideo::finite(5, 100.0);
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();

        let report = run_session(
            &mut video,
            &mut presenter,
            &palette,
            (3, 2),
            Some(idle_until_stop as AudioTask),
            &shutdown,
        )
        .unwrap();

        assert_eq!(report.playback.outcome, RenderOutcome::EndOfStream);
        assert_eq!(report.playback.frames, 5);
        assert_eq!(
            report.audio.map(|a| a.outcome),
            Some(StagingOutcome::Interrupted)
        );
        assert_eq!(report.state, LifecycleState::Stopped);

        let out = String::from_utf8_lossy(presenter.get_ref()).into_owned();
        assert!(out.starts_with("\x1b[2J"));
        assert!(out.ends_with(&format!("{FAREWELL}\n")));
        assert!(out.contains("\x1b[?25l"));
        assert!(out.contains("\x1b[?25h"));
    }

    #[test]
    fn failing_audio_keeps_video_running() {
        let palette = Palette::new(" #").unwrap();
        let mut video = SyntheticVideo::finite(6, 200.0);
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();

        let report = run_session(
            &mut video,
            &mut presenter,
            &palette,
            (4, 3),
            Some(|_: &ShutdownFlag| Err(AudioError::NoOutputDevice)),
            &shutdown,
        )
        .unwrap();

        assert_eq!(report.playback.frames, 6);
        assert!(report.audio.is_none());
        assert_eq!(report.state, LifecycleState::Stopped);
        assert_eq!(video.produced, 6);
        assert!(!presenter.get_ref().is_empty());
    }

    #[test]
    fn video_only_session() {
        let palette = Palette::new(" #").unwrap();
        let mut video = SyntheticVideo::finite(3, 200.0);
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();

        let report = run_session(
            &mut video,
            &mut presenter,
            &palette,
            (2, 2),
            None::<AudioTask>,
            &shutdown,
        )
        .unwrap();
        assert_eq!(report.playback.frames, 3);
        assert!(report.audio.is_none());
    }

    #[test]
    fn signal_stops_both_pipelines() {
        let palette = Palette::new(" .#").unwrap();
        let mut video = SyntheticVideo::endless(30.0);
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();

        let remote = shutdown.clone();
        let signaller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.request();
        });

        let start = Instant::now();
        let report = run_session(
            &mut video,
            &mut presenter,
            &palette,
            (5, 2),
            Some(idle_until_stop as AudioTask),
            &shutdown,
        )
        .unwrap();
        signaller.join().unwrap();

        assert_eq!(report.playback.outcome, RenderOutcome::Interrupted);
        assert!(report.audio.is_some());
        assert_eq!(report.state, LifecycleState::Stopped);
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn render_error_still_joins_audio() {
        let palette = Palette::new(" #").unwrap();
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();
        let finished = Arc::new(AtomicBool::new(false));

        let done = Arc::clone(&finished);
        let audio = move |flag: &ShutdownFlag| {
            let report = idle_until_stop(flag);
            done.store(true, Ordering::SeqCst);
            report
        };

        let result = run_session(
            &mut FailingVideo,
            &mut presenter,
            &palette,
            (2, 2),
            Some(audio),
            &shutdown,
        );
        assert!(result.is_err());
        assert!(shutdown.is_requested());
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn invalid_frame_rate_fails_before_audio() {
        let palette = Palette::new(" #").unwrap();
        let mut video = SyntheticVideo::finite(3, 0.0);
        let mut presenter = Presenter::new(Vec::new());
        let shutdown = ShutdownFlag::new();
        let started = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&started);
        let audio = move |s: &ShutdownFlag| {
            flag.store(true, Ordering::SeqCst);
            idle_until_stop(s)
        };

        let result = run_session(
            &mut video,
            &mut presenter,
            &palette,
            (2, 2),
            Some(audio),
            &shutdown,
        );
        assert!(result.is_err());
        assert!(!started.load(Ordering::SeqCst));
        assert!(presenter.get_ref().is_empty());
    }
}
