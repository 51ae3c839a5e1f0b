use std::path::Path;
use std::thread;
use std::time::Duration;

use ap_core::config::PlayerConfig;
use ap_core::shutdown::ShutdownFlag;
use ap_core::traits::{AudioSource, AudioSpec};

use crate::decode::SymphoniaSource;
use crate::error::AudioError;
use crate::fifo::audio_fifo;
use crate::output::{AudioOutput, CpalOutput};

/// Paramètres du pipeline de staging.
#[derive(Clone, Copy, Debug)]
pub struct StagingOptions {
    /// Capacité du FIFO en secondes d'audio.
    pub fifo_seconds: f32,
    /// Période de sondage (FIFO plein, attente de vidange).
    pub poll: Duration,
}

impl StagingOptions {
    /// Options derived from the player configuration.
    #[must_use]
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            fifo_seconds: config.fifo_seconds,
            poll: Duration::from_millis(config.drain_poll_ms),
        }
    }

    /// FIFO capacity in interleaved samples for `spec`.
    ///
    /// # Example
    /// ```
    /// use ap_audio::staging::StagingOptions;
    /// use ap_core::traits::AudioSpec;
    /// use std::time::Duration;
    ///
    /// let options = StagingOptions { fifo_seconds: 2.0, poll: Duration::from_millis(10) };
    /// let spec = AudioSpec { channels: 2, sample_rate: 48_000 };
    /// assert_eq!(options.capacity(spec), 192_000);
    /// ```
    #[must_use]
    pub fn capacity(&self, spec: AudioSpec) -> usize {
        let frames = (f64::from(self.fifo_seconds) * f64::from(spec.sample_rate)).ceil() as usize;
        frames.max(1) * usize::from(spec.channels.max(1))
    }
}

impl Default for StagingOptions {
    fn default() -> Self {
        Self::from_config(&PlayerConfig::default())
    }
}

/// Fin du staging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagingOutcome {
    /// Source épuisée et FIFO entièrement joué.
    Drained,
    /// Arrêt demandé via le drapeau partagé.
    Interrupted,
    /// Le flux de sortie a relâché le FIFO avant la fin.
    OutputClosed,
}

/// Bilan d'une session de staging.
#[derive(Clone, Copy, Debug)]
pub struct StagingReport {
    /// Raison de fin du staging.
    pub outcome: StagingOutcome,
    /// Échantillons (entrelacés) écrits dans le FIFO.
    pub samples_staged: u64,
    /// Lectures du callback complétées par du silence en cours de lecture
    /// (hors silence de démarrage et de fin de piste).
    pub underruns: u64,
}

/// Pont entre une source audio tirée et une sortie pilotée par callback.
///
/// 1. Ouvre la sortie avec le format de la source et le côté lecture du FIFO.
/// 2. Décode bloc par bloc et pousse dans le FIFO (attente par sondage
///    tant qu'il est plein).
/// 3. Source épuisée : sonde jusqu'à ce que le FIFO soit vide.
/// 4. Arrête la sortie, sur tous les chemins après un démarrage réussi.
///
/// Le drapeau d'arrêt est vérifié à chaque bloc et à chaque sondage.
///
/// # Errors
/// Returns an [`AudioError`] if the output cannot be started. Decode errors
/// mid-stream end the stream early and are only logged.
pub fn run_staging<S, O>(
    source: &mut S,
    output: &mut O,
    options: &StagingOptions,
    shutdown: &ShutdownFlag,
) -> Result<StagingReport, AudioError>
where
    S: AudioSource + ?Sized,
    O: AudioOutput + ?Sized,
{
    let spec = source.spec();
    let (mut writer, reader) = audio_fifo(options.capacity(spec), spec.channels);
    log::debug!(
        "FIFO audio : {} échantillons ({}Hz × {} canaux)",
        writer.capacity(),
        spec.sample_rate,
        spec.channels
    );

    output.start(spec, reader)?;

    let mut samples_staged = 0u64;
    let mut outcome = loop {
        if shutdown.is_requested() {
            break StagingOutcome::Interrupted;
        }
        let block = match source.next_block() {
            Ok(Some(block)) => block,
            Ok(None) => break StagingOutcome::Drained,
            Err(e) => {
                log::warn!("Décodage audio interrompu : {e:#}");
                break StagingOutcome::Drained;
            }
        };
        if !writer.push_all(block, shutdown, options.poll) {
            break if writer.reader_dropped() {
                StagingOutcome::OutputClosed
            } else {
                StagingOutcome::Interrupted
            };
        }
        samples_staged += block.len() as u64;
    };

    if outcome == StagingOutcome::Drained {
        log::debug!("Source audio épuisée, vidange du FIFO");
        writer.finish();
        while !writer.is_drained() {
            if shutdown.is_requested() {
                outcome = StagingOutcome::Interrupted;
                break;
            }
            if writer.reader_dropped() {
                outcome = StagingOutcome::OutputClosed;
                break;
            }
            thread::sleep(options.poll);
        }
    }

    output.stop();

    Ok(StagingReport {
        outcome,
        samples_staged,
        underruns: writer.underruns(),
    })
}

/// Joue la piste audio de `path` sur le périphérique par défaut.
///
/// Blocks the calling thread until the track has been played, a stop is
/// requested, or the output closes. Meant to run on a dedicated thread.
///
/// # Errors
/// Returns an [`AudioError`] if the media, track, decoder, or output device
/// is unavailable.
pub fn play_file(
    path: &Path,
    options: &StagingOptions,
    shutdown: &ShutdownFlag,
) -> Result<StagingReport, AudioError> {
    let mut source = SymphoniaSource::open(path)?;
    let mut output = CpalOutput::new();
    run_staging(&mut source, &mut output, options, shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fifo::FifoReader;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;
    use std::time::Instant;

    const SPEC: AudioSpec = AudioSpec {
        channels: 1,
        sample_rate: 1000,
    };

    /// Source en mémoire : blocs pré-calculés, ou infinie.
    struct BlockSource {
        blocks: VecDeque<Vec<f32>>,
        current: Vec<f32>,
        endless: bool,
    }

    impl BlockSource {
        fn counting(total: usize, block: usize) -> Self {
            let values: Vec<f32> = (1..=total).map(|v| v as f32).collect();
            Self {
                blocks: values.chunks(block).map(<[f32]>::to_vec).collect(),
                current: Vec::new(),
                endless: false,
            }
        }

        fn endless() -> Self {
            Self {
                blocks: VecDeque::new(),
                current: Vec::new(),
                endless: true,
            }
        }
    }

    impl AudioSource for BlockSource {
        fn spec(&self) -> AudioSpec {
            SPEC
        }

        fn next_block(&mut self) -> anyhow::Result<Option<&[f32]>> {
            if self.endless {
                self.current = vec![0.5; 32];
                return Ok(Some(&self.current));
            }
            match self.blocks.pop_front() {
                Some(block) => {
                    self.current = block;
                    Ok(Some(&self.current))
                }
                None => Ok(None),
            }
        }
    }

    /// Sortie factice : un thread « driver » tire 16 échantillons par ms.
    #[derive(Default)]
    struct ThreadOutput {
        played: Arc<Mutex<Vec<f32>>>,
        running: Arc<AtomicBool>,
        driver: Option<JoinHandle<()>>,
        started: bool,
        stopped: bool,
    }

    impl AudioOutput for ThreadOutput {
        fn start(&mut self, _spec: AudioSpec, mut reader: FifoReader) -> Result<(), AudioError> {
            self.started = true;
            self.running.store(true, Ordering::SeqCst);
            let running = Arc::clone(&self.running);
            let played = Arc::clone(&self.played);
            self.driver = Some(thread::spawn(move || {
                let mut buf = [0.0f32; 16];
                while running.load(Ordering::SeqCst) {
                    let n = reader.fill(&mut buf);
                    played.lock().unwrap().extend_from_slice(&buf[..n]);
                    thread::sleep(Duration::from_millis(1));
                }
            }));
            Ok(())
        }

        fn stop(&mut self) {
            self.stopped = true;
            self.running.store(false, Ordering::SeqCst);
            if let Some(driver) = self.driver.take() {
                driver.join().unwrap();
            }
        }
    }

    /// Sortie qui échoue à l'ouverture.
    struct MissingDevice;

    impl AudioOutput for MissingDevice {
        fn start(&mut self, _spec: AudioSpec, _reader: FifoReader) -> Result<(), AudioError> {
            Err(AudioError::NoOutputDevice)
        }

        fn stop(&mut self) {}
    }

    /// Sortie qui relâche immédiatement le FIFO.
    struct ClosingOutput;

    impl AudioOutput for ClosingOutput {
        fn start(&mut self, _spec: AudioSpec, reader: FifoReader) -> Result<(), AudioError> {
            drop(reader);
            Ok(())
        }

        fn stop(&mut self) {}
    }

    fn options() -> StagingOptions {
        StagingOptions {
            // 50 échantillons à 1kHz mono : le producteur attend souvent.
            fifo_seconds: 0.05,
            poll: Duration::from_millis(1),
        }
    }

    #[test]
    fn samples_play_in_production_order() {
        let mut source = BlockSource::counting(1000, 37);
        let mut output = ThreadOutput::default();
        let shutdown = ShutdownFlag::new();

        let report = run_staging(&mut source, &mut output, &options(), &shutdown).unwrap();

        assert_eq!(report.outcome, StagingOutcome::Drained);
        assert_eq!(report.samples_staged, 1000);
        assert!(output.started && output.stopped);
        let played = output.played.lock().unwrap().clone();
        let expected: Vec<f32> = (1..=1000).map(|v| v as f32).collect();
        assert_eq!(played, expected);
    }

    #[test]
    fn shutdown_stops_an_endless_source() {
        let mut source = BlockSource::endless();
        let mut output = ThreadOutput::default();
        let shutdown = ShutdownFlag::new();
        let trigger = shutdown.clone();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.request();
            Instant::now()
        });
        let report = run_staging(&mut source, &mut output, &options(), &shutdown).unwrap();
        let returned_at = Instant::now();
        let requested_at = stopper.join().unwrap();

        assert_eq!(report.outcome, StagingOutcome::Interrupted);
        assert!(output.stopped);
        // Sondage à 1 ms : quelques périodes, arrêt du driver compris.
        let latency = returned_at.saturating_duration_since(requested_at);
        assert!(latency < Duration::from_millis(30), "{latency:?}");
    }

    #[test]
    fn shutdown_before_start_stages_nothing() {
        let mut source = BlockSource::counting(100, 10);
        let mut output = ThreadOutput::default();
        let shutdown = ShutdownFlag::new();
        shutdown.request();

        let report = run_staging(&mut source, &mut output, &options(), &shutdown).unwrap();
        assert_eq!(report.outcome, StagingOutcome::Interrupted);
        assert_eq!(report.samples_staged, 0);
        assert!(output.stopped);
    }

    #[test]
    fn missing_device_is_reported_without_decoding() {
        let mut source = BlockSource::counting(100, 10);
        let shutdown = ShutdownFlag::new();
        let err = run_staging(&mut source, &mut MissingDevice, &options(), &shutdown).unwrap_err();
        assert!(matches!(err, AudioError::NoOutputDevice));
        assert_eq!(source.blocks.len(), 10);
    }

    #[test]
    fn closed_output_does_not_hang_the_producer() {
        let mut source = BlockSource::counting(1000, 100);
        let shutdown = ShutdownFlag::new();
        let report = run_staging(&mut source, &mut ClosingOutput, &options(), &shutdown).unwrap();
        assert_eq!(report.outcome, StagingOutcome::OutputClosed);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let shutdown = ShutdownFlag::new();
        let err = play_file(
            Path::new("/definitely/not/here.mp4"),
            &options(),
            &shutdown,
        )
        .unwrap_err();
        assert!(matches!(err, AudioError::OpenMedia { .. }));
    }
}
