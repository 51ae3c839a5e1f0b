use ap_core::traits::AudioSpec;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::AudioError;
use crate::fifo::FifoReader;

/// Périphérique de sortie audio piloté par callback.
///
/// Une fois démarré, le driver appelle le callback sur son propre thread
/// temps réel ; le callback tire les échantillons du [`FifoReader`].
pub trait AudioOutput {
    /// Configure le flux (f32 entrelacé, `spec`) et démarre la lecture.
    ///
    /// # Errors
    /// Returns an [`AudioError`] if the device cannot be opened or started.
    fn start(&mut self, spec: AudioSpec, reader: FifoReader) -> Result<(), AudioError>;

    /// Arrête et libère le flux. Idempotent.
    fn stop(&mut self);
}

/// Sortie sur le périphérique par défaut via cpal.
///
/// # Example
/// ```no_run
/// use ap_audio::fifo::audio_fifo;
/// use ap_audio::output::{AudioOutput, CpalOutput};
/// use ap_core::traits::AudioSpec;
///
/// let (_writer, reader) = audio_fifo(48_000, 2);
/// let mut output = CpalOutput::new();
/// output.start(AudioSpec { channels: 2, sample_rate: 48_000 }, reader).unwrap();
/// output.stop();
/// ```
#[derive(Default)]
pub struct CpalOutput {
    stream: Option<cpal::Stream>,
}

impl CpalOutput {
    /// Sortie non démarrée.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for CpalOutput {
    fn start(&mut self, spec: AudioSpec, mut reader: FifoReader) -> Result<(), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let config = cpal::StreamConfig {
            channels: spec.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    reader.fill(data);
                },
                |err| {
                    log::error!("Audio output error: {err}");
                },
                None,
            )
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        log::info!(
            "Audio playback started @ {}Hz, {} canaux",
            spec.sample_rate,
            spec.channels
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("Pause du stream audio impossible : {e}");
            }
            log::info!("Audio playback stopped");
        }
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
