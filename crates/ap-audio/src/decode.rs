use std::fs::File;
use std::path::Path;

use anyhow::Context;
use ap_core::traits::{AudioSource, AudioSpec};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;

/// Décodeur en flux de la piste audio d'un média, via symphonia.
///
/// Supports WAV, MP3, FLAC, OGG, AAC, and the audio track of MP4/MKV
/// containers. Blocks are f32 interleaved in the track's native channel
/// layout and sample rate.
///
/// # Example
/// ```no_run
/// use ap_audio::decode::SymphoniaSource;
/// use ap_core::traits::AudioSource;
///
/// let mut source = SymphoniaSource::open("clip.mp4".as_ref()).unwrap();
/// while let Some(block) = source.next_block().unwrap() {
///     println!("{} samples", block.len());
/// }
/// ```
pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: AudioSpec,
    sample_buf: Option<SampleBuffer<f32>>,
    max_frames: usize,
}

impl SymphoniaSource {
    /// Ouvre `path` et prépare le décodeur de la première piste audio.
    ///
    /// # Errors
    /// - [`AudioError::OpenMedia`] if the file cannot be opened or probed.
    /// - [`AudioError::NoAudioTrack`] if no track carries decodable audio.
    /// - [`AudioError::UnsupportedFormat`] if the channel layout is unknown.
    /// - [`AudioError::NoDecoder`] if no decoder exists for the codec.
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        let open_err = |reason: String| AudioError::OpenMedia {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| open_err(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| open_err(e.to_string()))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| {
                t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some()
            })
            .ok_or(AudioError::NoAudioTrack)?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
        let channels = track
            .codec_params
            .channels
            .map(symphonia::core::audio::Channels::count)
            .and_then(|c| u16::try_from(c).ok())
            .filter(|&c| c > 0)
            .ok_or_else(|| {
                AudioError::UnsupportedFormat("disposition des canaux inconnue".into())
            })?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::NoDecoder(e.to_string()))?;
        let track_id = track.id;

        log::debug!(
            "Piste audio #{track_id} : {sample_rate}Hz, {channels} canaux, {}",
            path.display()
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            spec: AudioSpec {
                channels,
                sample_rate,
            },
            sample_buf: None,
            max_frames: 0,
        })
    }
}

impl AudioSource for SymphoniaSource {
    fn spec(&self) -> AudioSpec {
        self.spec
    }

    fn next_block(&mut self) -> anyhow::Result<Option<&[f32]>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    log::warn!("Flux audio chaîné non supporté, arrêt du décodage");
                    return Ok(None);
                }
                Err(e) => return Err(e).context("Lecture du paquet audio"),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Audio decode frame error: {e}");
                    continue;
                }
                Err(e) => return Err(e).context("Décodage audio"),
            };

            if decoded.frames() == 0 {
                continue;
            }
            let spec = *decoded.spec();
            if spec.channels.count() != usize::from(self.spec.channels) {
                log::warn!(
                    "Paquet à {} canaux ignoré (flux à {})",
                    spec.channels.count(),
                    self.spec.channels
                );
                continue;
            }

            // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
            let num_frames = decoded.capacity();
            if num_frames > self.max_frames {
                self.sample_buf = None;
                self.max_frames = num_frames;
            }
            let buf = self
                .sample_buf
                .get_or_insert_with(|| SampleBuffer::<f32>::new(num_frames as u64, spec));
            buf.copy_interleaved_ref(decoded);
            return Ok(Some(buf.samples()));
        }
    }
}
