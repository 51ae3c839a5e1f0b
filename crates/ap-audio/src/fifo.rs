use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use ap_core::shutdown::ShutdownFlag;
use rtrb::{Consumer, Producer, RingBuffer};

/// Crée un FIFO d'échantillons f32 entrelacés, borné à `capacity`.
///
/// Single-producer / single-consumer, lock-free des deux côtés : le
/// thread de staging écrit, le callback temps réel du driver lit.
///
/// # Example
/// ```
/// use ap_audio::fifo::audio_fifo;
/// let (mut writer, mut reader) = audio_fifo(8, 1);
/// assert_eq!(writer.push(&[0.5, 0.25]), 2);
/// let mut out = [1.0f32; 4];
/// assert_eq!(reader.fill(&mut out), 2);
/// assert_eq!(out, [0.5, 0.25, 0.0, 0.0]);
/// ```
#[must_use]
pub fn audio_fifo(capacity: usize, channels: u16) -> (FifoWriter, FifoReader) {
    let capacity = capacity.max(1);
    let (producer, consumer) = RingBuffer::new(capacity);
    let underruns = Arc::new(AtomicU64::new(0));
    let producing = Arc::new(AtomicBool::new(false));
    (
        FifoWriter {
            producer,
            capacity,
            underruns: Arc::clone(&underruns),
            producing: Arc::clone(&producing),
            started: false,
        },
        FifoReader {
            consumer,
            channels: usize::from(channels.max(1)),
            underruns,
            producing,
        },
    )
}

/// Côté producteur du FIFO (thread de staging).
///
/// Les underruns ne sont comptés qu'entre la première écriture et
/// [`FifoWriter::finish`] (ou le drop) : le silence de démarrage et de
/// fin de piste n'en est pas un.
pub struct FifoWriter {
    producer: Producer<f32>,
    capacity: usize,
    underruns: Arc<AtomicU64>,
    producing: Arc<AtomicBool>,
    started: bool,
}

impl FifoWriter {
    /// Écrit autant d'échantillons que possible sans bloquer.
    ///
    /// Returns how many samples were written (a prefix of `samples`).
    pub fn push(&mut self, samples: &[f32]) -> usize {
        let n = samples.len().min(self.producer.slots());
        if n == 0 {
            return 0;
        }
        let written = match self.producer.write_chunk_uninit(n) {
            Ok(chunk) => chunk.fill_from_iter(samples[..n].iter().copied()),
            Err(_) => 0,
        };
        if written > 0 && !self.started {
            self.started = true;
            self.producing.store(true, Ordering::Release);
        }
        written
    }

    /// Plus rien ne sera écrit : le silence qui suit n'est plus un underrun.
    pub fn finish(&mut self) {
        self.producing.store(false, Ordering::Release);
    }

    /// Écrit tout `samples`, en sondant toutes les `poll` tant que le FIFO
    /// est plein.
    ///
    /// Returns `false` if a stop was requested or the reader is gone before
    /// every sample could be written.
    pub fn push_all(&mut self, mut samples: &[f32], shutdown: &ShutdownFlag, poll: Duration) -> bool {
        loop {
            let written = self.push(samples);
            samples = &samples[written..];
            if samples.is_empty() {
                return true;
            }
            if shutdown.is_requested() || self.reader_dropped() {
                return false;
            }
            thread::sleep(poll);
        }
    }

    /// Échantillons en attente de lecture.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.capacity - self.producer.slots()
    }

    /// `true` once the reader has consumed everything written so far.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.buffered() == 0
    }

    /// `true` if the reader side has been dropped (output stream closed).
    #[must_use]
    pub fn reader_dropped(&self) -> bool {
        self.producer.is_abandoned()
    }

    /// Capacité en échantillons entrelacés.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lectures complétées par du silence pendant que le producteur était
    /// actif.
    #[must_use]
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

impl Drop for FifoWriter {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Côté consommateur du FIFO, déplacé dans le callback du driver audio.
///
/// [`FifoReader::fill`] ne bloque jamais, n'alloue jamais et ne prend
/// aucun verrou.
pub struct FifoReader {
    consumer: Consumer<f32>,
    channels: usize,
    underruns: Arc<AtomicU64>,
    producing: Arc<AtomicBool>,
}

impl FifoReader {
    /// Remplit `out` depuis le FIFO, complète par du silence en cas de
    /// sous-alimentation.
    ///
    /// Only whole frames (`channels` samples) are read so the interleaving
    /// stays aligned across partial reads. Returns the number of samples
    /// taken from the FIFO.
    pub fn fill(&mut self, out: &mut [f32]) -> usize {
        let available = self.consumer.slots();
        let wanted = out.len().min(available);
        let wanted = wanted - wanted % self.channels;

        let read = match self.consumer.read_chunk(wanted) {
            Ok(chunk) => {
                let (first, second) = chunk.as_slices();
                out[..first.len()].copy_from_slice(first);
                out[first.len()..wanted].copy_from_slice(second);
                chunk.commit_all();
                wanted
            }
            Err(_) => 0,
        };

        if read < out.len() {
            out[read..].fill(0.0);
            if self.producing.load(Ordering::Acquire) {
                self.underruns.fetch_add(1, Ordering::Relaxed);
            }
        }
        read
    }

    /// Échantillons disponibles immédiatement.
    #[must_use]
    pub fn available(&self) -> usize {
        self.consumer.slots()
    }
}
