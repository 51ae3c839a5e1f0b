use std::time::Instant;

/// Mesure de la cadence réellement affichée.
///
/// Moyenne globale depuis la première frame. Aucune allocation.
///
/// # Example
/// ```
/// use ap_render::fps::FpsMeter;
/// use std::time::{Duration, Instant};
///
/// let mut meter = FpsMeter::new();
/// let t0 = Instant::now();
/// for i in 0..11u32 {
///     meter.tick(t0 + Duration::from_millis(100) * i);
/// }
/// assert!((meter.average_fps() - 10.0).abs() < 1e-6);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FpsMeter {
    first: Option<Instant>,
    last: Option<Instant>,
    frames: u64,
}

impl FpsMeter {
    /// Compteur vide.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appeler une fois par frame présentée.
    #[inline]
    pub fn tick(&mut self, now: Instant) {
        self.first.get_or_insert(now);
        self.last = Some(now);
        self.frames += 1;
    }

    /// Frames comptées.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// FPS moyen depuis la première frame ; 0 avant deux frames.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) if self.frames >= 2 => {
                let secs = last.duration_since(first).as_secs_f64();
                if secs > 0.0 {
                    (self.frames - 1) as f64 / secs
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_meter_reports_zero() {
        let meter = FpsMeter::new();
        assert_eq!(meter.frames(), 0);
        assert!(meter.average_fps().abs() < f64::EPSILON);
    }

    #[test]
    fn single_frame_has_no_rate() {
        let mut meter = FpsMeter::new();
        meter.tick(Instant::now());
        assert_eq!(meter.frames(), 1);
        assert!(meter.average_fps().abs() < f64::EPSILON);
    }

    #[test]
    fn average_spans_rate_changes() {
        let mut meter = FpsMeter::new();
        let mut t = Instant::now();
        // 10 intervalles de 100 ms puis 10 de 50 ms : 20 intervalles en 1.5 s
        for _ in 0..10 {
            meter.tick(t);
            t += Duration::from_millis(100);
        }
        for _ in 0..11 {
            meter.tick(t);
            t += Duration::from_millis(50);
        }
        assert_eq!(meter.frames(), 21);
        assert!((meter.average_fps() - 20.0 / 1.5).abs() < 1e-6);
    }
}
