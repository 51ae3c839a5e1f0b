use std::time::{Duration, Instant};

/// Source de temps monotone + sommeil, injectable pour les tests du pacer.
pub trait Clock {
    /// Instant courant.
    fn now(&self) -> Instant;

    /// Bloque le thread appelant pendant `duration`.
    fn sleep(&self, duration: Duration);
}

/// Horloge système : `Instant::now()` et `thread::sleep`.
///
/// # Example
/// ```
/// use ap_core::clock::{Clock, SystemClock};
/// let clock = SystemClock;
/// let t0 = clock.now();
/// clock.sleep(std::time::Duration::from_millis(1));
/// assert!(clock.now() > t0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
