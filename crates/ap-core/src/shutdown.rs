use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Drapeau d'arrêt partagé entre le thread de rendu et le thread audio.
///
/// Initialement `false`, passe à `true` au plus une fois, jamais remis à zéro.
/// Les deux threads le sondent (jamais d'attente bloquante dessus).
///
/// # Example
/// ```
/// use ap_core::shutdown::ShutdownFlag;
/// let flag = ShutdownFlag::new();
/// let audio_side = flag.clone();
/// assert!(flag.request());
/// assert!(!flag.request());
/// assert!(audio_side.is_requested());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// New flag in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    #[inline]
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::AcqRel)
    }

    /// `true` once a stop has been requested.
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
