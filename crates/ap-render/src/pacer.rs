use std::time::{Duration, Instant};

use ap_core::clock::{Clock, SystemClock};
use ap_core::error::CoreError;

/// Cadenceur de frames à correction de dérive.
///
/// Toutes les échéances d'une époque sont calculées depuis la même ancre :
/// `anchor + frame_duration * frames_since_anchor`. Une erreur d'arrondi ou
/// un réveil tardif sur une frame ne se reporte donc pas sur les suivantes.
///
/// Si l'échéance est déjà dépassée, le pacer ne tente pas de rattraper :
/// il ré-ancre l'époque sur l'instant présent et rend la main immédiatement.
///
/// # Example
/// ```
/// use ap_render::pacer::FramePacer;
/// let mut pacer = FramePacer::new(200.0).unwrap();
/// let slept = pacer.sleep();
/// assert!(slept <= pacer.frame_duration());
/// ```
pub struct FramePacer<C: Clock = SystemClock> {
    clock: C,
    /// Durée d'une frame en secondes (1 / fps).
    frame_secs: f64,
    /// Début de l'époque courante.
    anchor: Instant,
    /// Frames cadencées depuis l'ancre (1 juste après un ré-ancrage).
    frames_since_anchor: u32,
    /// Nombre de ré-ancrages (frames en retard).
    resets: u64,
}

impl FramePacer<SystemClock> {
    /// Pacer on the system clock.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrameRate`] if `fps` is not a finite,
    /// strictly positive rate.
    pub fn new(fps: f64) -> Result<Self, CoreError> {
        Self::with_clock(fps, SystemClock)
    }
}

impl<C: Clock> FramePacer<C> {
    /// Pacer on an arbitrary clock. The first epoch starts now.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrameRate`] if `fps` is not a finite,
    /// strictly positive rate, or if `1 / fps` does not fit in a `Duration`.
    pub fn with_clock(fps: f64, clock: C) -> Result<Self, CoreError> {
        let frame_secs = 1.0 / fps;
        if !(fps.is_finite() && fps > 0.0) || Duration::try_from_secs_f64(frame_secs).is_err() {
            return Err(CoreError::InvalidFrameRate { fps });
        }
        let anchor = clock.now();
        Ok(Self {
            clock,
            frame_secs,
            anchor,
            frames_since_anchor: 1,
            resets: 0,
        })
    }

    /// Échéance de la prochaine frame.
    ///
    /// `None` only if the deadline is not representable (absurdly low fps
    /// after a very long epoch).
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        let offset = self.frame_secs * f64::from(self.frames_since_anchor);
        Duration::try_from_secs_f64(offset)
            .ok()
            .and_then(|d| self.anchor.checked_add(d))
    }

    /// Dort jusqu'à l'échéance de la frame courante.
    ///
    /// Retourne la durée dormie ; `Duration::ZERO` si le pacer était en
    /// retard, auquel cas une nouvelle époque commence maintenant.
    pub fn sleep(&mut self) -> Duration {
        let now = self.clock.now();
        let remaining = self
            .deadline()
            .and_then(|target| target.checked_duration_since(now));

        if let Some(remaining) = remaining {
            self.clock.sleep(remaining);
            self.frames_since_anchor = self.frames_since_anchor.saturating_add(1);
            remaining
        } else {
            log::debug!(
                "Pacer en retard après {} frames, ré-ancrage",
                self.frames_since_anchor
            );
            self.anchor = now;
            self.frames_since_anchor = 1;
            self.resets += 1;
            Duration::ZERO
        }
    }

    /// 1 / fps.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_secs)
    }

    /// Début de l'époque courante.
    #[must_use]
    pub fn anchor(&self) -> Instant {
        self.anchor
    }

    /// Frames cadencées depuis l'ancre courante.
    #[must_use]
    pub fn frames_since_anchor(&self) -> u32 {
        self.frames_since_anchor
    }

    /// Nombre d'époques abandonnées pour cause de retard.
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.resets
    }
}
