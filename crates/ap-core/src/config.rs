use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{CHARSET_STANDARD, Palette};
use crate::error::CoreError;

/// Configuration du lecteur.
///
/// Chaque champ a une valeur par défaut saine ; le fichier TOML et la CLI
/// ne font que surcharger.
///
/// # Example
/// ```
/// use ap_core::config::PlayerConfig;
/// let config = PlayerConfig::default();
/// assert_eq!((config.width, config.height), (130, 30));
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    // === Rendu ===
    /// Largeur de la grille en caractères.
    pub width: u16,
    /// Hauteur de la grille en caractères.
    pub height: u16,
    /// Charset du plus clair au plus dense.
    pub charset: String,
    /// Inverser la palette (pour fond clair).
    pub invert: bool,

    // === Audio ===
    /// Capacité du FIFO de staging, en secondes d'audio.
    pub fifo_seconds: f32,
    /// Période de sondage pendant la vidange du FIFO (ms).
    pub drain_poll_ms: u64,

    // === Logging ===
    /// Filtre env_logger par défaut (surchargé par RUST_LOG).
    pub log_level: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 130,
            height: 30,
            charset: CHARSET_STANDARD.to_string(),
            invert: false,
            fifo_seconds: 2.0,
            drain_poll_ms: 10,
            log_level: "warn".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Reject values the player cannot run with.
    ///
    /// # Errors
    /// Returns a [`CoreError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), CoreError> {
        log::debug!("Validation de la configuration : {self:?}");
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: u32::from(self.width),
                height: u32::from(self.height),
            });
        }
        if self.charset.is_empty() {
            return Err(CoreError::EmptyPalette);
        }
        if !(self.fifo_seconds.is_finite() && self.fifo_seconds > 0.0) {
            return Err(CoreError::Config(format!(
                "fifo_seconds doit être > 0 (reçu {})",
                self.fifo_seconds
            )));
        }
        if self.drain_poll_ms == 0 {
            return Err(CoreError::Config("drain_poll_ms doit être > 0".into()));
        }
        Ok(())
    }

    /// Palette built from `charset`, inverted if requested.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyPalette`] for an empty charset.
    ///
    /// # Example
    /// ```
    /// use ap_core::config::PlayerConfig;
    /// let config = PlayerConfig { charset: " .#@".into(), invert: true, ..Default::default() };
    /// assert_eq!(config.palette().unwrap().map(0), '@');
    /// ```
    pub fn palette(&self) -> Result<Palette, CoreError> {
        let palette = Palette::new(&self.charset)?;
        Ok(if self.invert {
            palette.inverted()
        } else {
            palette
        })
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    render: Option<RenderSection>,
    audio: Option<AudioSection>,
    log_level: Option<String>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    width: Option<u16>,
    height: Option<u16>,
    charset: Option<String>,
    invert: Option<bool>,
}

/// Audio section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct AudioSection {
    fifo_seconds: Option<f32>,
    drain_poll_ms: Option<u64>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the merged
/// configuration is invalid.
///
/// # Example
/// ```no_run
/// use ap_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PlayerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = PlayerConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.width {
            config.width = v;
        }
        if let Some(v) = r.height {
            config.height = v;
        }
        if let Some(v) = r.charset {
            config.charset = v;
        }
        if let Some(v) = r.invert {
            config.invert = v;
        }
    }
    if let Some(a) = file.audio {
        if let Some(v) = a.fifo_seconds {
            config.fifo_seconds = v;
        }
        if let Some(v) = a.drain_poll_ms {
            config.drain_poll_ms = v;
        }
    }
    if let Some(v) = file.log_level {
        config.log_level = v;
    }

    config
        .validate()
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::info!(
        "Configuration chargée depuis {} ({}×{})",
        path.display(),
        config.width,
        config.height
    );
    Ok(config)
}
