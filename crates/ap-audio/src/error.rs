use thiserror::Error;

/// Errors originating from the audio module.
///
/// Toutes sont terminales pour le chemin audio uniquement : la vidéo
/// continue, muette.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The media file cannot be opened or probed.
    #[error("Impossible d'ouvrir le média {path} : {reason}")]
    OpenMedia {
        /// Path that failed.
        path: String,
        /// Underlying cause.
        reason: String,
    },

    /// The container holds no playable audio track.
    #[error("Aucune piste audio dans le média")]
    NoAudioTrack,

    /// No decoder for the audio codec.
    #[error("Aucun décodeur pour la piste audio : {0}")]
    NoDecoder(String),

    /// Unsupported audio format.
    #[error("Format audio non supporté : {0}")]
    UnsupportedFormat(String),

    /// No audio output device found.
    #[error("Aucun périphérique audio de sortie trouvé")]
    NoOutputDevice,

    /// Audio output stream could not be built or started.
    #[error("Erreur de stream audio : {0}")]
    StreamError(String),
}
