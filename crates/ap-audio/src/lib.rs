// Audio decoding, staging, and playback for asciiplay.

pub mod decode;
pub mod error;
pub mod fifo;
pub mod output;
pub mod staging;

pub use error::AudioError;
