//! Audio output
//!
//! - `rodio_audio` plays narration files through rodio on a dedicated thread

pub mod rodio_audio;

pub use rodio_audio::RodioAudio;
