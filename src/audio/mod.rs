//! Audio decoding, clip shaping and encoding

pub mod decoder;
pub mod effects;
pub mod encoder;
pub mod resample;

pub use decoder::decode;
pub use encoder::{ClipEncoder, ExportSpec, FfmpegEncoder, WavEncoder};
