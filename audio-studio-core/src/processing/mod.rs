pub mod analyzer;
pub mod bands;
pub mod offline_mixer;
pub mod ring_buffer;
pub mod tap;
pub mod wav_format;
