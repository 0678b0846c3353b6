pub mod context;
pub mod playback;
pub mod router;
