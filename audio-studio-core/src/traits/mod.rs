pub mod analysis_service;
pub mod audio_sink;
pub mod capture_backend;
pub mod media_element;
pub mod router_delegate;
