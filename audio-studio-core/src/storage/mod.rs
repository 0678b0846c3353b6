pub mod decode;
pub mod export;
