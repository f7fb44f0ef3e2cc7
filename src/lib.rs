pub mod args;
pub mod date;
pub mod error;
pub mod exiftool;
pub mod media;
pub mod processor;
pub mod sidecar;
pub mod updater;
