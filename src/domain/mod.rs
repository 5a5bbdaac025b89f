pub mod models;
pub mod playback_mode;
pub mod translator;
pub mod volume;
