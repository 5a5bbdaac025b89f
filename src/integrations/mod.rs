pub mod beefweb;
pub mod dispatch;
pub mod mpris;
pub mod playback;
pub mod snapshot;
