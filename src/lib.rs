pub mod app;
pub mod bridge;
pub mod domain;
pub mod integrations;
pub mod storage;
