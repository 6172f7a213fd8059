pub mod app;
pub mod audio;
pub mod config;
pub mod model;
pub mod picker;
pub mod session;
pub mod ui;
