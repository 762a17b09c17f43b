// Library surface for headless/integration tests and reuse.
// The binary in main.rs only parses flags and owns the terminal.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod feedback;
pub mod generator;
pub mod question;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod util;
