pub mod config;
pub mod console;
pub mod logging;
pub mod scenario;
pub mod services;
