pub mod csv_bridge;
pub mod database;

pub use csv_bridge::{CoercionPolicy, CsvBridge, ImportOutcome};
pub use database::*;
