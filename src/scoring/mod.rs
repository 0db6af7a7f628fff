pub mod config;
pub mod factors;
pub mod engine;
pub mod validation;

pub use config::*;
pub use engine::{composite_index, enrich, enrich_record, evaluate_alert};
pub use validation::validate_settings;
