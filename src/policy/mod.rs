//! Policy Store
//!
//! Tunable governance parameters and pure queries over them:
//! - Severity thresholds for sensor readings
//! - Event-correlation window
//! - Crew and consensus sizing rules

mod store;

pub use store::PolicyStore;
