//! # tariff-core
//!
//! Foundation crate for the tariff stacking engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::AppConfig;
pub use errors::error_code::TariffErrorCode;
pub use types::hts::HtsCode;
pub use types::money::Money;
pub use types::program::{DisclaimBehavior, ProgramId};
