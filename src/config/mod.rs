//! Optimizer Configuration Module
//!
//! Scoring thresholds, priority designations, model locations and server
//! settings loaded from TOML, replacing hardcoded values with
//! operator-tunable ones.
//!
//! ## Loading Order
//!
//! 1. `ALLOYMIND_CONFIG` environment variable (path to TOML file)
//! 2. `alloymind.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(OptimizerConfig::load());
//!
//! // Startup code that needs it:
//! let addr = &config::get().server.addr;
//! ```
//!
//! The pipeline itself never reads the global; it receives its settings
//! explicitly when it is built.

pub mod defaults;
mod optimizer_config;
pub mod validation;

pub use optimizer_config::*;

use std::sync::OnceLock;

static CONFIG: OnceLock<OptimizerConfig> = OnceLock::new();

/// Initialize the global configuration. Later calls are ignored.
pub fn init(config: OptimizerConfig) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Panics if `init()` has not been called; a missing config is a startup bug.
#[allow(clippy::expect_used)]
pub fn get() -> &'static OptimizerConfig {
    CONFIG
        .get()
        .expect("config::get() called before config::init(), this is a startup bug")
}

pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}
