//! Serpentine trainer
//!
//! Layered configuration and the headless training loop behind the
//! `serpentine` binary.

pub mod config;
pub mod headless;

pub use config::TrainingConfig;
pub use headless::{TrainingEnv, TrainingReport};
