//! Headless training for serpent policies
//!
//! This module provides infrastructure for evolving policies without a GUI:
//! - The generation loop with progress reporting
//! - JSON statistics reports
//! - Character-grid previews of the champion

mod text_renderer;
mod training_env;

pub use text_renderer::TextRenderer;
pub use training_env::{TrainingEnv, TrainingReport, write_report};
