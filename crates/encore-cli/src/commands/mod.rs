//! CLI command implementations.

pub mod presets;
pub mod settings;
pub mod simulate;
