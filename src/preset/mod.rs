//! Named Spark application presets.
//!
//! A preset is a YAML document in the preset directory describing one
//! application: its entry point, positional arguments and `--conf` overrides.
//! The [`PresetRegistry`] loads the whole directory at startup; requests only
//! ever refer to presets by name.

pub mod definition;
pub mod registry;

pub use definition::{Preset, PresetError};
pub use registry::PresetRegistry;
