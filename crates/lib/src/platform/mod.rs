//! Platform-specific locations for configuration and persisted state.

pub mod paths;
