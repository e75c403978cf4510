/// Application name used for config and data directories.
pub const APP_NAME: &str = "pinsync";

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// File name of the canonical store inside the data directory.
pub const STORE_FILENAME: &str = "canonical.json";
