//! System-wide constants and default paths.

/// Default path of the agent state file.
pub const DEFAULT_STATE_FILE: &str = "/var/lib/berth/state.json";

/// Default path of the agent configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/berth/config.json";

/// Cluster name used when none is configured.
pub const DEFAULT_CLUSTER: &str = "default";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "berth";
