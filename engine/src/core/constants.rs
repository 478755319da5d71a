// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "QuerySift";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".querysift";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "querysift.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "QUERYSIFT_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "QUERYSIFT_LOG";

/// Default log filter when neither QUERYSIFT_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,querysift=info,querysift_engine=info";

// =============================================================================
// Environment Variables - Rendering
// =============================================================================

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "QUERYSIFT_DIALECT";

/// Environment variable for the comma-separated truthy token list
pub const ENV_TRUTHY_TOKENS: &str = "QUERYSIFT_TRUTHY_TOKENS";

// =============================================================================
// Rendering Defaults
// =============================================================================

/// Table name used when the `render` command is not given one
pub const DEFAULT_TABLE: &str = "records";
