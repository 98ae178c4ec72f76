// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Elastic Builder";

/// Log target prefix shared by the codec and server crates
pub const APP_NAME_LOWER: &str = "elastic_builder";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".elastic-builder";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "elastic-builder.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "ELASTIC_BUILDER_CONFIG";

/// Environment variable for a FieldMap JSON file
pub const ENV_FIELDS: &str = "ELASTIC_BUILDER_FIELDS";

// =============================================================================
// Environment Variables - Debug
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "ELASTIC_BUILDER_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "ELASTIC_BUILDER_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "ELASTIC_BUILDER_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "ELASTIC_BUILDER_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Default request body limit: 1MB
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Request Limits
// =============================================================================

/// Maximum top-level clauses in a decode request
pub const MAX_QUERY_CLAUSES: u64 = 1_000;

/// Maximum top-level nodes in an encode request
pub const MAX_FILTER_NODES: u64 = 1_000;

/// Highest nesting level the styles endpoint answers for
pub const MAX_STYLE_LEVEL: usize = 64;
