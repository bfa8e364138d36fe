//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Per-request timeout. Batch generation of ten questions routinely takes 20-40s.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

    /// User agent sent to providers
    pub const USER_AGENT: &str = "Quizbank/0.1";
}

/// Generation provider configuration
pub mod generation {
    /// Default Generative Language API host
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

    /// Environment variable holding the provider API key
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

    /// Sampling temperature for question generation
    pub const TEMPERATURE: f32 = 0.7;
}

/// Question bank configuration
pub mod bank {
    /// Questions generated per refill
    pub const REFILL_SIZE: usize = 10;

    /// Questions delivered per category per run
    pub const PACK_SIZE: usize = 5;

    /// SQLite file name inside the data directory
    pub const DATABASE_FILE_NAME: &str = "bank.db";
}

/// Retry defaults for the request executor
pub mod retry {
    use super::*;

    pub const MAX_RETRIES: u32 = 3;
    pub const INITIAL_DELAY: Duration = Duration::from_secs(1);
    pub const MAX_DELAY: Duration = Duration::from_secs(16);

    /// Providers enforce per-minute quotas; a 429 is not worth retrying sooner.
    pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);
}

/// Filesystem layout
pub mod fs {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".quizbank";

    /// Config file name inside the config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}
