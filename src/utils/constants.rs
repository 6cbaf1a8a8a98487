//! Shared constants and defaults

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_EXPIRY_SKEW_SECS: u64 = 30;
pub const DEFAULT_STORE_PATH: &str = "credentials.db";

// Instance metadata endpoint
pub const METADATA_BASE_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default";
pub const METADATA_TOKEN_PATH: &str = "token";
pub const METADATA_SCOPES_PATH: &str = "scopes";
pub const METADATA_EMAIL_PATH: &str = "email";
pub const METADATA_HEADER_NAME: &str = "Metadata-Flavor";
pub const METADATA_HEADER_VALUE: &str = "Google";

// OAuth
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_TYPE_JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

// Credential database discovery
pub const CREDENTIALS_DB_SEARCH_PLACES: [&str; 2] = ["/home/", "/root/"];
pub const GCLOUD_CONFIG_DIR: &str = ".config/gcloud";
pub const GCLOUD_CREDENTIALS_DB: &str = "credentials.db";
pub const GCLOUD_ACCESS_TOKENS_DB: &str = "access_tokens.db";
