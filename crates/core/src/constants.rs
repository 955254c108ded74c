/// Constants used throughout the envlink codebase
// Reference prefixes
pub const SECRET_REFERENCE_PREFIX: &str = "$SecretKeyRef:";
pub const CONFIG_MAP_REFERENCE_PREFIX: &str = "$ConfigMapKeyRef:";

// Query parameter selecting file materialization
pub const TEMP_FILE_PARAM: &str = "tempFile";

// Ambient signals injected by the hosting platform
pub const FUNCTION_NAME_VAR: &str = "FUNCTION_NAME";
pub const FUNCTION_REGION_VAR: &str = "FUNCTION_REGION";
pub const FUNCTION_PROJECT_VAR: &str = "GCP_PROJECT";
pub const SERVICE_NAME_VAR: &str = "K_SERVICE";
pub const SERVICE_PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";
pub const SERVICE_REGION_VAR: &str = "REGION";

// Credential overrides
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const METADATA_HOST_VAR: &str = "GCE_METADATA_HOST";

// envlink settings
pub const ENVLINK_LOG_VAR: &str = "ENVLINK_LOG";
pub const ENVLINK_REQUEST_TIMEOUT_VAR: &str = "ENVLINK_REQUEST_TIMEOUT_SECS";
pub const ENVLINK_DEADLINE_VAR: &str = "ENVLINK_DEADLINE_SECS";
pub const ENVLINK_MAX_CONCURRENT_VAR: &str = "ENVLINK_MAX_CONCURRENT";
pub const ENVLINK_MISSING_KEY_VAR: &str = "ENVLINK_MISSING_KEY";
pub const ENVLINK_TEMP_DIR_VAR: &str = "ENVLINK_TEMP_DIR";

// Defaults
pub const DEFAULT_SERVICE_REGION: &str = "us-central1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DEADLINE_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
pub const TEMP_FILE_PREFIX: &str = "envlink-";

// Google APIs
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const FUNCTIONS_API_URL: &str = "https://cloudfunctions.googleapis.com/v1";
pub const RUN_API_URL_TEMPLATE: &str = "https://{region}-run.googleapis.com/apis/serving.knative.dev/v1";
pub const CONTAINER_API_URL: &str = "https://container.googleapis.com/v1";
pub const METADATA_URL: &str = "http://metadata.google.internal";

pub const USER_AGENT: &str = concat!(
    "envlink/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/envlink/envlink)"
);
