use serde::{Deserialize, Serialize};

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP host configuration, read from `modules.api_ingress`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiIngressConfig {
    /// Empty means "use server.host:server.port".
    pub bind_addr: String,
    pub cors_enabled: bool,
    /// Exact browser origin allowed with credentials. `None` allows any origin.
    pub cors_origin: Option<String>,
    pub body_limit_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: String::new(),
            cors_enabled: true,
            cors_origin: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiIngressConfig {
    /// Fill `bind_addr` from the server section when the module leaves it empty.
    pub fn with_default_bind(mut self, host: &str, port: u16) -> Self {
        if self.bind_addr.trim().is_empty() {
            self.bind_addr = format!("{host}:{port}");
        }
        self
    }
}
