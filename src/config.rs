use serde::{Deserialize, Serialize};

/// Service-level settings shared by the transport and the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Address the HTTP server binds to
    /// Default: 0.0.0.0:5000
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Page size used when a list request omits `size`
    /// Default: 5
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound on any requested page size
    /// Default: 100
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_page_size() -> usize {
    5
}

fn default_max_page_size() -> usize {
    100
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Resolve a requested page size: missing means the default, and the
    /// result never exceeds `max_page_size`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}
