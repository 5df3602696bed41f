//! Public playback URL construction.

/// Default storage host label.
pub const DEFAULT_STORAGE_HOST: &str = "s3";

/// Default domain suffix appended after the region.
pub const DEFAULT_DOMAIN_SUFFIX: &str = "amazonaws.com";

/// Fixed template for the URL at which a stored object is retrievable.
///
/// Renders `https://{bucket}.{storage_host}.{region}.{domain_suffix}/{key}`;
/// the `.{domain_suffix}` part is omitted when the suffix is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackUrlTemplate {
    pub bucket: String,
    pub storage_host: String,
    pub region: String,
    pub domain_suffix: String,
}

impl PlaybackUrlTemplate {
    /// Template for the standard AWS virtual-hosted form.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            storage_host: DEFAULT_STORAGE_HOST.to_string(),
            region: region.into(),
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_string(),
        }
    }

    pub fn with_storage_host(mut self, host: impl Into<String>) -> Self {
        self.storage_host = host.into();
        self
    }

    pub fn with_domain_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.domain_suffix = suffix.into();
        self
    }

    /// Render the URL for `key`.
    pub fn url_for(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.domain_suffix.is_empty() {
            format!(
                "https://{}.{}.{}/{}",
                self.bucket, self.storage_host, self.region, key
            )
        } else {
            format!(
                "https://{}.{}.{}.{}/{}",
                self.bucket, self.storage_host, self.region, self.domain_suffix, key
            )
        }
    }
}
