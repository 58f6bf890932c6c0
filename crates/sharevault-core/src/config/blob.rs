//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Provider to use: `"local"`, `"s3"`, or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Local filesystem settings.
    #[serde(default)]
    pub local: LocalBlobConfig,
    /// S3 settings.
    #[serde(default)]
    pub s3: S3BlobConfig,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            local: LocalBlobConfig::default(),
            s3: S3BlobConfig::default(),
        }
    }
}

/// Local filesystem blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBlobConfig {
    /// Root path for stored objects.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalBlobConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// S3 blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3BlobConfig {
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for S3BlobConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_local_root() -> String {
    "data/blobs".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}
