use serde::{Deserialize, Serialize};

/// Body of the release check request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    /// Locally recorded version.
    pub version: String,
    /// Shared secret from the configuration.
    pub password: String,
}

/// Release metadata returned by `POST <endpoint>/releases/<release>` with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDescriptor {
    /// Version tag of the release.
    pub version: String,
    /// Download location of the update archive.
    pub uri: String,
    /// Echoed or rotated secret; not used further.
    #[serde(default)]
    pub password: String,
    /// Human-readable release label.
    pub name: String,
    /// Whether legacy cabinet directories should be removed after applying.
    #[serde(default)]
    pub delete_cabinet: bool,
}

/// Result of the release check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseCheck {
    /// HTTP 304: the recorded version is current.
    UpToDate,
    /// HTTP 200: a newer release is available.
    Available(ReleaseDescriptor),
}
