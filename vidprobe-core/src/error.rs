use thiserror::Error;

/// Error taxonomy for vidprobe operations.
///
/// Every public entry point of this crate returns `CoreResult`; no failure
/// escapes as a panic across the API boundary.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The supplied media path does not reference an existing file.
    #[error("File does not exist: {0}")]
    InputNotFound(String),

    /// The configured ffprobe executable is missing.
    #[error("ffprobe could not be found {0}")]
    ToolNotFound(String),

    /// The subprocess could not be started.
    #[error("Cannot start ffprobe: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// Neither process exit nor output completion occurred within the bound.
    #[error("Timeout reached {0} (ms)")]
    Timeout(u64),

    /// The caller-supplied cancellation signal fired while the probe was running.
    #[error("Probe cancelled")]
    Cancelled,

    /// The tool exited but produced neither container nor stream information.
    #[error("No feedback from ffprobe")]
    NoOutput,

    #[error("Failed to parse ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Result type for vidprobe operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
