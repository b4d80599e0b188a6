use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("ray direction must be unit length, got length {0}")]
    NonUnitDirection(f64),

    #[error("camera basis is degenerate: forward is zero or parallel to world up")]
    DegenerateCamera,

    #[error("failed to read config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error - {0}")]
    Io(#[from] std::io::Error),

    #[error("image error - {0}")]
    Image(#[from] image::ImageError),

    #[error("thread pool error - {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
