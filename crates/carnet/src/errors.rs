//! Error types for carnet.
use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use thiserror::Error;

macro_rules! impl_debug_for_error {
    ($($t:ty),*) => {
        $(
            impl Debug for $t {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    // Rust uses the Debug trait to show errors when they're returned from main,
                    // but thiserror renders through Display. This redirects Debug to Display.
                    write!(f, "{}", self)
                }
            }
        )*
    };
}

#[derive(Error)]
pub enum ContentError {
    #[error("Failed to read content file: {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid content glob pattern: {pattern}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Front matter of {path} could not be parsed")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("A code block in {path} could not be highlighted")]
    Highlight {
        path: PathBuf,
        #[source]
        source: syntect::Error,
    },
}

#[derive(Error)]
pub enum BuildError {
    #[error("Failed to write page to {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to copy static files from {path}")]
    StaticCopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize the posts metadata export")]
    MetadataSerialize {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum CarnetError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl_debug_for_error!(ContentError, BuildError);
