use thiserror::Error;

/// Errors that can occur while opening or traversing a disc filesystem.
#[derive(Debug, Error)]
pub enum FsError {
    /// I/O error on the underlying byte stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image does not carry the expected filesystem signature
    #[error("unrecognized image format: {0}")]
    UnrecognizedFormat(String),

    /// Structurally invalid filesystem metadata
    #[error("corrupted image: {0}")]
    CorruptedImage(String),

    /// The stream is too short to hold the structure being read
    #[error("image too small: expected at least {expected} bytes, got {actual}")]
    TooSmall { expected: u64, actual: u64 },

    /// No descriptor satisfied any supported filesystem variant
    #[error("no supported filesystem variant: {0}")]
    UnsupportedVariant(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// A path component that must be a directory is a file
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A file operation was attempted on a directory
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// A write or create operation was attempted on a read-only filesystem
    #[error("filesystem is read-only: {0}")]
    ReadOnly(String),

    /// The operation is valid but not supported by this reader
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Symbolic link resolution exceeded the hop bound
    #[error("too many levels of symbolic links: {0}")]
    SymlinkLoop(String),
}

impl FsError {
    pub fn unrecognized(msg: impl Into<String>) -> Self {
        Self::UnrecognizedFormat(msg.into())
    }

    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::CorruptedImage(msg.into())
    }

    pub fn unsupported_variant(msg: impl Into<String>) -> Self {
        Self::UnsupportedVariant(msg.into())
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn directory_not_found(path: impl Into<String>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    pub fn read_only(msg: impl Into<String>) -> Self {
        Self::ReadOnly(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn symlink_loop(path: impl Into<String>) -> Self {
        Self::SymlinkLoop(path.into())
    }
}
