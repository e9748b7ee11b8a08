use alloc::string::String;
use enough::StopReason;

use crate::pixel::Channel;

/// Errors from the PackBits codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RleError {
    /// A control byte promised more input than was available.
    #[error("run-length input ended inside a run at offset {offset}")]
    TruncatedInput { offset: usize },

    /// A run would write past the end of the destination buffer.
    #[error("run-length output overflows destination at input offset {offset}")]
    TruncatedOutput { offset: usize },
}

/// Errors from allocating or addressing a [`crate::PixelSurface`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SurfaceError {
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unsupported bits per pixel: {0}")]
    UnsupportedDepth(u8),

    #[error("palette has {0} entries, need 2..=256")]
    PaletteSize(usize),

    #[error("channel masks overlap")]
    OverlappingMasks,

    #[error("color descriptor does not fit {bits_per_pixel} bits per pixel")]
    DescriptorMismatch { bits_per_pixel: u8 },

    #[error("surface has no {0:?} channel")]
    MissingChannel(Channel),

    #[error("row {row} out of range (height {height})")]
    RowOutOfRange { row: u32, height: u32 },

    #[error("row length mismatch: expected {expected}, got {actual}")]
    RowLength { expected: usize, actual: usize },

    #[error("surface stores packed 16-bit words, not byte planes")]
    PackedStorage,

    #[error("surface stores byte planes, not packed 16-bit words")]
    PlanarStorage,
}

/// Errors from decoding a picture container.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("unexpected end of stream at offset {offset}")]
    TruncatedStream { offset: usize },

    #[error("buffer too small for declared length at offset {offset}")]
    TruncatedOutput { offset: usize },

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for DecodeError {
    fn from(r: StopReason) -> Self {
        DecodeError::Cancelled(r)
    }
}

impl From<RleError> for DecodeError {
    fn from(e: RleError) -> Self {
        match e {
            RleError::TruncatedInput { offset } => DecodeError::TruncatedStream { offset },
            RleError::TruncatedOutput { offset } => DecodeError::TruncatedOutput { offset },
        }
    }
}

/// Errors from encoding a layered image.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error(
        "compressed length of {channel:?} row {row} changed between passes: {expected} vs {actual}"
    )]
    InconsistentCompression {
        channel: Channel,
        row: u32,
        expected: usize,
        actual: usize,
    },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for EncodeError {
    fn from(r: StopReason) -> Self {
        EncodeError::Cancelled(r)
    }
}
