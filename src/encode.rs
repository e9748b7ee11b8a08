use alloc::vec::Vec;

use enough::Stop;

use crate::cursor::ByteWriter;
use crate::error::EncodeError;
use crate::progress::{NoProgress, Progress};
use crate::psd;
use crate::surface::PixelSurface;

/// Builder for writing a surface as a layered image file.
///
/// PackBits compression is on by default.
#[derive(Clone, Copy)]
pub struct EncodeRequest<'a> {
    compress: bool,
    progress: &'a dyn Progress,
}

impl Default for EncodeRequest<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EncodeRequest<'a> {
    pub fn new() -> Self {
        Self {
            compress: true,
            progress: &NoProgress,
        }
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Receive a fraction after every written channel row.
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn encode(&self, surface: &PixelSurface, stop: impl Stop) -> Result<Vec<u8>, EncodeError> {
        let mut out = ByteWriter::new();
        self.encode_into(surface, &mut out, stop)?;
        Ok(out.into_inner())
    }

    /// Write at the cursor of `out`. On error `out` is truncated back to
    /// where writing started.
    pub fn encode_into(
        &self,
        surface: &PixelSurface,
        out: &mut ByteWriter,
        stop: impl Stop,
    ) -> Result<(), EncodeError> {
        psd::encode_layered(surface, out, self.compress, self.progress, &stop)
    }
}

impl core::fmt::Debug for EncodeRequest<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncodeRequest")
            .field("compress", &self.compress)
            .finish_non_exhaustive()
    }
}
