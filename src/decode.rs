use enough::Stop;

use crate::cursor::ByteReader;
use crate::error::DecodeError;
use crate::limits::Limits;
use crate::pict::{self, DecodeOptions, Permissiveness, PictInfo};
use crate::progress::{NoProgress, Progress};
use crate::surface::PixelSurface;

/// Builder for decoding a picture from a byte slice.
///
/// ```no_run
/// use zenpict::{DecodeRequest, Limits, Permissiveness, Unstoppable};
///
/// let data: &[u8] = &[]; // picture file bytes
/// let limits = Limits {
///     max_pixels: Some(64 * 1024 * 1024),
///     ..Default::default()
/// };
/// let surface = DecodeRequest::new(data)
///     .with_limits(&limits)
///     .with_permissiveness(Permissiveness::Permissive)
///     .decode(Unstoppable)?;
/// let rgb = surface.to_rgb8()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    permissiveness: Permissiveness,
    progress: &'a dyn Progress,
    platform_prefix: bool,
}

impl<'a> DecodeRequest<'a> {
    /// Decode a standalone picture file, which starts with the 512-byte
    /// platform prefix.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            permissiveness: Permissiveness::default(),
            progress: &NoProgress,
            platform_prefix: true,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_permissiveness(mut self, permissiveness: Permissiveness) -> Self {
        self.permissiveness = permissiveness;
        self
    }

    /// Receive `row / (height - 1)` after every decoded row.
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// The data starts directly with the picture size field, as when a
    /// picture is embedded in another container.
    pub fn without_platform_prefix(mut self) -> Self {
        self.platform_prefix = false;
        self
    }

    /// Parse the header only.
    pub fn info(&self) -> Result<PictInfo, DecodeError> {
        let mut r = self.reader()?;
        PictInfo::parse(&mut r, self.permissiveness)
    }

    pub fn decode(self, stop: impl Stop) -> Result<PixelSurface, DecodeError> {
        let mut r = self.reader()?;
        let options = DecodeOptions {
            limits: self.limits,
            permissiveness: self.permissiveness,
            progress: self.progress,
        };
        pict::decode_picture_with(&mut r, options, &stop)
    }

    fn reader(&self) -> Result<ByteReader<'a>, DecodeError> {
        let mut r = ByteReader::new(self.data);
        if self.platform_prefix {
            r.skip(pict::PLATFORM_PREFIX_LEN)?;
        }
        Ok(r)
    }
}

impl core::fmt::Debug for DecodeRequest<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecodeRequest")
            .field("len", &self.data.len())
            .field("limits", &self.limits)
            .field("permissiveness", &self.permissiveness)
            .field("platform_prefix", &self.platform_prefix)
            .finish_non_exhaustive()
    }
}
