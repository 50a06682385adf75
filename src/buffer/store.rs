use std::sync::{Arc, RwLock};

use crate::buffer::raster::Raster;
use crate::format::convert::{decode_pixels, encode_pixels};
use crate::foundation::core::Rectangle;
use crate::foundation::error::{PixError, PixResult};
use crate::format::pixel::PixelFormat;

struct BufferInner {
    extent: Rectangle,
    format: PixelFormat,
    data: RwLock<Vec<u8>>,
}

/// Shared-ownership pixel store over a fixed rectangle and pixel format.
///
/// Cloning a `Buffer` adds an owner; [`Buffer::release`] (or dropping) removes one. Storage is
/// freed when the last owner lets go, so a released buffer can never be observed.
///
/// The backing store is always exactly `width * height * bytes_per_pixel` bytes.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("extent", &self.inner.extent)
            .field("format", &self.inner.format.name())
            .field("owners", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl Buffer {
    /// Allocate a zero-initialized buffer.
    pub fn new(extent: Rectangle, format: PixelFormat) -> PixResult<Self> {
        let len = format
            .byte_len(extent.width, extent.height)
            .ok_or_else(|| PixError::validation(format!("buffer {extent} is too large")))?;
        Ok(Self {
            inner: Arc::new(BufferInner {
                extent,
                format,
                data: RwLock::new(vec![0u8; len]),
            }),
        })
    }

    /// Region the buffer was created with.
    pub fn extent(&self) -> Rectangle {
        self.inner.extent
    }

    /// Format the buffer was created with.
    pub fn format(&self) -> &PixelFormat {
        &self.inner.format
    }

    /// Size of the backing store in bytes.
    pub fn byte_len(&self) -> usize {
        self.inner
            .format
            .byte_len(self.inner.extent.width, self.inner.extent.height)
            .unwrap_or(0)
    }

    /// Number of live owners (creator, nodes, clones).
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Return `true` if both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Drop this owner. Storage is freed when no owners remain.
    pub fn release(self) {
        drop(self);
    }

    /// Write `data`, encoded as `format`, into `rect`.
    ///
    /// `data` must be exactly `rect.width * rect.height * format.bytes_per_pixel()` bytes with a
    /// row stride of `rect.width * format.bytes_per_pixel()`; any other length fails with
    /// [`PixError::SizeMismatch`]. Only the addressed sub-region is modified, and a payload format
    /// different from the buffer's own is converted.
    ///
    /// The write is clipped to the buffer extent. Pixels of `rect` outside it are dropped, and a
    /// `rect` entirely outside writes nothing and still succeeds.
    #[tracing::instrument(level = "trace", skip(self, format, data), fields(format = %format))]
    pub fn set(&self, rect: Rectangle, format: &PixelFormat, data: &[u8]) -> PixResult<()> {
        let expected = format
            .byte_len(rect.width, rect.height)
            .ok_or_else(|| PixError::validation(format!("region {rect} is too large")))?;
        if data.len() != expected {
            return Err(PixError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let extent = self.inner.extent;
        let overlap = rect.intersect(extent);
        if overlap.is_empty() {
            tracing::debug!(%rect, %extent, "buffer write lies outside extent, nothing written");
            return Ok(());
        }
        if overlap != rect {
            tracing::debug!(%rect, %extent, "buffer write clipped to extent");
        }

        let own = &self.inner.format;
        let src_bpp = format.bytes_per_pixel();
        let dst_bpp = own.bytes_per_pixel();
        let src_stride = rect.width as usize * src_bpp;
        let dst_stride = extent.width as usize * dst_bpp;
        let w = overlap.width as usize;
        let mut scratch = vec![[0.0f32; 4]; if format == own { 0 } else { w }];

        let mut store = self
            .inner
            .data
            .write()
            .map_err(|_| PixError::poisoned("buffer"))?;
        for y in overlap.y as i64..overlap.bottom() {
            let sx = (i64::from(overlap.x) - i64::from(rect.x)) as usize;
            let sy = (y - i64::from(rect.y)) as usize;
            let src = &data[sy * src_stride + sx * src_bpp..][..w * src_bpp];

            let dx = (i64::from(overlap.x) - i64::from(extent.x)) as usize;
            let dy = (y - i64::from(extent.y)) as usize;
            let dst = &mut store[dy * dst_stride + dx * dst_bpp..][..w * dst_bpp];

            if format == own {
                dst.copy_from_slice(src);
            } else {
                decode_pixels(format, src, &mut scratch);
                encode_pixels(own, &scratch, dst);
            }
        }
        Ok(())
    }

    /// Read `rect` back, encoded as `format`. Pixels outside the extent read as transparent.
    pub fn get(&self, rect: Rectangle, format: &PixelFormat) -> PixResult<Vec<u8>> {
        let len = format
            .byte_len(rect.width, rect.height)
            .ok_or_else(|| PixError::validation(format!("region {rect} is too large")))?;
        if format == &self.inner.format && rect == self.inner.extent {
            let store = self
                .inner
                .data
                .read()
                .map_err(|_| PixError::poisoned("buffer"))?;
            return Ok(store.clone());
        }
        let raster = self.read_raster(rect)?;
        let mut out = vec![0u8; len];
        encode_pixels(format, raster.pixels(), &mut out);
        Ok(out)
    }

    /// Decode `rect` into the working representation.
    pub(crate) fn read_raster(&self, rect: Rectangle) -> PixResult<Raster> {
        let mut out = Raster::new(rect);
        let extent = self.inner.extent;
        let overlap = rect.intersect(extent);
        if overlap.is_empty() {
            return Ok(out);
        }
        let own = &self.inner.format;
        let bpp = own.bytes_per_pixel();
        let stride = extent.width as usize * bpp;
        let w = overlap.width as usize;

        let store = self
            .inner
            .data
            .read()
            .map_err(|_| PixError::poisoned("buffer"))?;
        for y in overlap.y as i64..overlap.bottom() {
            let sx = (i64::from(overlap.x) - i64::from(extent.x)) as usize;
            let sy = (y - i64::from(extent.y)) as usize;
            let src = &store[sy * stride + sx * bpp..][..w * bpp];
            let di = rect.index_of(i64::from(overlap.x), y);
            decode_pixels(own, src, &mut out.pixels_mut()[di..di + w]);
        }
        Ok(out)
    }

    /// Build a buffer holding `raster` encoded as `format`.
    pub(crate) fn from_raster(raster: &Raster, format: PixelFormat) -> PixResult<Buffer> {
        let buffer = Buffer::new(raster.rect(), format)?;
        {
            let mut store = buffer
                .inner
                .data
                .write()
                .map_err(|_| PixError::poisoned("buffer"))?;
            encode_pixels(&buffer.inner.format, raster.pixels(), &mut store);
        }
        Ok(buffer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/store.rs"]
mod tests;
