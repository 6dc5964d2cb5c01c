//! One-shot screen snapshot and its GPU texture.
//!
//! A [`DisplaySurface`] is read exactly once per session into a CPU-side
//! [`Snapshot`], which [`CaptureTexture::upload`] consumes: the pixels are
//! written to the GPU and the CPU buffer is dropped before the first frame.

use crate::gpu::SurfaceColorSpace;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture region is empty ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },
    #[error("row stride {stride} is narrower than a {width}px row")]
    StrideTooSmall { stride: u32, width: u32 },
    #[error("pixel buffer holds {actual} bytes, expected at least {expected}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("unsupported pixel format: {bits_per_pixel} bits per pixel")]
    UnsupportedFormat { bits_per_pixel: u32 },
    #[error("{width}x{height} exceeds the GPU texture limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
    #[error("display read failed: {0}")]
    Read(String),
}

/// Byte order of the captured pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Blue, green, red, unused; the usual 24-bit-depth X11 ZPixmap.
    Bgrx8,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelLayout::Bgrx8 => 4,
        }
    }

    fn texture_format(self, color_space: SurfaceColorSpace) -> wgpu::TextureFormat {
        match (self, color_space) {
            (PixelLayout::Bgrx8, SurfaceColorSpace::Gamma) => wgpu::TextureFormat::Bgra8Unorm,
            (PixelLayout::Bgrx8, SurfaceColorSpace::Linear) => {
                wgpu::TextureFormat::Bgra8UnormSrgb
            }
        }
    }
}

/// Still image of a screen region in CPU memory. Rows may be padded.
#[derive(Clone)]
pub struct Snapshot {
    width: u32,
    height: u32,
    stride: u32,
    layout: PixelLayout,
    pixels: Vec<u8>,
}

impl Snapshot {
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        layout: PixelLayout,
        pixels: Vec<u8>,
    ) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyRegion { width, height });
        }
        let row_bytes = width * layout.bytes_per_pixel();
        if stride < row_bytes {
            return Err(CaptureError::StrideTooSmall { stride, width });
        }
        let expected = stride as usize * (height as usize - 1) + row_bytes as usize;
        if pixels.len() < expected {
            return Err(CaptureError::ShortBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            layout,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Tightly packed RGBA copy with an opaque alpha channel.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        let row_bytes = (self.width * self.layout.bytes_per_pixel()) as usize;
        for row in self.pixels.chunks(self.stride as usize).take(self.height as usize) {
            for pixel in row[..row_bytes].chunks_exact(4) {
                match self.layout {
                    PixelLayout::Bgrx8 => rgba.extend_from_slice(&[pixel[2], pixel[1], pixel[0], 255]),
                }
            }
        }
        rgba
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("layout", &self.layout)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Read-only handle to the screen area being magnified.
pub trait DisplaySurface {
    /// Pixel size of the area.
    fn dimensions(&self) -> (u32, u32);

    /// Reads the current contents. Called once per session.
    fn read_pixels(&mut self) -> Result<Snapshot, CaptureError>;
}

/// The snapshot as an immutable, bilinear-filtered GPU texture.
pub(crate) struct CaptureTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl CaptureTexture {
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        snapshot: Snapshot,
        color_space: SurfaceColorSpace,
    ) -> Result<Self, CaptureError> {
        let limit = device.limits().max_texture_dimension_2d;
        if snapshot.width > limit || snapshot.height > limit {
            return Err(CaptureError::TooLarge {
                width: snapshot.width,
                height: snapshot.height,
                limit,
            });
        }

        let extent = wgpu::Extent3d {
            width: snapshot.width,
            height: snapshot.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: snapshot.layout.texture_format(color_space),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &snapshot.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(snapshot.stride),
                rows_per_image: Some(snapshot.height),
            },
            extent,
        );
        tracing::debug!(
            width = snapshot.width,
            height = snapshot.height,
            stride = snapshot.stride,
            "uploaded capture texture"
        );
        drop(snapshot);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("capture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            _texture: texture,
            view,
            sampler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_region() {
        let err = Snapshot::new(0, 10, 0, PixelLayout::Bgrx8, Vec::new()).unwrap_err();
        assert_eq!(
            err,
            CaptureError::EmptyRegion {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn rejects_narrow_stride() {
        let err = Snapshot::new(4, 1, 12, PixelLayout::Bgrx8, vec![0; 16]).unwrap_err();
        assert_eq!(err, CaptureError::StrideTooSmall { stride: 12, width: 4 });
    }

    #[test]
    fn rejects_short_buffer() {
        let err = Snapshot::new(2, 2, 8, PixelLayout::Bgrx8, vec![0; 12]).unwrap_err();
        assert_eq!(
            err,
            CaptureError::ShortBuffer {
                expected: 16,
                actual: 12
            }
        );
    }

    #[test]
    fn padded_rows_convert_to_packed_rgba() {
        // 1x2 image with 4 bytes of row padding.
        let pixels = vec![
            10, 20, 30, 0, 0xAA, 0xAA, 0xAA, 0xAA, //
            40, 50, 60, 0, 0xBB, 0xBB, 0xBB, 0xBB,
        ];
        let snapshot = Snapshot::new(1, 2, 8, PixelLayout::Bgrx8, pixels).unwrap();
        assert_eq!(snapshot.to_rgba(), vec![30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn last_row_needs_no_padding() {
        let snapshot = Snapshot::new(1, 2, 8, PixelLayout::Bgrx8, vec![0; 12]);
        assert!(snapshot.is_ok());
    }
}
