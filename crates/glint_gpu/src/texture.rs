//! GPU textures for uploaded text bitmaps

use crate::GpuError;
use glint_core::{DataFormat, TextureDesc};
use wgpu::util::DeviceExt;

/// wgpu format for an upload format. 4444 has no sampled wgpu equivalent.
pub fn texture_format(format: DataFormat) -> Option<wgpu::TextureFormat> {
    match format {
        DataFormat::R8Unorm => Some(wgpu::TextureFormat::R8Unorm),
        DataFormat::Rgba8888 => Some(wgpu::TextureFormat::Rgba8Unorm),
        DataFormat::Rgba4444 => None,
    }
}

/// Check a texture description against a maximum dimension
pub(crate) fn validate(desc: &TextureDesc<'_>, max_dim: u32) -> Result<wgpu::TextureFormat, GpuError> {
    let format = texture_format(desc.format).ok_or(GpuError::UnsupportedFormat(desc.format))?;

    if desc.width == 0 || desc.height == 0 || desc.width > max_dim || desc.height > max_dim {
        return Err(GpuError::InvalidSize {
            width: desc.width,
            height: desc.height,
            max: max_dim,
        });
    }

    let expected = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel();
    if desc.data.len() != expected {
        return Err(GpuError::DataLength {
            expected,
            actual: desc.data.len(),
        });
    }
    Ok(format)
}

/// A sampled texture holding one string bitmap
pub struct GpuTexture {
    /// The GPU texture
    texture: wgpu::Texture,
    /// Texture view for sampling
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: DataFormat,
}

impl GpuTexture {
    /// Create a texture initialized with `desc.data`
    pub fn from_desc(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desc: &TextureDesc<'_>,
    ) -> Result<Self, GpuError> {
        let format = validate(desc, device.limits().max_texture_dimension_2d)?;

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(desc.tag),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            desc.data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        })
    }

    /// Get the texture view for binding
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    /// Bytes of texel data
    pub fn data_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Free the GPU memory now rather than when the last reference drops
    pub fn destroy(self) {
        self.texture.destroy();
    }
}
