/// GPU image trait and image-related descriptors

use std::any::Any;

use crate::graphics_device::Extent3D;
use crate::image::{FilterMode, ImageType, InternalFormat, WrapMode};

/// Memory layout/access state of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    #[default]
    Undefined,
    CopySrc,
    CopyDst,
    ShaderResource,
    UnorderedAccess,
    RenderTarget,
    DepthStencil,
    Present,
}

/// Image memory tiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageTiling {
    #[default]
    Optimal,
    Linear,
}

bitflags::bitflags! {
    /// How an image will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const SAMPLED = 1 << 0;
        const STORAGE = 1 << 1;
        const TRANSFER_SRC = 1 << 2;
        const TRANSFER_DST = 1 << 3;
        const COLOR_ATTACHMENT = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
    }
}

/// Descriptor for creating a GPU image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuImageDesc {
    pub extent: Extent3D,
    pub format: InternalFormat,
    pub image_type: ImageType,
    pub tiling: ImageTiling,
    pub usage: ImageUsage,
    pub mip_levels: u32,
    /// Sampler filtering for the image's default sampler
    pub filter_mode: FilterMode,
    /// Sampler addressing for the image's default sampler
    pub wrap_mode: WrapMode,
}

impl GpuImageDesc {
    /// Array layers (6 for cubemaps)
    pub fn layers(&self) -> u32 {
        self.image_type.num_faces()
    }
}

/// Mip/layer range affected by a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceRange {
    pub base_mip_level: u32,
    pub mip_level_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl SubresourceRange {
    /// Every mip of every layer
    pub fn whole(mip_levels: u32, layers: u32) -> Self {
        Self {
            base_mip_level: 0,
            mip_level_count: mip_levels,
            base_layer: 0,
            layer_count: layers,
        }
    }

    /// A single mip level across `layers` layers
    pub fn mip(level: u32, layers: u32) -> Self {
        Self {
            base_mip_level: level,
            mip_level_count: 1,
            base_layer: 0,
            layer_count: layers,
        }
    }
}

/// Buffer → image copy region (one layer of mip 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferImageCopy {
    /// Offset into the source buffer in bytes
    pub buffer_offset: u64,
    pub mip_level: u32,
    pub layer: u32,
    pub extent: Extent3D,
}

/// Mip-to-mip downsampling blit over all layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBlit {
    pub src_mip_level: u32,
    pub src_extent: Extent3D,
    pub dst_mip_level: u32,
    pub dst_extent: Extent3D,
    pub layer_count: u32,
}

/// GPU image resource trait
///
/// Implemented by backend-specific image types (e.g., VulkanImage). Owns the
/// image memory, its view and its default sampler; all are destroyed on drop.
pub trait GpuImage: Send + Sync {
    /// Descriptor the image was created from
    fn desc(&self) -> &GpuImageDesc;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
