/// GraphicsDevice trait - GPU resource factory and submission interface

use std::any::Any;

use crate::error::Result;
use crate::graphics_device::{
    BufferDesc, CommandList, CommandListLevel, DescriptorSetLayoutDesc, DescriptorWrite,
    FramebufferDesc, GpuBuffer, GpuDescriptorSets, GpuFramebuffer, GpuImage, GpuImageDesc,
    GpuPipeline, GpuRenderPass, GpuShaderModule, ImageTiling, ImageUsage, PipelineDesc,
    RenderPassDesc, ShaderModuleDesc,
};
use crate::image::{ImageType, InternalFormat};

// ============================================================================
// Common types
// ============================================================================

/// Device configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Number of frames the CPU may record ahead of the GPU
    pub frames_in_flight: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Hyperion Application".to_string(),
            app_version: (1, 0, 0),
            frames_in_flight: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent3D {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    /// Extent of mip level `level` (each axis halves, never below 1)
    pub fn mip(&self, level: u32) -> Self {
        Self {
            width: (self.width >> level).max(1),
            height: (self.height >> level).max(1),
            depth: (self.depth >> level).max(1),
        }
    }
}

impl From<Extent2D> for Extent3D {
    fn from(extent: Extent2D) -> Self {
        Self::new(extent.width, extent.height, 1)
    }
}

bitflags::bitflags! {
    /// Format capabilities a device reports for a given tiling
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFeatures: u32 {
        const SAMPLED_IMAGE = 1 << 0;
        const STORAGE_IMAGE = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 3;
        const BLIT_SRC = 1 << 4;
        const BLIT_DST = 1 << 5;
        const SAMPLED_IMAGE_FILTER_LINEAR = 1 << 6;
    }
}

/// Format/tiling/usage combination probed before allocating an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormatQuery {
    pub format: InternalFormat,
    pub image_type: ImageType,
    pub tiling: ImageTiling,
    pub usage: ImageUsage,
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Main graphics device trait
///
/// Central factory for GPU objects and the submission point for one-time
/// command work. Implemented by backend devices (e.g. `VulkanGraphicsDevice`).
/// Every handle it returns frees its GPU object when dropped.
pub trait GraphicsDevice: Send {
    /// Number of per-frame resource copies (frames in flight)
    fn frames_in_flight(&self) -> u32;

    /// Extent of the presentation surface
    fn swapchain_extent(&self) -> Extent2D;

    /// Whether an image with this format/type/tiling/usage can be created
    fn supports_image_format(&self, query: &ImageFormatQuery) -> bool;

    /// Whether `format` supports every feature in `features` for `tiling`
    fn supports_format_features(
        &self,
        format: InternalFormat,
        tiling: ImageTiling,
        features: FormatFeatures,
    ) -> bool;

    /// First candidate supporting `features` with optimal tiling
    ///
    /// # Arguments
    ///
    /// * `candidates` - Formats in order of preference
    /// * `features` - Required format features
    fn find_supported_format(
        &self,
        candidates: &[InternalFormat],
        features: FormatFeatures,
    ) -> Option<InternalFormat> {
        candidates
            .iter()
            .copied()
            .find(|&format| self.supports_format_features(format, ImageTiling::Optimal, features))
    }

    /// Create an image (with view and sampler)
    fn create_image(&mut self, desc: &GpuImageDesc) -> Result<Box<dyn GpuImage>>;

    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Box<dyn GpuBuffer>>;

    /// Create a render pass
    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Box<dyn GpuRenderPass>>;

    /// Create a framebuffer compatible with `render_pass`
    ///
    /// # Arguments
    ///
    /// * `render_pass` - Render pass the framebuffer will be used with
    /// * `desc` - Size and attachment images, in render pass attachment order
    fn create_framebuffer(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        desc: &FramebufferDesc,
    ) -> Result<Box<dyn GpuFramebuffer>>;

    /// Create a shader module from SPIR-V bytes
    fn create_shader(&mut self, desc: &ShaderModuleDesc) -> Result<Box<dyn GpuShaderModule>>;

    /// Create one descriptor set per layout and apply `writes` to them
    ///
    /// # Arguments
    ///
    /// * `layouts` - One layout per set, in set index order
    /// * `writes` - Resources to bind; `DescriptorWrite::set` indexes `layouts`
    fn create_descriptor_sets(
        &mut self,
        layouts: &[DescriptorSetLayoutDesc],
        writes: &[DescriptorWrite],
    ) -> Result<Box<dyn GpuDescriptorSets>>;

    /// Create a graphics pipeline
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Box<dyn GpuPipeline>>;

    /// Allocate a command list
    fn create_command_list(&mut self, level: CommandListLevel) -> Result<Box<dyn CommandList>>;

    /// Record `record` into a transient primary command list, submit it and
    /// wait for completion
    fn execute_one_time(
        &mut self,
        record: &mut dyn FnMut(&mut dyn CommandList) -> Result<()>,
    ) -> Result<()>;

    /// Submit recorded primary command lists to the graphics queue
    fn submit(&mut self, command_lists: &[&dyn CommandList]) -> Result<()>;

    /// Wait for all GPU operations to complete
    fn wait_idle(&self) -> Result<()>;

    /// Downcast support (tests, backend-specific access)
    fn as_any(&self) -> &dyn Any;
}
