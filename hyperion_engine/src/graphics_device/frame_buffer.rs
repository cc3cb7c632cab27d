/// Framebuffer trait - binds attachment images to a render pass
///
/// Created once and reused each frame. Must be recreated only when
/// attachments change (e.g., window resize).

use std::any::Any;

use crate::graphics_device::GpuImage;

/// Framebuffer resource trait
///
/// Created via `GraphicsDevice::create_framebuffer()`. Destroyed on drop.
pub trait GpuFramebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Attachment images in render pass attachment order
    pub attachments: Vec<&'a dyn GpuImage>,
}
