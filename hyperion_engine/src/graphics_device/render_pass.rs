/// RenderPass trait - describes attachments and their load/store behavior

use std::any::Any;

use crate::graphics_device::ResourceState;
use crate::image::InternalFormat;

/// What happens to an attachment's contents when the pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// What happens to an attachment's contents when the pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// How commands are provided inside a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassContents {
    /// Recorded directly in the primary command list
    Inline,
    /// Provided by secondary command lists through `execute_secondary`
    SecondaryCommandLists,
}

/// One render pass attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub format: InternalFormat,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    /// State the image is in when the pass begins
    pub initial_state: ResourceState,
    /// State the pass leaves the image in
    pub final_state: ResourceState,
}

impl AttachmentDesc {
    /// Cleared attachment left sampleable after the pass
    pub fn cleared(format: InternalFormat) -> Self {
        Self {
            format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            initial_state: ResourceState::Undefined,
            final_state: ResourceState::ShaderResource,
        }
    }

    pub fn is_depth(&self) -> bool {
        self.format.is_depth()
    }
}

/// Descriptor for creating a render pass (single subpass)
#[derive(Debug, Clone, Default)]
pub struct RenderPassDesc {
    /// Attachments in framebuffer order
    pub attachments: Vec<AttachmentDesc>,
}

/// Render pass resource trait
///
/// Implemented by backend-specific render pass types. Destroyed on drop.
pub trait GpuRenderPass: Send + Sync {
    /// Number of attachments (color and depth)
    fn attachment_count(&self) -> u32;

    /// Number of color attachments
    fn color_attachment_count(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
