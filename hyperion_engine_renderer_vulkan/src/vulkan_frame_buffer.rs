/// VulkanFramebuffer - Vulkan implementation of the GpuFramebuffer trait
///
/// Created once via `GraphicsDevice::create_framebuffer()`, reused each frame.

use ash::vk;
use hyperion_engine::hyperion::device::{FramebufferDesc, GpuFramebuffer, GpuRenderPass};
use hyperion_engine::hyperion::Result;
use hyperion_engine::{engine_bail, engine_err};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_image::VulkanImage;
use crate::vulkan_render_pass::VulkanRenderPass;

pub struct VulkanFramebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
}

impl VulkanFramebuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        render_pass: &dyn GpuRenderPass,
        desc: &FramebufferDesc,
    ) -> Result<Self> {
        let vk_render_pass = render_pass
            .as_any()
            .downcast_ref::<VulkanRenderPass>()
            .ok_or_else(|| engine_err!(LOG_SOURCE, "Framebuffer: render pass is not a Vulkan render pass"))?;

        if desc.attachments.len() as u32 != render_pass.attachment_count() {
            engine_bail!(LOG_SOURCE, "Framebuffer has {} attachment(s), render pass expects {}",
                desc.attachments.len(), render_pass.attachment_count());
        }

        let mut views = Vec::with_capacity(desc.attachments.len());
        for attachment in &desc.attachments {
            let image = attachment
                .as_any()
                .downcast_ref::<VulkanImage>()
                .ok_or_else(|| engine_err!(LOG_SOURCE, "Framebuffer: attachment is not a Vulkan image"))?;
            views.push(image.view);
        }

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe {
            ctx.device.create_framebuffer(&create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create framebuffer {}x{}: {:?}", desc.width, desc.height, e))?
        };

        Ok(Self {
            ctx,
            framebuffer,
            width: desc.width,
            height: desc.height,
        })
    }
}

impl GpuFramebuffer for VulkanFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
