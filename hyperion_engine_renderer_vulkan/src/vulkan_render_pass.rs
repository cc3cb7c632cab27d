/// VulkanRenderPass - Vulkan implementation of the GpuRenderPass trait
///
/// Single subpass; color attachments first in declaration order, then at
/// most one depth attachment.

use ash::vk;
use hyperion_engine::hyperion::device::{GpuRenderPass, RenderPassDesc};
use hyperion_engine::hyperion::Result;
use hyperion_engine::{engine_bail, engine_err};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_format::{format_to_vk, load_op_to_vk, resource_state_to_vk, store_op_to_vk};

pub struct VulkanRenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    /// Per attachment, in framebuffer order: true for depth
    pub(crate) depth_attachments: Vec<bool>,
}

impl VulkanRenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        let mut attachments = Vec::with_capacity(desc.attachments.len());
        let mut color_refs = Vec::new();
        let mut depth_ref: Option<vk::AttachmentReference> = None;

        for (index, attachment) in desc.attachments.iter().enumerate() {
            let is_depth = attachment.is_depth();
            let (initial_layout, _, _) = resource_state_to_vk(attachment.initial_state, is_depth);
            let (final_layout, _, _) = resource_state_to_vk(attachment.final_state, is_depth);

            attachments.push(vk::AttachmentDescription::default()
                .format(format_to_vk(attachment.format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(store_op_to_vk(attachment.store_op))
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(initial_layout)
                .final_layout(final_layout));

            if is_depth {
                if depth_ref.is_some() {
                    engine_bail!(LOG_SOURCE, "Render pass declares more than one depth attachment");
                }
                depth_ref = Some(vk::AttachmentReference::default()
                    .attachment(index as u32)
                    .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL));
            } else {
                color_refs.push(vk::AttachmentReference::default()
                    .attachment(index as u32)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
            }
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(ref depth) = depth_ref {
            subpass = subpass.depth_stencil_attachment(depth);
        }

        let (attachment_stages, attachment_access) = if depth_ref.is_some() {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            )
        };

        // Attachments written here are sampled by later passes
        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER | attachment_stages)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(attachment_stages)
                .dst_access_mask(attachment_access),
            vk::SubpassDependency::default()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(attachment_stages)
                .src_access_mask(attachment_access)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                .dst_access_mask(vk::AccessFlags::SHADER_READ),
        ];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);

        let render_pass = unsafe {
            ctx.device.create_render_pass(&create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create render pass: {:?}", e))?
        };

        Ok(Self {
            ctx,
            render_pass,
            depth_attachments: desc.attachments.iter().map(|a| a.is_depth()).collect(),
        })
    }

    /// Clear values in attachment order (color black, depth 1.0)
    pub(crate) fn clear_values(&self) -> Vec<vk::ClearValue> {
        self.depth_attachments
            .iter()
            .map(|&is_depth| {
                if is_depth {
                    vk::ClearValue {
                        depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                    }
                } else {
                    vk::ClearValue {
                        color: vk::ClearColorValue { float32: [0.0, 0.0, 0.0, 0.0] },
                    }
                }
            })
            .collect()
    }
}

impl GpuRenderPass for VulkanRenderPass {
    fn attachment_count(&self) -> u32 {
        self.depth_attachments.len() as u32
    }

    fn color_attachment_count(&self) -> u32 {
        self.depth_attachments.iter().filter(|&&is_depth| !is_depth).count() as u32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
