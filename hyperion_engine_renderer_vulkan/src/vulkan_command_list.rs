/// VulkanCommandList - Vulkan implementation of the CommandList trait
///
/// Each list owns its command pool. Primary lists also own the fence their
/// last submission signals; `begin` waits on it, so a primary list (and the
/// secondaries it executed) is never re-recorded while the GPU still reads it.

use ash::vk;
use hyperion_engine::hyperion::device::{
    BufferImageCopy, CommandList, CommandListInheritance, CommandListLevel, Extent3D, GpuBuffer,
    GpuDescriptorSets, GpuFramebuffer, GpuImage, GpuPipeline, GpuRenderPass, ImageBlit,
    IndexType, ResourceState, SubpassContents, SubresourceRange,
};
use hyperion_engine::hyperion::Result;
use hyperion_engine::{engine_bail, engine_err};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_descriptor_set::VulkanDescriptorSets;
use crate::vulkan_format::{aspect_mask, index_type_to_vk, resource_state_to_vk};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_image::VulkanImage;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;

pub struct VulkanCommandList {
    ctx: Arc<GpuContext>,
    level: CommandListLevel,
    command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    /// Signaled by the last submission (primary lists only)
    pub(crate) fence: vk::Fence,
    is_recording: bool,
    in_render_pass: bool,
}

fn downcast<'a, T: 'static>(any: &'a dyn Any, what: &str) -> Result<&'a T> {
    any.downcast_ref::<T>()
        .ok_or_else(|| engine_err!(LOG_SOURCE, "Command list: {} does not belong to the Vulkan backend", what))
}

fn subresource_range(image: &dyn GpuImage, range: SubresourceRange) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: aspect_mask(image.desc().format),
        base_mip_level: range.base_mip_level,
        level_count: range.mip_level_count,
        base_array_layer: range.base_layer,
        layer_count: range.layer_count,
    }
}

fn offset3d(extent: Extent3D) -> vk::Offset3D {
    vk::Offset3D {
        x: extent.width as i32,
        y: extent.height as i32,
        z: extent.depth as i32,
    }
}

impl VulkanCommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>, level: CommandListLevel) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create command pool: {:?}", e))?;

            let mut list = Self {
                ctx: Arc::clone(&ctx),
                level,
                command_pool,
                command_buffer: vk::CommandBuffer::null(),
                fence: vk::Fence::null(),
                is_recording: false,
                in_render_pass: false,
            };

            let vk_level = match level {
                CommandListLevel::Primary => vk::CommandBufferLevel::PRIMARY,
                CommandListLevel::Secondary => vk::CommandBufferLevel::SECONDARY,
            };
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk_level)
                .command_buffer_count(1);

            let command_buffers = ctx.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to allocate command buffer: {:?}", e))?;
            list.command_buffer = command_buffers
                .first()
                .copied()
                .ok_or_else(|| engine_err!(LOG_SOURCE, "Driver returned no command buffer"))?;

            if level == CommandListLevel::Primary {
                let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
                list.fence = ctx.device.create_fence(&fence_info, None)
                    .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create command list fence: {:?}", e))?;
            }

            Ok(list)
        }
    }

    /// Block until the last submission of this list has completed
    pub(crate) fn wait(&self) -> Result<()> {
        if self.fence == vk::Fence::null() {
            return Ok(());
        }
        unsafe {
            self.ctx.device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to wait for command list fence: {:?}", e))
        }
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            engine_bail!(LOG_SOURCE, "Command list not recording");
        }
        Ok(())
    }

    /// Draws are legal inside a render pass, or anywhere in a secondary list
    fn ensure_can_draw(&self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass && self.level == CommandListLevel::Primary {
            engine_bail!(LOG_SOURCE, "Draw recorded outside a render pass");
        }
        Ok(())
    }
}

impl CommandList for VulkanCommandList {
    fn level(&self) -> CommandListLevel {
        self.level
    }

    fn begin(&mut self, inheritance: Option<CommandListInheritance>) -> Result<()> {
        if self.is_recording {
            engine_bail!(LOG_SOURCE, "Command list already recording");
        }
        self.wait()?;

        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to reset command buffer: {:?}", e))?;

            match (self.level, inheritance) {
                (CommandListLevel::Secondary, Some(inheritance)) => {
                    let render_pass = downcast::<VulkanRenderPass>(inheritance.render_pass.as_any(), "render pass")?;
                    let framebuffer = downcast::<VulkanFramebuffer>(inheritance.framebuffer.as_any(), "framebuffer")?;
                    let inheritance_info = vk::CommandBufferInheritanceInfo::default()
                        .render_pass(render_pass.render_pass)
                        .subpass(0)
                        .framebuffer(framebuffer.framebuffer);
                    let begin_info = vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::RENDER_PASS_CONTINUE)
                        .inheritance_info(&inheritance_info);
                    self.ctx.device.begin_command_buffer(self.command_buffer, &begin_info)
                        .map_err(|e| engine_err!(LOG_SOURCE, "Failed to begin secondary command buffer: {:?}", e))?;
                }
                (CommandListLevel::Secondary, None) => {
                    engine_bail!(LOG_SOURCE, "Secondary command list begun without render pass inheritance");
                }
                (CommandListLevel::Primary, _) => {
                    let begin_info = vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
                    self.ctx.device.begin_command_buffer(self.command_buffer, &begin_info)
                        .map_err(|e| engine_err!(LOG_SOURCE, "Failed to begin command buffer: {:?}", e))?;
                }
            }
        }

        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            engine_bail!(LOG_SOURCE, "Render pass not ended before ending command list");
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn GpuFramebuffer,
        contents: SubpassContents,
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            engine_bail!(LOG_SOURCE, "Already inside a render pass");
        }

        let vk_render_pass = downcast::<VulkanRenderPass>(render_pass.as_any(), "render pass")?;
        let vk_framebuffer = downcast::<VulkanFramebuffer>(framebuffer.as_any(), "framebuffer")?;
        let clear_values = vk_render_pass.clear_values();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: framebuffer.width(),
                    height: framebuffer.height(),
                },
            })
            .clear_values(&clear_values);

        let vk_contents = match contents {
            SubpassContents::Inline => vk::SubpassContents::INLINE,
            SubpassContents::SecondaryCommandLists => vk::SubpassContents::SECONDARY_COMMAND_BUFFERS,
        };

        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk_contents);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            engine_bail!(LOG_SOURCE, "Not inside a render pass");
        }

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn execute_secondary(&mut self, secondary: &dyn CommandList) -> Result<()> {
        self.ensure_recording()?;
        let vk_secondary = downcast::<VulkanCommandList>(secondary.as_any(), "secondary command list")?;
        if vk_secondary.level != CommandListLevel::Secondary {
            engine_bail!(LOG_SOURCE, "execute_secondary called with a primary command list");
        }
        if vk_secondary.is_recording {
            engine_bail!(LOG_SOURCE, "Secondary command list executed while still recording");
        }

        unsafe {
            self.ctx.device.cmd_execute_commands(self.command_buffer, &[vk_secondary.command_buffer]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()> {
        self.ensure_recording()?;
        let vk_pipeline = downcast::<VulkanPipeline>(pipeline.as_any(), "pipeline")?;

        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_descriptor_sets(
        &mut self,
        pipeline: &dyn GpuPipeline,
        sets: &dyn GpuDescriptorSets,
        set_indices: &[u32],
    ) -> Result<()> {
        self.ensure_recording()?;
        let vk_pipeline = downcast::<VulkanPipeline>(pipeline.as_any(), "pipeline")?;
        let vk_sets = downcast::<VulkanDescriptorSets>(sets.as_any(), "descriptor sets")?;

        let mut descriptor_sets = Vec::with_capacity(set_indices.len());
        for &index in set_indices {
            match vk_sets.sets.get(index as usize) {
                Some(&set) => descriptor_sets.push(set),
                None => engine_bail!(LOG_SOURCE,
                    "Descriptor set index {} out of range ({} set(s))", index, vk_sets.sets.len()),
            }
        }

        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                0,
                &descriptor_sets,
                &[],
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<VulkanBuffer>(buffer.as_any(), "vertex buffer")?;

        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<VulkanBuffer>(buffer.as_any(), "index buffer")?;

        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_can_draw()?;

        unsafe {
            self.ctx.device.cmd_draw(self.command_buffer, vertex_count, instance_count, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<()> {
        self.ensure_can_draw()?;

        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                0,
            );
        }
        Ok(())
    }

    fn pipeline_barrier(
        &mut self,
        image: &dyn GpuImage,
        range: SubresourceRange,
        old_state: ResourceState,
        new_state: ResourceState,
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            engine_bail!(LOG_SOURCE, "Image barrier recorded inside a render pass");
        }
        let vk_image = downcast::<VulkanImage>(image.as_any(), "image")?;

        let is_depth = image.desc().format.is_depth();
        let (old_layout, src_access, src_stage) = resource_state_to_vk(old_state, is_depth);
        let (new_layout, dst_access, dst_stage) = resource_state_to_vk(new_state, is_depth);

        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_access_mask(src_access)
            .dst_access_mask(dst_access)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(vk_image.image)
            .subresource_range(subresource_range(image, range));

        unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
        Ok(())
    }

    fn copy_buffer_to_image(
        &mut self,
        buffer: &dyn GpuBuffer,
        image: &dyn GpuImage,
        region: BufferImageCopy,
    ) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<VulkanBuffer>(buffer.as_any(), "staging buffer")?;
        let vk_image = downcast::<VulkanImage>(image.as_any(), "image")?;

        let copy = vk::BufferImageCopy::default()
            .buffer_offset(region.buffer_offset)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: aspect_mask(image.desc().format),
                mip_level: region.mip_level,
                base_array_layer: region.layer,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D {
                width: region.extent.width,
                height: region.extent.height,
                depth: region.extent.depth,
            });

        unsafe {
            self.ctx.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                vk_buffer.buffer,
                vk_image.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[copy],
            );
        }
        Ok(())
    }

    fn blit_image(&mut self, image: &dyn GpuImage, blit: ImageBlit) -> Result<()> {
        self.ensure_recording()?;
        let vk_image = downcast::<VulkanImage>(image.as_any(), "image")?;
        let aspect = aspect_mask(image.desc().format);

        let region = vk::ImageBlit::default()
            .src_subresource(vk::ImageSubresourceLayers {
                aspect_mask: aspect,
                mip_level: blit.src_mip_level,
                base_array_layer: 0,
                layer_count: blit.layer_count,
            })
            .src_offsets([vk::Offset3D { x: 0, y: 0, z: 0 }, offset3d(blit.src_extent)])
            .dst_subresource(vk::ImageSubresourceLayers {
                aspect_mask: aspect,
                mip_level: blit.dst_mip_level,
                base_array_layer: 0,
                layer_count: blit.layer_count,
            })
            .dst_offsets([vk::Offset3D { x: 0, y: 0, z: 0 }, offset3d(blit.dst_extent)]);

        unsafe {
            self.ctx.device.cmd_blit_image(
                self.command_buffer,
                vk_image.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                vk_image.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
                vk::Filter::LINEAR,
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            // A list still executing on the GPU must not lose its pool
            self.wait().ok();
            if self.fence != vk::Fence::null() {
                self.ctx.device.destroy_fence(self.fence, None);
            }
            // Frees the command buffer as well
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
