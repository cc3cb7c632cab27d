/// VulkanPipeline - Vulkan implementation of the GpuPipeline trait
///
/// Graphics pipelines use a static viewport/scissor covering `PipelineDesc::viewport`.

use ash::vk;
use hyperion_engine::hyperion::device::{GpuPipeline, GpuShaderModule, PipelineDesc, PrimitiveTopology};
use hyperion_engine::hyperion::Result;
use hyperion_engine::{engine_bail, engine_err};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_descriptor_set::VulkanDescriptorSets;
use crate::vulkan_format::{cull_mode_to_vk, shader_stage_to_vk, topology_to_vk, vertex_input_to_vk};
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_shader::VulkanShaderModule;

pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    topology: PrimitiveTopology,
}

impl VulkanPipeline {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &PipelineDesc) -> Result<Self> {
        let render_pass = desc.render_pass
            .as_any()
            .downcast_ref::<VulkanRenderPass>()
            .ok_or_else(|| engine_err!(LOG_SOURCE, "Pipeline: render pass is not a Vulkan render pass"))?;
        let descriptor_sets = desc.descriptor_sets
            .as_any()
            .downcast_ref::<VulkanDescriptorSets>()
            .ok_or_else(|| engine_err!(LOG_SOURCE, "Pipeline: descriptor sets are not Vulkan descriptor sets"))?;

        let mut modules = Vec::with_capacity(desc.shader_modules.len());
        for module in &desc.shader_modules {
            let vk_module = module
                .as_any()
                .downcast_ref::<VulkanShaderModule>()
                .ok_or_else(|| engine_err!(LOG_SOURCE, "Pipeline: shader is not a Vulkan shader module"))?;
            modules.push(vk_module);
        }
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> = modules
            .iter()
            .map(|module| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(module.stage()))
                    .module(module.module)
                    .name(&module.entry_point_c)
            })
            .collect();

        let mut set_layouts = Vec::with_capacity(desc.set_layouts.len());
        for &index in &desc.set_layouts {
            match descriptor_sets.layouts.get(index as usize) {
                Some(&layout) => set_layouts.push(layout),
                None => engine_bail!(LOG_SOURCE,
                    "Pipeline references descriptor set {} but only {} exist", index, descriptor_sets.layouts.len()),
            }
        }

        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        let pipeline_layout = unsafe {
            ctx.device.create_pipeline_layout(&layout_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create pipeline layout: {:?}", e))?
        };

        // Released by Drop if pipeline creation fails below
        let mut vk_pipeline = Self {
            ctx: Arc::clone(&ctx),
            pipeline: vk::Pipeline::null(),
            pipeline_layout,
            topology: desc.topology,
        };

        let (vertex_bindings, vertex_attributes) = vertex_input_to_vk(desc.vertex_layout);
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: desc.viewport.width as f32,
            height: desc.viewport.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D {
                width: desc.viewport.width,
                height: desc.viewport.height,
            },
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.cull_mode))
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_write)
            .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let blend_attachment = if desc.blend {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .alpha_blend_op(vk::BlendOp::ADD)
        } else {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)
        };
        let blend_attachments =
            vec![blend_attachment; desc.render_pass.color_attachment_count() as usize];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(pipeline_layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            ctx.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, e)| engine_err!(LOG_SOURCE, "Failed to create graphics pipeline: {:?}", e))?
        };
        vk_pipeline.pipeline = pipelines[0];

        Ok(vk_pipeline)
    }
}

impl GpuPipeline for VulkanPipeline {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
            }
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
