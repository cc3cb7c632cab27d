/// VulkanShaderModule - Vulkan implementation of the GpuShaderModule trait

use ash::vk;
use hyperion_engine::hyperion::device::{GpuShaderModule, ShaderModuleDesc, ShaderStage};
use hyperion_engine::hyperion::Result;
use hyperion_engine::{engine_bail_warn, engine_err};
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, LOG_SOURCE};

pub struct VulkanShaderModule {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    stage: ShaderStage,
    entry_point: String,
    pub(crate) entry_point_c: CString,
}

impl VulkanShaderModule {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &ShaderModuleDesc) -> Result<Self> {
        if desc.code.is_empty() || desc.code.len() % 4 != 0 {
            engine_bail_warn!(LOG_SOURCE,
                "SPIR-V code size must be a non-zero multiple of 4 (got {} bytes)", desc.code.len());
        }

        let entry_point_c = CString::new(desc.entry_point)
            .map_err(|_| engine_err!(LOG_SOURCE, "Shader entry point contains a NUL byte: {:?}", desc.entry_point))?;

        // Copy into u32 words; the byte slice may not be 4-aligned
        let code: Vec<u32> = desc.code
            .chunks_exact(4)
            .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            ctx.device.create_shader_module(&create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create {:?} shader module: {:?}", desc.stage, e))?
        };

        Ok(Self {
            ctx,
            module,
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
            entry_point_c,
        })
    }
}

impl GpuShaderModule for VulkanShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
