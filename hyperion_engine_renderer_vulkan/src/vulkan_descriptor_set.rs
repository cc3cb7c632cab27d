/// VulkanDescriptorSets - Vulkan implementation of the GpuDescriptorSets trait
///
/// Owns a dedicated descriptor pool sized for its layouts, the set layouts
/// and the allocated sets. Everything is released on drop.

use ash::vk;
use hyperion_engine::hyperion::device::{
    DescriptorResource, DescriptorSetLayoutDesc, DescriptorWrite, GpuBuffer, GpuDescriptorSets,
    GpuImage,
};
use hyperion_engine::hyperion::Result;
use hyperion_engine::{engine_bail, engine_err};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_format::descriptor_type_to_vk;
use crate::vulkan_image::VulkanImage;

pub struct VulkanDescriptorSets {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    pub(crate) layouts: Vec<vk::DescriptorSetLayout>,
    pub(crate) sets: Vec<vk::DescriptorSet>,
}

enum ResourceInfo {
    Image(vk::DescriptorImageInfo),
    Buffer(vk::DescriptorBufferInfo),
}

fn vk_image(image: &dyn GpuImage) -> Result<&VulkanImage> {
    image
        .as_any()
        .downcast_ref::<VulkanImage>()
        .ok_or_else(|| engine_err!(LOG_SOURCE, "Descriptor write: image is not a Vulkan image"))
}

fn vk_buffer(buffer: &dyn GpuBuffer) -> Result<&VulkanBuffer> {
    buffer
        .as_any()
        .downcast_ref::<VulkanBuffer>()
        .ok_or_else(|| engine_err!(LOG_SOURCE, "Descriptor write: buffer is not a Vulkan buffer"))
}

fn resource_info(resource: &DescriptorResource) -> Result<ResourceInfo> {
    Ok(match *resource {
        DescriptorResource::SampledImage(gpu_image) => {
            let image = vk_image(gpu_image)?;
            if image.sampler == vk::Sampler::null() {
                engine_bail!(LOG_SOURCE, "Descriptor write: image was not created with SAMPLED usage");
            }
            let layout = if gpu_image.desc().format.is_depth() {
                vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
            } else {
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
            };
            ResourceInfo::Image(vk::DescriptorImageInfo {
                sampler: image.sampler,
                image_view: image.view,
                image_layout: layout,
            })
        }
        DescriptorResource::StorageImage(gpu_image) => {
            let image = vk_image(gpu_image)?;
            ResourceInfo::Image(vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: image.view,
                image_layout: vk::ImageLayout::GENERAL,
            })
        }
        DescriptorResource::UniformBuffer(gpu_buffer) | DescriptorResource::StorageBuffer(gpu_buffer) => {
            let buffer = vk_buffer(gpu_buffer)?;
            ResourceInfo::Buffer(vk::DescriptorBufferInfo {
                buffer: buffer.buffer,
                offset: 0,
                range: vk::WHOLE_SIZE,
            })
        }
    })
}

impl VulkanDescriptorSets {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        layout_descs: &[DescriptorSetLayoutDesc],
        writes: &[DescriptorWrite],
    ) -> Result<Self> {
        // Build the handle first so partial failures are released by Drop
        let mut sets = Self {
            ctx: Arc::clone(&ctx),
            pool: vk::DescriptorPool::null(),
            layouts: Vec::with_capacity(layout_descs.len()),
            sets: Vec::new(),
        };

        let mut type_counts: FxHashMap<vk::DescriptorType, u32> = FxHashMap::default();
        for layout_desc in layout_descs {
            let bindings: Vec<vk::DescriptorSetLayoutBinding> = layout_desc
                .bindings
                .iter()
                .map(|binding| {
                    let descriptor_type = descriptor_type_to_vk(binding.descriptor_type);
                    *type_counts.entry(descriptor_type).or_insert(0) += 1;
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(binding.binding)
                        .descriptor_type(descriptor_type)
                        .descriptor_count(1)
                        .stage_flags(vk::ShaderStageFlags::ALL_GRAPHICS)
                })
                .collect();

            let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let layout = unsafe {
                ctx.device.create_descriptor_set_layout(&create_info, None)
                    .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create descriptor set layout: {:?}", e))?
            };
            sets.layouts.push(layout);
        }

        if layout_descs.is_empty() {
            return Ok(sets);
        }

        let mut pool_sizes: Vec<vk::DescriptorPoolSize> = type_counts
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .map(|(ty, descriptor_count)| vk::DescriptorPoolSize { ty, descriptor_count })
            .collect();
        if pool_sizes.is_empty() {
            // Layouts without bindings still need a valid pool
            pool_sizes.push(vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1,
            });
        }

        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(layout_descs.len() as u32)
            .pool_sizes(&pool_sizes);
        sets.pool = unsafe {
            ctx.device.create_descriptor_pool(&pool_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create descriptor pool: {:?}", e))?
        };

        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(sets.pool)
            .set_layouts(&sets.layouts);
        sets.sets = unsafe {
            ctx.device.allocate_descriptor_sets(&allocate_info)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to allocate {} descriptor set(s): {:?}", layout_descs.len(), e))?
        };

        let mut infos = Vec::with_capacity(writes.len());
        for write in writes {
            let declared = layout_descs
                .get(write.set as usize)
                .and_then(|layout| layout.bindings.iter().find(|b| b.binding == write.binding));
            match declared {
                Some(binding) if binding.descriptor_type == write.resource.descriptor_type() => {}
                Some(binding) => engine_bail!(LOG_SOURCE,
                    "Descriptor write to set {} binding {}: expected {:?}, got {:?}",
                    write.set, write.binding, binding.descriptor_type, write.resource.descriptor_type()),
                None => engine_bail!(LOG_SOURCE,
                    "Descriptor write to undeclared set {} binding {}", write.set, write.binding),
            }
            infos.push(resource_info(&write.resource)?);
        }

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(infos.iter())
            .map(|(write, info)| {
                let vk_write = vk::WriteDescriptorSet::default()
                    .dst_set(sets.sets[write.set as usize])
                    .dst_binding(write.binding)
                    .descriptor_type(descriptor_type_to_vk(write.resource.descriptor_type()));
                match info {
                    ResourceInfo::Image(image_info) => vk_write.image_info(std::slice::from_ref(image_info)),
                    ResourceInfo::Buffer(buffer_info) => vk_write.buffer_info(std::slice::from_ref(buffer_info)),
                }
            })
            .collect();

        unsafe {
            ctx.device.update_descriptor_sets(&vk_writes, &[]);
        }

        Ok(sets)
    }
}

impl GpuDescriptorSets for VulkanDescriptorSets {
    fn set_count(&self) -> u32 {
        self.layouts.len() as u32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanDescriptorSets {
    fn drop(&mut self) {
        unsafe {
            // Sets are freed with their pool
            if self.pool != vk::DescriptorPool::null() {
                self.ctx.device.destroy_descriptor_pool(self.pool, None);
            }
            for &layout in &self.layouts {
                self.ctx.device.destroy_descriptor_set_layout(layout, None);
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_set_tests.rs"]
mod tests;
