/// VulkanImage - Vulkan implementation of the GpuImage trait

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use hyperion_engine::hyperion::device::{GpuImage, GpuImageDesc, ImageTiling, ImageUsage};
use hyperion_engine::hyperion::image::ImageType;
use hyperion_engine::hyperion::{Error, Result};
use hyperion_engine::{engine_err, engine_error};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_format::{aspect_mask, format_to_vk, image_type_to_vk, image_usage_to_vk, tiling_to_vk};

/// Image, its full view and its (shared, cache-owned) sampler
pub struct VulkanImage {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    /// Null when the image is not sampled
    pub(crate) sampler: vk::Sampler,
    allocation: Option<Allocation>,
    desc: GpuImageDesc,
}

impl VulkanImage {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &GpuImageDesc, sampler: vk::Sampler) -> Result<Self> {
        let (image_type, view_type, flags) = image_type_to_vk(desc.image_type);
        let format = format_to_vk(desc.format);
        let depth = if desc.image_type == ImageType::Texture3D {
            desc.extent.depth.max(1)
        } else {
            1
        };

        let create_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(image_type)
            .format(format)
            .extent(vk::Extent3D {
                width: desc.extent.width,
                height: desc.extent.height,
                depth,
            })
            .mip_levels(desc.mip_levels.max(1))
            .array_layers(desc.layers())
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(tiling_to_vk(desc.tiling))
            .usage(image_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = ctx.device.create_image(&create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create {:?} image {}x{}x{}: {:?}",
                    desc.format, desc.extent.width, desc.extent.height, depth, e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = {
                let mut allocator = ctx.allocator.lock()
                    .map_err(|_| engine_err!(LOG_SOURCE, "GPU allocator lock poisoned"))?;
                allocator.allocate(&AllocationCreateDesc {
                    name: "image",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: desc.tiling == ImageTiling::Linear,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    engine_error!(LOG_SOURCE, "Out of GPU memory for image ({} bytes): {:?}", requirements.size, e);
                    return Err(Error::OutOfMemory);
                }
            };

            let bind = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset());

            // From here on, drop releases whatever was created
            let mut vk_image = Self {
                ctx: Arc::clone(&ctx),
                image,
                view: vk::ImageView::null(),
                sampler: if desc.usage.contains(ImageUsage::SAMPLED) { sampler } else { vk::Sampler::null() },
                allocation: Some(allocation),
                desc: *desc,
            };
            bind.map_err(|e| engine_err!(LOG_SOURCE, "Failed to bind image memory: {:?}", e))?;

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect_mask(desc.format),
                    base_mip_level: 0,
                    level_count: desc.mip_levels.max(1),
                    base_array_layer: 0,
                    layer_count: desc.layers(),
                });

            vk_image.view = ctx.device.create_image_view(&view_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create image view: {:?}", e))?;

            Ok(vk_image)
        }
    }
}

impl GpuImage for VulkanImage {
    fn desc(&self) -> &GpuImageDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanImage {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            self.ctx.device.destroy_image(self.image, None);

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}
