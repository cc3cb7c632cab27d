/// SamplerCache - VkSampler objects shared between images
///
/// One sampler per (filter, wrap) pair, created on first use and destroyed
/// when the device shuts down.

use ash::vk;
use hyperion_engine::engine_err;
use hyperion_engine::hyperion::image::{FilterMode, WrapMode};
use hyperion_engine::hyperion::Result;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_format::{filter_mode_to_vk, wrap_mode_to_vk};

pub(crate) struct SamplerCache {
    ctx: Option<Arc<GpuContext>>,
    cache: FxHashMap<(FilterMode, WrapMode), vk::Sampler>,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx: Some(ctx),
            cache: FxHashMap::default(),
        }
    }

    /// Get or create the sampler for `filter`/`wrap`
    pub(crate) fn get(&mut self, filter: FilterMode, wrap: WrapMode) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&(filter, wrap)) {
            return Ok(sampler);
        }

        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| engine_err!(LOG_SOURCE, "Sampler requested after device shutdown"))?;

        let (vk_filter, mipmap_mode) = filter_mode_to_vk(filter);
        let address = wrap_mode_to_vk(wrap);
        let max_lod = if filter.is_mipmapped() { vk::LOD_CLAMP_NONE } else { 0.0 };

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk_filter)
            .min_filter(vk_filter)
            .mipmap_mode(mipmap_mode)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .min_lod(0.0)
            .max_lod(max_lod)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .unnormalized_coordinates(false);

        let sampler = unsafe {
            ctx.device
                .create_sampler(&create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create sampler {:?}/{:?}: {:?}", filter, wrap, e))?
        };
        self.cache.insert((filter, wrap), sampler);
        Ok(sampler)
    }

    /// Destroy every cached sampler and release the context
    pub(crate) fn shutdown(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            for (_, sampler) in self.cache.drain() {
                unsafe { ctx.device.destroy_sampler(sampler, None); }
            }
        }
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
