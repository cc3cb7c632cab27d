/// DeferredRenderer - per-frame orchestration of the deferred path
///
/// Owns the voxel map storage image, the composite effect that shades the
/// g-buffer into the translucent bucket's framebuffer, and the post filter
/// chain. Each frame runs, in order:
///
/// 1. record the composite effect
/// 2. opaque pass: skybox then opaque pipelines into the g-buffer
/// 3. every `shadow_cadence` frames: shadows, then a voxel map barrier
/// 4. post filters
/// 5. translucent pass: composite quad, then translucent pipelines on top

use crate::asset::AssetLoader;
use crate::config::{EngineConfig, TextureFormatDefault, TextureFormatDefaults};
use crate::error::Result;
use crate::graphics_device::{CommandList, DescriptorType, GraphicsDevice, ResourceState, ShaderStage};
use crate::image::{Image, ImageType};
use crate::object::Id;
use crate::render::{
    Bucket, DescriptorPool, DescriptorSource, PostEffect, PostProcessing, RenderBucketContainer,
    Resources, Shader, EFFECT_BINDING, GBUFFER_BINDING, GLOBAL_SET, VOXEL_MAP_BINDING,
};
use crate::engine_info;

const LOG_SOURCE: &str = "hyperion::DeferredRenderer";

/// Number of g-buffer attachments exposed to the composite shader
const GBUFFER_ATTACHMENTS: usize = 4;

/// Records the shadow pass into the frame's primary command list
pub trait ShadowRenderer {
    /// Called once per cascade, in order, on every shadow frame
    fn render_shadows(
        &mut self,
        primary: &mut dyn CommandList,
        frame: u32,
        cascade: u32,
    ) -> Result<()>;
}

pub struct DeferredRenderer {
    effect: Option<PostEffect>,
    post_processing: PostProcessing,
    voxel_map: Id<Image>,
    shadow_cadence: u32,
    shadow_cascades: u32,
    /// Frames rendered so far
    frame_counter: u64,
    shadow_renderer: Option<Box<dyn ShadowRenderer>>,
}

impl DeferredRenderer {
    /// # Panics
    ///
    /// Panics if `shadow_cadence` is 0.
    pub fn new(shadow_cadence: u32) -> Self {
        assert!(shadow_cadence > 0, "shadow cadence must be at least 1");
        Self {
            effect: None,
            post_processing: PostProcessing::new(),
            voxel_map: Id::BAD,
            shadow_cadence,
            shadow_cascades: 1,
            frame_counter: 0,
            shadow_renderer: None,
        }
    }

    pub fn effect(&self) -> Option<&PostEffect> {
        self.effect.as_ref()
    }

    pub fn post_processing(&self) -> &PostProcessing {
        &self.post_processing
    }

    pub fn post_processing_mut(&mut self) -> &mut PostProcessing {
        &mut self.post_processing
    }

    pub fn voxel_map(&self) -> Id<Image> {
        self.voxel_map
    }

    pub fn shadow_cascades(&self) -> u32 {
        self.shadow_cascades
    }

    /// Shadow passes per shadow frame; 0 skips the shadow renderer
    pub fn set_shadow_cascades(&mut self, cascades: u32) {
        self.shadow_cascades = cascades;
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn set_shadow_renderer(&mut self, shadow_renderer: Box<dyn ShadowRenderer>) {
        self.shadow_renderer = Some(shadow_renderer);
    }

    /// Voxel map, composite effect, g-buffer descriptors and post filters
    ///
    /// The buckets' render passes and framebuffers must exist.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        assets: &dyn AssetLoader,
        config: &EngineConfig,
        formats: &TextureFormatDefaults,
        resources: &mut Resources,
        buckets: &RenderBucketContainer,
        descriptor_pool: &mut DescriptorPool,
    ) -> Result<()> {
        let voxel_map = Image::storage(
            config.voxel_map_extent(),
            formats.get(TextureFormatDefault::Storage),
            ImageType::Texture3D,
            None,
        );
        self.voxel_map = resources.add_texture(device, voxel_map, ResourceState::UnorderedAccess)?;
        descriptor_pool.add_descriptor(
            GLOBAL_SET,
            VOXEL_MAP_BINDING,
            DescriptorType::StorageImage,
            DescriptorSource::Texture(self.voxel_map),
        );

        let (vertex, fragment) = config.deferred_shader_paths();
        let shader = Shader::load(
            assets,
            &[(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)],
        )?;
        let shader = resources.add_shader(device, shader)?;

        let translucent = buckets.bucket(Bucket::Translucent);
        let mut effect =
            PostEffect::with_targets(shader, translucent.render_pass(), translucent.framebuffer());
        effect.create_frame_data(device, resources)?;

        let gbuffer = buckets.bucket(Bucket::Opaque).framebuffer();
        for index in 0..GBUFFER_ATTACHMENTS {
            descriptor_pool.add_descriptor(
                GLOBAL_SET,
                GBUFFER_BINDING + index as u32,
                DescriptorType::SampledImage,
                DescriptorSource::Attachment {
                    framebuffer: gbuffer,
                    index,
                },
            );
        }

        let mut binding = EFFECT_BINDING;
        effect.create_descriptors(descriptor_pool, resources, &mut binding);
        self.effect = Some(effect);

        self.post_processing
            .create(device, resources, formats, descriptor_pool, &mut binding)?;

        engine_info!(
            LOG_SOURCE,
            "Deferred renderer created ({} post filter(s))",
            self.post_processing.len()
        );
        Ok(())
    }

    /// Composite and filter pipelines; the descriptor pool must be created
    pub fn create_pipelines(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        descriptor_pool: &DescriptorPool,
    ) -> Result<()> {
        let Some(effect) = self.effect.as_mut() else {
            panic!("deferred pipelines created before the deferred renderer");
        };
        effect.create_pipeline(device, resources, descriptor_pool)?;
        self.post_processing
            .create_pipelines(device, resources, descriptor_pool)
    }

    /// Record the whole deferred sequence for `frame` into `primary`
    ///
    /// # Panics
    ///
    /// Panics if the renderer or its pipelines are not created.
    pub fn render(
        &mut self,
        resources: &mut Resources,
        buckets: &mut RenderBucketContainer,
        descriptor_pool: &DescriptorPool,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        let Some(effect) = self.effect.as_mut() else {
            panic!("deferred renderer rendered before create");
        };

        effect.record(resources, descriptor_pool, frame)?;

        let (render_pass, framebuffer) = buckets.bucket(Bucket::Opaque).targets(resources);
        buckets.bucket(Bucket::Opaque).begin(resources, primary)?;
        for bucket in [Bucket::Skybox, Bucket::Opaque] {
            buckets.bucket_mut(bucket).render_pipelines(
                render_pass,
                framebuffer,
                descriptor_pool,
                primary,
                frame,
            )?;
        }
        buckets.bucket(Bucket::Opaque).end(primary)?;

        let shadow_frame = self.frame_counter % u64::from(self.shadow_cadence) == 0;
        self.frame_counter += 1;
        if shadow_frame {
            if let Some(shadow_renderer) = self.shadow_renderer.as_mut() {
                for cascade in 0..self.shadow_cascades {
                    shadow_renderer.render_shadows(primary, frame, cascade)?;
                }
            }
            let Some(voxel_map) = resources.textures.get_mut(self.voxel_map) else {
                panic!("voxel map {:?} missing", self.voxel_map);
            };
            voxel_map.insert_barrier(primary, ResourceState::UnorderedAccess)?;
        }

        self.post_processing.record(resources, descriptor_pool, frame)?;
        self.post_processing.render(resources, primary, frame)?;

        effect.begin(resources, primary)?;
        effect.execute(primary, frame)?;
        let (render_pass, framebuffer) = effect.targets(resources);
        buckets.bucket_mut(Bucket::Translucent).render_pipelines(
            render_pass,
            framebuffer,
            descriptor_pool,
            primary,
            frame,
        )?;
        effect.end(primary)
    }

    /// Post filters, composite effect, then the voxel map; returns the first
    /// failure
    pub fn destroy(&mut self, resources: &mut Resources) -> Result<()> {
        let mut results = vec![self.post_processing.destroy(resources)];
        if let Some(mut effect) = self.effect.take() {
            results.push(effect.destroy(resources));
        }
        if self.voxel_map.is_valid() {
            results.push(resources.remove_texture(self.voxel_map));
            self.voxel_map = Id::BAD;
        }
        results.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;
