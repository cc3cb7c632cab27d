/// Post effects - full-screen passes recorded into per-frame secondary lists
///
/// An effect samples earlier passes through global descriptors and draws a
/// full-screen quad into its own framebuffer (or, for the deferred composite,
/// into a framebuffer it borrows). `record(frame)` must run before the first
/// `render(frame)` after the effect's pipeline is (re)built.

use crate::config::{TextureFormatDefault, TextureFormatDefaults};
use crate::error::Result;
use crate::graphics_device::{
    CommandList, CommandListInheritance, CommandListLevel, DescriptorType, GraphicsDevice,
    SubpassContents,
};
use crate::object::{Id, Ref};
use crate::render::{
    Bucket, DescriptorPool, DescriptorSource, Framebuffer, GraphicsPipeline, RenderPass,
    Renderable, Resources, Shader, GLOBAL_SET,
};
use crate::{engine_bail, engine_debug};

const LOG_SOURCE: &str = "hyperion::PostEffect";

pub struct PostEffect {
    shader: Ref<Shader>,
    render_pass: Id<RenderPass>,
    framebuffer: Id<Framebuffer>,
    pipeline: Id<GraphicsPipeline>,
    frame_data: Vec<Box<dyn CommandList>>,
    recorded: Vec<bool>,
    /// Whether the effect created (and will remove) its render targets
    owns_targets: bool,
}

impl PostEffect {
    /// Effect drawing into its own single-color render target
    pub fn new(shader: Ref<Shader>) -> Self {
        Self {
            shader,
            render_pass: Id::BAD,
            framebuffer: Id::BAD,
            pipeline: Id::BAD,
            frame_data: Vec::new(),
            recorded: Vec::new(),
            owns_targets: true,
        }
    }

    /// Effect drawing into a render pass and framebuffer owned elsewhere
    pub fn with_targets(
        shader: Ref<Shader>,
        render_pass: Id<RenderPass>,
        framebuffer: Id<Framebuffer>,
    ) -> Self {
        Self {
            render_pass,
            framebuffer,
            owns_targets: false,
            ..Self::new(shader)
        }
    }

    pub fn shader(&self) -> &Ref<Shader> {
        &self.shader
    }

    pub fn render_pass(&self) -> Id<RenderPass> {
        self.render_pass
    }

    pub fn framebuffer(&self) -> Id<Framebuffer> {
        self.framebuffer
    }

    pub fn pipeline(&self) -> Id<GraphicsPipeline> {
        self.pipeline
    }

    pub fn is_recorded(&self, frame: u32) -> bool {
        self.recorded.get(frame as usize).copied().unwrap_or(false)
    }

    /// Secondary list of `frame`, if frame data exists
    pub fn secondary(&self, frame: u32) -> Option<&dyn CommandList> {
        self.frame_data.get(frame as usize).map(|cmd| cmd.as_ref())
    }

    // ===== CREATION =====

    /// One color attachment in the default color format
    pub fn create_render_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        formats: &TextureFormatDefaults,
    ) -> Result<()> {
        if !self.owns_targets {
            return Ok(());
        }
        let render_pass = RenderPass::with_formats(
            SubpassContents::SecondaryCommandLists,
            &[formats.get(TextureFormatDefault::Color)],
        );
        self.render_pass = resources.add_render_pass(device, render_pass)?;
        Ok(())
    }

    /// Framebuffer at the swapchain extent plus one secondary list per frame
    pub fn create_frame_data(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
    ) -> Result<()> {
        if self.owns_targets {
            let extent = device.swapchain_extent();
            self.framebuffer =
                resources.add_framebuffer(device, extent.width, extent.height, self.render_pass)?;
        }

        let frames = device.frames_in_flight();
        let mut frame_data = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            frame_data.push(device.create_command_list(CommandListLevel::Secondary)?);
        }
        self.frame_data = frame_data;
        self.recorded = vec![false; frames as usize];
        Ok(())
    }

    /// Expose every framebuffer attachment as a sampled image in the global
    /// set, starting at `binding_offset` (advanced past the last one)
    pub fn create_descriptors(
        &self,
        descriptor_pool: &mut DescriptorPool,
        resources: &Resources,
        binding_offset: &mut u32,
    ) {
        let Some(framebuffer) = resources.framebuffers.get(self.framebuffer) else {
            panic!("descriptors of an effect whose framebuffer {:?} does not exist", self.framebuffer);
        };

        for index in 0..framebuffer.num_attachments() {
            descriptor_pool.add_descriptor(
                GLOBAL_SET,
                *binding_offset,
                DescriptorType::SampledImage,
                DescriptorSource::Attachment {
                    framebuffer: self.framebuffer,
                    index,
                },
            );
            *binding_offset += 1;
        }
    }

    /// Triangle-fan full-screen quad pipeline in the effect's render pass
    ///
    /// Any earlier recording is invalidated.
    pub fn create_pipeline(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        descriptor_pool: &DescriptorPool,
    ) -> Result<()> {
        let Some(render_pass) = resources.render_passes.get(self.render_pass) else {
            engine_bail!(LOG_SOURCE, "no render pass with id {:?}", self.render_pass);
        };

        let mut pipeline = GraphicsPipeline::new(self.shader.clone(), Bucket::Screen);
        pipeline.add_renderable(Renderable::FullScreenQuad);

        self.pipeline = resources
            .graphics_pipelines
            .add(pipeline, |pipeline| pipeline.create(device, render_pass, descriptor_pool))?;
        self.recorded.iter_mut().for_each(|recorded| *recorded = false);

        engine_debug!(LOG_SOURCE, "Created effect pipeline {:?}", self.pipeline);
        Ok(())
    }

    /// Release the pipeline; the effect must be recorded again after the
    /// next `create_pipeline`
    pub fn destroy_pipeline(&mut self, resources: &mut Resources) -> Result<()> {
        self.recorded.iter_mut().for_each(|recorded| *recorded = false);
        if !self.pipeline.is_valid() {
            return Ok(());
        }
        let pipeline = std::mem::replace(&mut self.pipeline, Id::BAD);
        resources.graphics_pipelines.remove(pipeline)
    }

    // ===== FRAME =====

    /// Re-record `frame`'s secondary list: bind pipeline, bind descriptor
    /// sets, draw the quad
    ///
    /// # Panics
    ///
    /// Panics if the pipeline or frame data does not exist.
    pub fn record(
        &mut self,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
        frame: u32,
    ) -> Result<()> {
        let Some(pipeline) = resources.graphics_pipelines.get(self.pipeline) else {
            panic!("effect recorded before its pipeline was created");
        };
        let (render_pass, framebuffer) = self.targets(resources);
        let (Some(gpu_render_pass), Some(gpu_framebuffer)) =
            (render_pass.gpu_render_pass(), framebuffer.gpu_framebuffer())
        else {
            panic!("effect recorded before its render targets were created");
        };
        let Some(secondary) = self.frame_data.get_mut(frame as usize) else {
            panic!("effect has no command list for frame {}", frame);
        };

        secondary.begin(Some(CommandListInheritance {
            render_pass: gpu_render_pass,
            framebuffer: gpu_framebuffer,
        }))?;
        pipeline.bind_and_draw(secondary.as_mut(), descriptor_pool, frame)?;
        secondary.end()?;

        self.recorded[frame as usize] = true;
        Ok(())
    }

    /// Execute `frame`'s recorded secondary list inside the render pass
    /// already begun on `primary`
    ///
    /// # Panics
    ///
    /// Panics if `frame` was not recorded. A recording is consumed by one
    /// execute; the frame must be recorded again before the next.
    pub fn execute(&mut self, primary: &mut dyn CommandList, frame: u32) -> Result<()> {
        assert!(
            self.is_recorded(frame),
            "effect rendered before being recorded for frame {}",
            frame
        );
        let Some(secondary) = self.secondary(frame) else {
            panic!("effect has no command list for frame {}", frame);
        };
        primary.execute_secondary(secondary)?;
        self.recorded[frame as usize] = false;
        Ok(())
    }

    /// The render pass and framebuffer the effect draws into
    ///
    /// # Panics
    ///
    /// Panics if either does not exist.
    pub fn targets<'a>(&self, resources: &'a Resources) -> (&'a RenderPass, &'a Framebuffer) {
        match (
            resources.render_passes.get(self.render_pass),
            resources.framebuffers.get(self.framebuffer),
        ) {
            (Some(render_pass), Some(framebuffer)) => (render_pass, framebuffer),
            _ => panic!("effect render targets do not exist"),
        }
    }

    /// Begin the effect's render pass on `primary` with secondary contents
    pub fn begin(&self, resources: &Resources, primary: &mut dyn CommandList) -> Result<()> {
        let (render_pass, framebuffer) = self.targets(resources);
        let (Some(gpu_render_pass), Some(gpu_framebuffer)) =
            (render_pass.gpu_render_pass(), framebuffer.gpu_framebuffer())
        else {
            panic!("effect render targets are not created");
        };
        primary.begin_render_pass(
            gpu_render_pass,
            gpu_framebuffer,
            SubpassContents::SecondaryCommandLists,
        )
    }

    pub fn end(&self, primary: &mut dyn CommandList) -> Result<()> {
        primary.end_render_pass()
    }

    /// Begin the effect's render pass, execute `frame`'s secondary list, end
    ///
    /// # Panics
    ///
    /// Panics if `frame` was not recorded.
    pub fn render(
        &mut self,
        resources: &Resources,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        assert!(
            self.is_recorded(frame),
            "effect rendered before being recorded for frame {}",
            frame
        );
        self.begin(resources, primary)?;
        self.execute(primary, frame)?;
        self.end(primary)
    }

    /// Free frame data and the pipeline, plus the render targets the effect owns
    pub fn destroy(&mut self, resources: &mut Resources) -> Result<()> {
        self.frame_data.clear();
        let mut results = vec![self.destroy_pipeline(resources)];
        self.recorded.clear();

        if self.owns_targets {
            if self.framebuffer.is_valid() {
                results.push(resources.remove_framebuffer(self.framebuffer));
            }
            if self.render_pass.is_valid() {
                results.push(resources.remove_render_pass(self.render_pass));
            }
            self.framebuffer = Id::BAD;
            self.render_pass = Id::BAD;
        }
        results.into_iter().collect()
    }
}

/// Ordered chain of post filters
#[derive(Default)]
pub struct PostProcessing {
    filters: Vec<PostEffect>,
}

impl PostProcessing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: PostEffect) {
        self.filters.push(filter);
    }

    pub fn filter(&self, index: usize) -> Option<&PostEffect> {
        self.filters.get(index)
    }

    pub fn filters(&self) -> &[PostEffect] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Render targets, frame data and descriptors of every filter, in order
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        formats: &TextureFormatDefaults,
        descriptor_pool: &mut DescriptorPool,
        binding_offset: &mut u32,
    ) -> Result<()> {
        for filter in &mut self.filters {
            filter.create_render_pass(device, resources, formats)?;
            filter.create_frame_data(device, resources)?;
            filter.create_descriptors(descriptor_pool, resources, binding_offset);
        }
        Ok(())
    }

    pub fn create_pipelines(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        descriptor_pool: &DescriptorPool,
    ) -> Result<()> {
        for filter in &mut self.filters {
            filter.create_pipeline(device, resources, descriptor_pool)?;
        }
        Ok(())
    }

    pub fn record(
        &mut self,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
        frame: u32,
    ) -> Result<()> {
        for filter in &mut self.filters {
            filter.record(resources, descriptor_pool, frame)?;
        }
        Ok(())
    }

    pub fn render(
        &mut self,
        resources: &Resources,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        for filter in &mut self.filters {
            filter.render(resources, primary, frame)?;
        }
        Ok(())
    }

    /// Destroy and drop every filter; keeps going past failures and returns
    /// the first
    pub fn destroy(&mut self, resources: &mut Resources) -> Result<()> {
        let results: Vec<Result<()>> = self
            .filters
            .drain(..)
            .map(|mut filter| filter.destroy(resources))
            .collect();
        results.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "post_fx_tests.rs"]
mod tests;
