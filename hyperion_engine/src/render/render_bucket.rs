/// RenderBucketContainer - one render pass, framebuffer and pipeline table
/// per draw category
///
/// Creation order per bucket is render pass, framebuffer, pipelines;
/// destruction runs framebuffer, render pass, then pipelines. Pipelines added
/// before `create_pipelines` wait in their table and are created with it.

use crate::config::{TextureFormatDefault, TextureFormatDefaults};
use crate::error::Result;
use crate::graphics_device::{CommandList, GraphicsDevice, SubpassContents};
use crate::object::{Id, ObjectHolder};
use crate::render::{
    Bucket, DescriptorPool, Framebuffer, GraphicsPipeline, RenderPass, Resources,
};
use crate::engine_debug;

const LOG_SOURCE: &str = "hyperion::RenderBucket";

/// Lifecycle of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BucketState {
    Uninitialized,
    RenderPassCreated,
    FramebufferCreated,
    PipelinesCreated,
    Destroyed,
}

pub struct RenderBucket {
    bucket: Bucket,
    state: BucketState,
    render_pass: Id<RenderPass>,
    framebuffer: Id<Framebuffer>,
    pipelines: ObjectHolder<GraphicsPipeline>,
}

impl RenderBucket {
    fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            state: BucketState::Uninitialized,
            render_pass: Id::BAD,
            framebuffer: Id::BAD,
            pipelines: ObjectHolder::new(true),
        }
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn state(&self) -> BucketState {
        self.state
    }

    pub fn render_pass(&self) -> Id<RenderPass> {
        self.render_pass
    }

    pub fn framebuffer(&self) -> Id<Framebuffer> {
        self.framebuffer
    }

    pub fn pipelines(&self) -> &ObjectHolder<GraphicsPipeline> {
        &self.pipelines
    }

    pub fn pipeline(&self, id: Id<GraphicsPipeline>) -> Option<&GraphicsPipeline> {
        self.pipelines.get(id)
    }

    /// Color, normals, positions and depth attachments, drawn through
    /// secondary command lists
    pub fn create_render_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        formats: &TextureFormatDefaults,
    ) -> Result<()> {
        let render_pass = RenderPass::with_formats(
            SubpassContents::SecondaryCommandLists,
            &[
                formats.get(TextureFormatDefault::Color),
                formats.get(TextureFormatDefault::GBuffer),
                formats.get(TextureFormatDefault::GBuffer),
                formats.get(TextureFormatDefault::Depth),
            ],
        );
        self.render_pass = resources.add_render_pass(device, render_pass)?;
        self.state = BucketState::RenderPassCreated;
        Ok(())
    }

    /// Framebuffer at the swapchain extent
    ///
    /// # Panics
    ///
    /// Panics if the render pass does not exist yet.
    pub fn create_framebuffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
    ) -> Result<()> {
        assert!(
            resources.render_passes.contains(self.render_pass),
            "{:?} bucket framebuffer created before its render pass",
            self.bucket
        );
        let extent = device.swapchain_extent();
        self.framebuffer =
            resources.add_framebuffer(device, extent.width, extent.height, self.render_pass)?;
        self.state = BucketState::FramebufferCreated;
        Ok(())
    }

    /// Store `pipeline`; it is created now if the bucket's pipelines already are
    ///
    /// # Panics
    ///
    /// Panics if the bucket has no render pass or `pipeline` belongs to
    /// another bucket.
    pub fn add_graphics_pipeline(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
        pipeline: GraphicsPipeline,
    ) -> Result<Id<GraphicsPipeline>> {
        let Some(render_pass) = resources.render_passes.get(self.render_pass) else {
            panic!("pipeline added to {:?} bucket before its render pass", self.bucket);
        };
        assert_eq!(
            pipeline.bucket(),
            self.bucket,
            "pipeline added to the wrong bucket"
        );

        self.pipelines.add(pipeline, |pipeline| {
            pipeline.create(device, render_pass, descriptor_pool)?;
            pipeline.create_frame_data(device)
        })
    }

    pub fn remove_graphics_pipeline(&mut self, id: Id<GraphicsPipeline>) -> Result<()> {
        self.pipelines.remove(id)
    }

    /// Create every pipeline added so far
    ///
    /// # Panics
    ///
    /// Panics if the bucket has no render pass.
    pub fn create_pipelines(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
    ) -> Result<()> {
        let Some(render_pass) = resources.render_passes.get(self.render_pass) else {
            panic!("{:?} bucket pipelines created before its render pass", self.bucket);
        };

        self.pipelines.create_all(|pipeline| {
            pipeline.create(device, render_pass, descriptor_pool)?;
            pipeline.create_frame_data(device)
        })?;

        engine_debug!(
            LOG_SOURCE,
            "Created {} pipeline(s) in {:?} bucket",
            self.pipelines.len(),
            self.bucket
        );
        self.state = BucketState::PipelinesCreated;
        Ok(())
    }

    /// The bucket's render pass and framebuffer
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
            _ => panic!(
                "{:?} bucket rendered before its render pass and framebuffer exist",
                self.bucket
            ),
        }
    }

    /// Begin the bucket's render pass with secondary contents
    pub fn begin(&self, resources: &Resources, primary: &mut dyn CommandList) -> Result<()> {
        let (render_pass, framebuffer) = self.targets(resources);
        let (Some(gpu_render_pass), Some(gpu_framebuffer)) =
            (render_pass.gpu_render_pass(), framebuffer.gpu_framebuffer())
        else {
            panic!("{:?} bucket render targets are not created", self.bucket);
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

    /// Render every pipeline in slot order inside the pass already begun on
    /// `primary` with `render_pass` and `framebuffer`
    ///
    /// The targets need not be this bucket's own, only compatible with them.
    pub fn render_pipelines(
        &mut self,
        render_pass: &RenderPass,
        framebuffer: &Framebuffer,
        descriptor_pool: &DescriptorPool,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        for (_, pipeline) in self.pipelines.iter_mut() {
            pipeline.render(primary, render_pass, framebuffer, descriptor_pool, frame)?;
        }
        Ok(())
    }

    /// Begin the pass, render every pipeline, end the pass
    pub fn render(
        &mut self,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        let (render_pass, framebuffer) = self.targets(resources);
        self.begin(resources, primary)?;
        self.render_pipelines(render_pass, framebuffer, descriptor_pool, primary, frame)?;
        self.end(primary)
    }

    /// Framebuffer, render pass, then pipelines; returns the first failure
    pub fn destroy(&mut self, resources: &mut Resources) -> Result<()> {
        let mut results = Vec::with_capacity(3);
        if self.framebuffer.is_valid() {
            results.push(resources.remove_framebuffer(self.framebuffer));
        }
        if self.render_pass.is_valid() {
            results.push(resources.remove_render_pass(self.render_pass));
        }
        self.framebuffer = Id::BAD;
        self.render_pass = Id::BAD;

        results.push(self.pipelines.remove_all());
        self.state = BucketState::Destroyed;
        results.into_iter().collect()
    }
}

pub struct RenderBucketContainer {
    buckets: [RenderBucket; 5],
}

impl RenderBucketContainer {
    pub fn new() -> Self {
        Self {
            buckets: Bucket::ALL.map(RenderBucket::new),
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> &RenderBucket {
        &self.buckets[bucket.index()]
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut RenderBucket {
        &mut self.buckets[bucket.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderBucket> {
        self.buckets.iter()
    }

    /// Render pass then framebuffer of every bucket
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &mut Resources,
        formats: &TextureFormatDefaults,
    ) -> Result<()> {
        for bucket in &mut self.buckets {
            bucket.create_render_pass(device, resources, formats)?;
            bucket.create_framebuffer(device, resources)?;
        }
        Ok(())
    }

    /// # Panics
    ///
    /// Panics unless every bucket has its render pass.
    pub fn create_pipelines(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
    ) -> Result<()> {
        for bucket in &self.buckets {
            assert!(
                resources.render_passes.contains(bucket.render_pass),
                "pipelines created before the {:?} bucket render pass",
                bucket.bucket
            );
        }

        for bucket in &mut self.buckets {
            bucket.create_pipelines(device, resources, descriptor_pool)?;
        }
        Ok(())
    }

    pub fn render(
        &mut self,
        bucket: Bucket,
        resources: &Resources,
        descriptor_pool: &DescriptorPool,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        self.buckets[bucket.index()].render(resources, descriptor_pool, primary, frame)
    }

    /// Destroy every bucket; keeps going past failures and returns the first
    pub fn destroy(&mut self, resources: &mut Resources) -> Result<()> {
        let results: Vec<Result<()>> = self
            .buckets
            .iter_mut()
            .map(|bucket| bucket.destroy(resources))
            .collect();
        results.into_iter().collect()
    }
}

impl Default for RenderBucketContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_bucket_tests.rs"]
mod tests;
