/// GraphicsPipeline - pipeline state, its renderables and per-frame
/// secondary command lists
///
/// A pipeline belongs to one `Bucket`. Each frame it re-records its
/// secondary list for that frame inside the bucket's render pass and
/// executes it from the primary list.

use crate::error::Result;
use crate::graphics_device::{
    CommandList, CommandListInheritance, CommandListLevel, CullMode, GpuPipeline, GraphicsDevice,
    PipelineDesc, PrimitiveTopology, VertexLayout,
};
use crate::object::{GpuComponent, Id, Identified, Ref};
use crate::render::{frame_sets, DescriptorPool, Framebuffer, RenderPass, Renderable, Shader};
use crate::{engine_bail, engine_debug};

const LOG_SOURCE: &str = "hyperion::GraphicsPipeline";

/// Draw category; buckets render in this order within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Skybox,
    Opaque,
    Translucent,
    Particle,
    Screen,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Skybox,
        Bucket::Opaque,
        Bucket::Translucent,
        Bucket::Particle,
        Bucket::Screen,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

pub struct GraphicsPipeline {
    id: Id<GraphicsPipeline>,
    shader: Ref<Shader>,
    bucket: Bucket,
    topology: PrimitiveTopology,
    vertex_layout: VertexLayout,
    cull_mode: CullMode,
    depth_test: bool,
    depth_write: bool,
    blend: bool,
    renderables: Vec<Renderable>,
    gpu_pipeline: Option<Box<dyn GpuPipeline>>,
    /// One secondary list per frame in flight
    frame_data: Vec<Box<dyn CommandList>>,
}

impl GraphicsPipeline {
    /// Pipeline with the fixed-function defaults of `bucket`
    pub fn new(shader: Ref<Shader>, bucket: Bucket) -> Self {
        let (topology, vertex_layout, cull_mode, depth_test, depth_write, blend) = match bucket {
            Bucket::Skybox => (
                PrimitiveTopology::TriangleList,
                VertexLayout::Mesh,
                CullMode::Front,
                false,
                false,
                false,
            ),
            Bucket::Opaque => (
                PrimitiveTopology::TriangleList,
                VertexLayout::Mesh,
                CullMode::Back,
                true,
                true,
                false,
            ),
            Bucket::Translucent => (
                PrimitiveTopology::TriangleList,
                VertexLayout::Mesh,
                CullMode::Back,
                true,
                false,
                true,
            ),
            Bucket::Particle => (
                PrimitiveTopology::TriangleStrip,
                VertexLayout::Particle,
                CullMode::None,
                true,
                false,
                true,
            ),
            Bucket::Screen => (
                PrimitiveTopology::TriangleFan,
                VertexLayout::None,
                CullMode::None,
                false,
                false,
                false,
            ),
        };

        Self {
            id: Id::BAD,
            shader,
            bucket,
            topology,
            vertex_layout,
            cull_mode,
            depth_test,
            depth_write,
            blend,
            renderables: Vec::new(),
            gpu_pipeline: None,
            frame_data: Vec::new(),
        }
    }

    // ===== STATE =====

    pub fn set_topology(&mut self, topology: PrimitiveTopology) -> &mut Self {
        self.topology = topology;
        self
    }

    pub fn set_vertex_layout(&mut self, vertex_layout: VertexLayout) -> &mut Self {
        self.vertex_layout = vertex_layout;
        self
    }

    pub fn set_cull_mode(&mut self, cull_mode: CullMode) -> &mut Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn set_depth(&mut self, test: bool, write: bool) -> &mut Self {
        self.depth_test = test;
        self.depth_write = write;
        self
    }

    pub fn set_blend(&mut self, blend: bool) -> &mut Self {
        self.blend = blend;
        self
    }

    /// # Panics
    ///
    /// Panics once the pipeline is created.
    pub fn add_renderable(&mut self, renderable: Renderable) -> &mut Self {
        assert!(
            self.gpu_pipeline.is_none(),
            "renderable added to pipeline {:?} after create",
            self.id
        );
        self.renderables.push(renderable);
        self
    }

    // ===== ACCESSORS =====

    pub fn shader(&self) -> &Ref<Shader> {
        &self.shader
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn vertex_layout(&self) -> VertexLayout {
        self.vertex_layout
    }

    pub fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    pub fn gpu_pipeline(&self) -> Option<&dyn GpuPipeline> {
        self.gpu_pipeline.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.gpu_pipeline.is_some()
    }

    pub fn has_frame_data(&self) -> bool {
        !self.frame_data.is_empty()
    }

    // ===== CREATION =====

    /// Upload the renderables and build the GPU pipeline for `render_pass`
    ///
    /// The pipeline layout comes from the descriptor pool's sets, so the
    /// pool must already be created.
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        render_pass: &RenderPass,
        descriptor_pool: &DescriptorPool,
    ) -> Result<()> {
        let Some(gpu_render_pass) = render_pass.gpu_render_pass() else {
            engine_bail!(
                LOG_SOURCE,
                "render pass {:?} must be created before pipeline {:?}",
                render_pass.id(),
                self.id
            );
        };
        let Some(descriptor_sets) = descriptor_pool.gpu_descriptor_sets() else {
            engine_bail!(LOG_SOURCE, "descriptor pool must be created before pipeline {:?}", self.id);
        };
        if !self.shader.is_created() {
            engine_bail!(LOG_SOURCE, "shader {:?} has no modules", self.shader.id());
        }

        for renderable in &mut self.renderables {
            renderable.create(device)?;
        }

        let gpu_pipeline = device.create_pipeline(&PipelineDesc {
            render_pass: gpu_render_pass,
            shader_modules: self.shader.modules(),
            topology: self.topology,
            vertex_layout: self.vertex_layout,
            cull_mode: self.cull_mode,
            depth_test: self.depth_test,
            depth_write: self.depth_write,
            blend: self.blend,
            viewport: device.swapchain_extent(),
            descriptor_sets,
            set_layouts: frame_sets(0).to_vec(),
        })?;

        engine_debug!(
            LOG_SOURCE,
            "Created {:?} pipeline {:?} ({} renderable(s))",
            self.bucket,
            self.id,
            self.renderables.len()
        );
        self.gpu_pipeline = Some(gpu_pipeline);
        Ok(())
    }

    /// Allocate one secondary command list per frame in flight
    pub fn create_frame_data(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let frames = device.frames_in_flight();
        let mut frame_data = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            frame_data.push(device.create_command_list(CommandListLevel::Secondary)?);
        }
        self.frame_data = frame_data;
        Ok(())
    }

    // ===== RECORDING =====

    /// Bind the pipeline and `frame`'s descriptor sets, then draw every renderable
    ///
    /// # Panics
    ///
    /// Panics if the pipeline is not created.
    pub fn bind_and_draw(
        &self,
        cmd: &mut dyn CommandList,
        descriptor_pool: &DescriptorPool,
        frame: u32,
    ) -> Result<()> {
        let Some(gpu_pipeline) = self.gpu_pipeline.as_deref() else {
            panic!("pipeline {:?} drawn before create", self.id);
        };
        record_draws(cmd, gpu_pipeline, &self.renderables, descriptor_pool, frame)
    }

    /// Re-record `frame`'s secondary list inside `render_pass` and execute it
    /// from `primary`
    ///
    /// `primary` must be inside `render_pass` begun with secondary contents.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline, its frame data or the render targets are not
    /// created.
    pub fn render(
        &mut self,
        primary: &mut dyn CommandList,
        render_pass: &RenderPass,
        framebuffer: &Framebuffer,
        descriptor_pool: &DescriptorPool,
        frame: u32,
    ) -> Result<()> {
        let Some(gpu_pipeline) = self.gpu_pipeline.as_deref() else {
            panic!("pipeline {:?} rendered before create", self.id);
        };
        let Some(secondary) = self.frame_data.get_mut(frame as usize) else {
            panic!("pipeline {:?} has no command list for frame {}", self.id, frame);
        };
        let (Some(gpu_render_pass), Some(gpu_framebuffer)) =
            (render_pass.gpu_render_pass(), framebuffer.gpu_framebuffer())
        else {
            panic!("pipeline {:?} rendered into uncreated targets", self.id);
        };

        secondary.begin(Some(CommandListInheritance {
            render_pass: gpu_render_pass,
            framebuffer: gpu_framebuffer,
        }))?;
        record_draws(
            secondary.as_mut(),
            gpu_pipeline,
            &self.renderables,
            descriptor_pool,
            frame,
        )?;
        secondary.end()?;

        primary.execute_secondary(secondary.as_ref())
    }
}

fn record_draws(
    cmd: &mut dyn CommandList,
    pipeline: &dyn GpuPipeline,
    renderables: &[Renderable],
    descriptor_pool: &DescriptorPool,
    frame: u32,
) -> Result<()> {
    cmd.bind_pipeline(pipeline)?;
    descriptor_pool.bind(cmd, pipeline, frame)?;
    for renderable in renderables {
        renderable.render(cmd)?;
    }
    Ok(())
}

impl Identified for GraphicsPipeline {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

impl GpuComponent for GraphicsPipeline {
    fn destroy(&mut self) -> Result<()> {
        self.frame_data.clear();
        self.gpu_pipeline = None;
        for renderable in &mut self.renderables {
            renderable.destroy();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "graphics_pipeline_tests.rs"]
mod tests;
