/// Resources - the engine's identity tables for GPU objects
///
/// Fields are public so callers can borrow several tables at once (a
/// framebuffer is created against a render pass living in a sibling table).

use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, ResourceState};
use crate::image::Image;
use crate::object::{Id, ObjectHolder, Ref, RefCounter};
use crate::render::{Framebuffer, GraphicsPipeline, RenderPass, Shader};
use crate::engine_bail;

const LOG_SOURCE: &str = "hyperion::Resources";

pub struct Resources {
    pub textures: ObjectHolder<Image>,
    pub render_passes: ObjectHolder<RenderPass>,
    pub framebuffers: ObjectHolder<Framebuffer>,
    /// Pipelines outside the render buckets (post effects)
    pub graphics_pipelines: ObjectHolder<GraphicsPipeline>,
    /// Declared last: dropped after the pipelines holding `Ref<Shader>`s
    pub shaders: RefCounter<Shader>,
}

impl Resources {
    pub fn new() -> Self {
        Self {
            textures: ObjectHolder::new(false),
            render_passes: ObjectHolder::new(false),
            framebuffers: ObjectHolder::new(false),
            graphics_pipelines: ObjectHolder::new(false),
            shaders: RefCounter::new(),
        }
    }

    /// Create the shader modules and share the shader
    pub fn add_shader(&self, device: &mut dyn GraphicsDevice, mut shader: Shader) -> Result<Ref<Shader>> {
        shader.create(device)?;
        Ok(self.shaders.add(shader))
    }

    /// Create `image` (uploading its host bytes) into `state`
    pub fn add_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        image: Image,
        state: ResourceState,
    ) -> Result<Id<Image>> {
        self.textures
            .add(image, |image| image.create_with_state(device, state))
    }

    pub fn remove_texture(&mut self, id: Id<Image>) -> Result<()> {
        self.textures.remove(id)
    }

    pub fn add_render_pass(
        &mut self,
        device: &mut dyn GraphicsDevice,
        render_pass: RenderPass,
    ) -> Result<Id<RenderPass>> {
        self.render_passes
            .add(render_pass, |render_pass| render_pass.create(device))
    }

    pub fn remove_render_pass(&mut self, id: Id<RenderPass>) -> Result<()> {
        self.render_passes.remove(id)
    }

    /// Framebuffer of `width` x `height` matching `render_pass`'s attachments
    pub fn add_framebuffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        render_pass: Id<RenderPass>,
    ) -> Result<Id<Framebuffer>> {
        let Some(render_pass) = self.render_passes.get(render_pass) else {
            engine_bail!(LOG_SOURCE, "no render pass with id {:?}", render_pass);
        };
        let framebuffer = Framebuffer::for_render_pass(width, height, render_pass);
        self.framebuffers
            .add(framebuffer, |framebuffer| framebuffer.create(device, render_pass))
    }

    pub fn remove_framebuffer(&mut self, id: Id<Framebuffer>) -> Result<()> {
        self.framebuffers.remove(id)
    }

    /// Destroy every table entry; pipelines go first, then framebuffers,
    /// render passes and textures
    ///
    /// Returns the first failure. Shaders are released with their last `Ref`.
    pub fn destroy(&mut self) -> Result<()> {
        let results = [
            self.graphics_pipelines.remove_all(),
            self.framebuffers.remove_all(),
            self.render_passes.remove_all(),
            self.textures.remove_all(),
        ];
        results.into_iter().collect()
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}
