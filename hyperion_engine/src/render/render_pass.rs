/// RenderPass - attachment layout shared by framebuffers and pipelines

use crate::error::Result;
use crate::graphics_device::{
    AttachmentDesc, GpuRenderPass, GraphicsDevice, RenderPassDesc, SubpassContents,
};
use crate::image::InternalFormat;
use crate::object::{GpuComponent, Id, Identified};

pub struct RenderPass {
    id: Id<RenderPass>,
    desc: RenderPassDesc,
    contents: SubpassContents,
    gpu_render_pass: Option<Box<dyn GpuRenderPass>>,
}

impl RenderPass {
    /// Empty render pass; `contents` is how its draws are submitted
    pub fn new(contents: SubpassContents) -> Self {
        Self {
            id: Id::BAD,
            desc: RenderPassDesc::default(),
            contents,
            gpu_render_pass: None,
        }
    }

    /// Render pass with one cleared attachment per format
    pub fn with_formats(contents: SubpassContents, formats: &[InternalFormat]) -> Self {
        let mut render_pass = Self::new(contents);
        for &format in formats {
            render_pass.add_attachment(AttachmentDesc::cleared(format));
        }
        render_pass
    }

    /// # Panics
    ///
    /// Panics once the GPU render pass exists.
    pub fn add_attachment(&mut self, attachment: AttachmentDesc) {
        assert!(
            self.gpu_render_pass.is_none(),
            "attachment added to render pass {:?} after create",
            self.id
        );
        self.desc.attachments.push(attachment);
    }

    pub fn attachments(&self) -> &[AttachmentDesc] {
        &self.desc.attachments
    }

    pub fn contents(&self) -> SubpassContents {
        self.contents
    }

    pub fn gpu_render_pass(&self) -> Option<&dyn GpuRenderPass> {
        self.gpu_render_pass.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.gpu_render_pass.is_some()
    }

    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.gpu_render_pass = Some(device.create_render_pass(&self.desc)?);
        Ok(())
    }
}

impl Identified for RenderPass {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

impl GpuComponent for RenderPass {
    fn destroy(&mut self) -> Result<()> {
        self.gpu_render_pass = None;
        Ok(())
    }
}
