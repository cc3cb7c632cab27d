/// Framebuffer - attachment images bound to a render pass layout

use crate::error::Result;
use crate::graphics_device::{
    Extent2D, FramebufferDesc, GpuFramebuffer, GpuImage, GraphicsDevice,
};
use crate::image::{Image, InternalFormat};
use crate::object::{GpuComponent, Id, Identified};
use crate::render::RenderPass;
use crate::engine_bail;

const LOG_SOURCE: &str = "hyperion::Framebuffer";

pub struct Framebuffer {
    id: Id<Framebuffer>,
    extent: Extent2D,
    attachments: Vec<Image>,
    gpu_framebuffer: Option<Box<dyn GpuFramebuffer>>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Id::BAD,
            extent: Extent2D::new(width, height),
            attachments: Vec::new(),
            gpu_framebuffer: None,
        }
    }

    /// One attachment image per attachment of `render_pass`, same formats
    pub fn for_render_pass(width: u32, height: u32, render_pass: &RenderPass) -> Self {
        let mut framebuffer = Self::new(width, height);
        for attachment in render_pass.attachments() {
            framebuffer.add_attachment(attachment.format);
        }
        framebuffer
    }

    pub fn add_attachment(&mut self, format: InternalFormat) {
        self.attachments
            .push(Image::framebuffer_attachment(self.extent, format));
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    pub fn attachments(&self) -> &[Image] {
        &self.attachments
    }

    pub fn num_attachments(&self) -> usize {
        self.attachments.len()
    }

    pub fn gpu_framebuffer(&self) -> Option<&dyn GpuFramebuffer> {
        self.gpu_framebuffer.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.gpu_framebuffer.is_some()
    }

    /// Allocate attachment images, then the GPU framebuffer against `render_pass`
    pub fn create(&mut self, device: &mut dyn GraphicsDevice, render_pass: &RenderPass) -> Result<()> {
        let Some(gpu_render_pass) = render_pass.gpu_render_pass() else {
            engine_bail!(
                LOG_SOURCE,
                "render pass {:?} must be created before framebuffer {:?}",
                render_pass.id(),
                self.id
            );
        };

        for attachment in &mut self.attachments {
            attachment.create(device)?;
        }

        let attachments: Vec<&dyn GpuImage> = self
            .attachments
            .iter()
            .filter_map(|attachment| attachment.gpu_image())
            .collect();

        self.gpu_framebuffer = Some(device.create_framebuffer(
            gpu_render_pass,
            &FramebufferDesc {
                width: self.extent.width,
                height: self.extent.height,
                attachments,
            },
        )?);
        Ok(())
    }
}

impl Identified for Framebuffer {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

impl GpuComponent for Framebuffer {
    fn destroy(&mut self) -> Result<()> {
        self.gpu_framebuffer = None;
        for attachment in &mut self.attachments {
            attachment.destroy();
        }
        Ok(())
    }
}
