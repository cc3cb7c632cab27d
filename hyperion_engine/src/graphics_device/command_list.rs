/// CommandList trait - for recording GPU commands

use std::any::Any;

use crate::error::Result;
use crate::graphics_device::{
    BufferImageCopy, GpuBuffer, GpuDescriptorSets, GpuFramebuffer, GpuImage, GpuPipeline,
    GpuRenderPass, ImageBlit, IndexType, ResourceState, SubpassContents, SubresourceRange,
};

/// Primary lists are submitted to a queue; secondary lists are executed
/// from inside a primary list's render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandListLevel {
    Primary,
    Secondary,
}

/// Render pass state a secondary command list continues
#[derive(Clone, Copy)]
pub struct CommandListInheritance<'a> {
    pub render_pass: &'a dyn GpuRenderPass,
    pub framebuffer: &'a dyn GpuFramebuffer,
}

/// Command list for recording rendering commands
///
/// Every `begin` resets the list; a list is re-recorded from scratch each time.
pub trait CommandList: Send {
    fn level(&self) -> CommandListLevel;

    /// Begin recording commands
    ///
    /// # Arguments
    ///
    /// * `inheritance` - Render pass a secondary list will execute inside
    fn begin(&mut self, inheritance: Option<CommandListInheritance>) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass over the whole framebuffer
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - Framebuffer holding the pass attachments
    /// * `contents` - Whether draws are inline or come from secondary lists
    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn GpuFramebuffer,
        contents: SubpassContents,
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Execute a recorded secondary command list
    fn execute_secondary(&mut self, secondary: &dyn CommandList) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()>;

    /// Bind descriptor sets
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline providing the layout
    /// * `sets` - Allocated descriptor sets
    /// * `set_indices` - `sets` entries bound to pipeline sets 0, 1, 2...
    fn bind_descriptor_sets(
        &mut self,
        pipeline: &dyn GpuPipeline,
        sets: &dyn GpuDescriptorSets,
        set_indices: &[u32],
    ) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()>;

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<()>;

    /// Transition `range` of `image` between states
    fn pipeline_barrier(
        &mut self,
        image: &dyn GpuImage,
        range: SubresourceRange,
        old_state: ResourceState,
        new_state: ResourceState,
    ) -> Result<()>;

    /// Copy buffer bytes into one layer of an image (image must be CopyDst)
    fn copy_buffer_to_image(
        &mut self,
        buffer: &dyn GpuBuffer,
        image: &dyn GpuImage,
        region: BufferImageCopy,
    ) -> Result<()>;

    /// Linear-filtered blit between two mips of the same image
    /// (source CopySrc, destination CopyDst)
    fn blit_image(&mut self, image: &dyn GpuImage, blit: ImageBlit) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
