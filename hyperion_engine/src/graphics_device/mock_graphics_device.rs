/// Mock graphics device for unit tests (no GPU required)
///
/// Records every command as a string, counts live GPU objects and lets
/// tests switch off format/feature support to exercise fallback paths.

use std::any::Any;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    BufferDesc, BufferImageCopy, BufferUsage, CommandList, CommandListInheritance,
    CommandListLevel, DescriptorSetLayoutDesc, DescriptorType, DescriptorWrite, Extent2D,
    FormatFeatures, FramebufferDesc, GpuBuffer, GpuDescriptorSets, GpuFramebuffer, GpuImage,
    GpuImageDesc, GpuPipeline, GpuRenderPass, GpuShaderModule, GraphicsDevice, ImageBlit,
    ImageFormatQuery, ImageTiling, IndexType, PipelineDesc, PrimitiveTopology, RenderPassDesc,
    ResourceState, ShaderModuleDesc, ShaderStage, SubpassContents, SubresourceRange,
    VertexLayout,
};
use crate::image::InternalFormat;

const LOG_SOURCE: &str = "hyperion::MockDevice";

/// Keeps the device's live-object counter up to date
#[derive(Debug)]
pub struct LiveToken(Arc<AtomicUsize>);

impl LiveToken {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock Image
// ============================================================================

#[derive(Debug)]
pub struct MockImage {
    pub desc: GpuImageDesc,
    pub serial: u32,
    _token: LiveToken,
}

impl GpuImage for MockImage {
    fn desc(&self) -> &GpuImageDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub usage: BufferUsage,
    pub serial: u32,
    data: Mutex<Vec<u8>>,
    _token: LiveToken,
}

impl MockBuffer {
    /// Snapshot of the buffer contents
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().map(|data| data.clone()).unwrap_or_default()
    }
}

impl GpuBuffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut contents = match self.data.lock() {
            Ok(contents) => contents,
            Err(_) => engine_bail!(LOG_SOURCE, "buffer mutex poisoned"),
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            engine_bail!(
                LOG_SOURCE,
                "write of {} bytes at {} overflows buffer of {} bytes",
                data.len(),
                offset,
                contents.len()
            );
        }
        contents[start..end].copy_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.lock().map(|data| data.len() as u64).unwrap_or(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock RenderPass / Framebuffer
// ============================================================================

#[derive(Debug)]
pub struct MockRenderPass {
    pub desc: RenderPassDesc,
    pub serial: u32,
    _token: LiveToken,
}

impl GpuRenderPass for MockRenderPass {
    fn attachment_count(&self) -> u32 {
        self.desc.attachments.len() as u32
    }

    fn color_attachment_count(&self) -> u32 {
        self.desc.attachments.iter().filter(|a| !a.is_depth()).count() as u32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
    pub serial: u32,
    pub attachment_serials: Vec<u32>,
    _token: LiveToken,
}

impl GpuFramebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Shader / Pipeline / Descriptor sets
// ============================================================================

#[derive(Debug)]
pub struct MockShaderModule {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub code_size: usize,
    _token: LiveToken,
}

impl GpuShaderModule for MockShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockPipeline {
    pub serial: u32,
    pub topology: PrimitiveTopology,
    pub vertex_layout: VertexLayout,
    pub stages: Vec<ShaderStage>,
    pub set_layouts: Vec<u32>,
    _token: LiveToken,
}

impl GpuPipeline for MockPipeline {
    fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockDescriptorSets {
    pub layouts: Vec<DescriptorSetLayoutDesc>,
    /// (set, binding, type) of every write
    pub writes: Vec<(u32, u32, DescriptorType)>,
    _token: LiveToken,
}

impl GpuDescriptorSets for MockDescriptorSets {
    fn set_count(&self) -> u32 {
        self.layouts.len() as u32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

fn serial_of_image(image: &dyn GpuImage) -> u32 {
    image.as_any().downcast_ref::<MockImage>().map_or(0, |i| i.serial)
}

fn serial_of_buffer(buffer: &dyn GpuBuffer) -> u32 {
    buffer.as_any().downcast_ref::<MockBuffer>().map_or(0, |b| b.serial)
}

fn serial_of_render_pass(render_pass: &dyn GpuRenderPass) -> u32 {
    render_pass.as_any().downcast_ref::<MockRenderPass>().map_or(0, |r| r.serial)
}

fn serial_of_framebuffer(framebuffer: &dyn GpuFramebuffer) -> u32 {
    framebuffer.as_any().downcast_ref::<MockFramebuffer>().map_or(0, |f| f.serial)
}

fn serial_of_pipeline(pipeline: &dyn GpuPipeline) -> u32 {
    pipeline.as_any().downcast_ref::<MockPipeline>().map_or(0, |p| p.serial)
}

#[derive(Debug)]
pub struct MockCommandList {
    pub level: CommandListLevel,
    pub commands: Vec<String>,
    /// Number of times `begin` was called
    pub recordings: u32,
    recording: bool,
    _token: LiveToken,
}

impl MockCommandList {
    fn push(&mut self, command: String) -> Result<()> {
        if !self.recording {
            engine_bail!(LOG_SOURCE, "'{}' recorded outside begin/end", command);
        }
        self.commands.push(command);
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn level(&self) -> CommandListLevel {
        self.level
    }

    fn begin(&mut self, inheritance: Option<CommandListInheritance>) -> Result<()> {
        self.commands.clear();
        self.recording = true;
        self.recordings += 1;
        match inheritance {
            Some(inherit) => self.push(format!(
                "begin(rp#{}, fb#{})",
                serial_of_render_pass(inherit.render_pass),
                serial_of_framebuffer(inherit.framebuffer)
            )),
            None => self.push("begin".to_string()),
        }
    }

    fn end(&mut self) -> Result<()> {
        self.push("end".to_string())?;
        self.recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn GpuFramebuffer,
        contents: SubpassContents,
    ) -> Result<()> {
        self.push(format!(
            "begin_render_pass(rp#{}, fb#{}, {:?})",
            serial_of_render_pass(render_pass),
            serial_of_framebuffer(framebuffer),
            contents
        ))
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.push("end_render_pass".to_string())
    }

    fn execute_secondary(&mut self, secondary: &dyn CommandList) -> Result<()> {
        let Some(secondary) = secondary.as_any().downcast_ref::<MockCommandList>() else {
            engine_bail!(LOG_SOURCE, "secondary is not a mock command list");
        };
        if secondary.level != CommandListLevel::Secondary {
            engine_bail!(LOG_SOURCE, "executed a primary command list as secondary");
        }
        if secondary.recording {
            engine_bail!(LOG_SOURCE, "executed a secondary command list still recording");
        }

        self.push("execute_secondary".to_string())?;
        let nested: Vec<String> = secondary
            .commands
            .iter()
            .map(|command| format!("secondary:{}", command))
            .collect();
        for command in nested {
            self.push(command)?;
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()> {
        self.push(format!("bind_pipeline(#{})", serial_of_pipeline(pipeline)))
    }

    fn bind_descriptor_sets(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        sets: &dyn GpuDescriptorSets,
        set_indices: &[u32],
    ) -> Result<()> {
        if let Some(&index) = set_indices.iter().find(|&&i| i >= sets.set_count()) {
            engine_bail!(LOG_SOURCE, "descriptor set {} out of range", index);
        }
        self.push(format!("bind_descriptor_sets({:?})", set_indices))
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        self.push(format!("bind_vertex_buffer(#{}, {})", serial_of_buffer(buffer), offset))
    }

    fn bind_index_buffer(
        &mut self,
        buffer: &dyn GpuBuffer,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.push(format!(
            "bind_index_buffer(#{}, {}, {:?})",
            serial_of_buffer(buffer),
            offset,
            index_type
        ))
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) -> Result<()> {
        self.push(format!("draw({}, {}, {})", vertex_count, instance_count, first_vertex))
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<()> {
        self.push(format!(
            "draw_indexed({}, {}, {}, {})",
            index_count, instance_count, first_index, vertex_offset
        ))
    }

    fn pipeline_barrier(
        &mut self,
        image: &dyn GpuImage,
        range: SubresourceRange,
        old_state: ResourceState,
        new_state: ResourceState,
    ) -> Result<()> {
        self.push(format!(
            "barrier(#{}, {:?}->{:?}, mips {}+{}, layers {})",
            serial_of_image(image),
            old_state,
            new_state,
            range.base_mip_level,
            range.mip_level_count,
            range.layer_count
        ))
    }

    fn copy_buffer_to_image(
        &mut self,
        buffer: &dyn GpuBuffer,
        image: &dyn GpuImage,
        region: BufferImageCopy,
    ) -> Result<()> {
        self.push(format!(
            "copy(#{} -> #{}, offset {}, layer {})",
            serial_of_buffer(buffer),
            serial_of_image(image),
            region.buffer_offset,
            region.layer
        ))
    }

    fn blit_image(&mut self, image: &dyn GpuImage, blit: ImageBlit) -> Result<()> {
        self.push(format!(
            "blit(#{}, mip {} -> {})",
            serial_of_image(image),
            blit.src_mip_level,
            blit.dst_mip_level
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    pub frames_in_flight: u32,
    pub swapchain_extent: Extent2D,
    /// Formats `supports_image_format` rejects
    pub unsupported_formats: Vec<InternalFormat>,
    /// Whether formats report linear blit support
    pub blit_supported: bool,
    /// Make the next `create_image` fail
    pub fail_next_image: bool,
    /// Make every `wait_idle` fail
    pub fail_wait_idle: bool,
    /// Commands recorded by every `execute_one_time` call, in order
    pub one_time_commands: Vec<String>,
    /// Commands of every submitted primary list
    pub submissions: Vec<Vec<String>>,
    wait_idle_calls: AtomicU32,
    live: Arc<AtomicUsize>,
    next_serial: u32,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            frames_in_flight: 2,
            swapchain_extent: Extent2D::new(800, 600),
            unsupported_formats: Vec::new(),
            blit_supported: true,
            fail_next_image: false,
            fail_wait_idle: false,
            one_time_commands: Vec::new(),
            submissions: Vec::new(),
            wait_idle_calls: AtomicU32::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            next_serial: 0,
        }
    }

    /// Number of GPU objects currently alive
    pub fn live_objects(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn wait_idle_calls(&self) -> u32 {
        self.wait_idle_calls.load(Ordering::SeqCst)
    }

    /// Stand-alone command list (not counted against a device call)
    pub fn command_list(&mut self, level: CommandListLevel) -> MockCommandList {
        MockCommandList {
            level,
            commands: Vec::new(),
            recordings: 0,
            recording: false,
            _token: LiveToken::new(&self.live),
        }
    }

    fn serial(&mut self) -> u32 {
        self.next_serial += 1;
        self.next_serial
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    fn swapchain_extent(&self) -> Extent2D {
        self.swapchain_extent
    }

    fn supports_image_format(&self, query: &ImageFormatQuery) -> bool {
        !self.unsupported_formats.contains(&query.format)
    }

    fn supports_format_features(
        &self,
        format: InternalFormat,
        _tiling: ImageTiling,
        features: FormatFeatures,
    ) -> bool {
        if format == InternalFormat::None || self.unsupported_formats.contains(&format) {
            return false;
        }

        let blit = FormatFeatures::BLIT_SRC | FormatFeatures::BLIT_DST;
        if features.intersects(blit) && !self.blit_supported {
            return false;
        }

        if format.is_depth() {
            !features.intersects(FormatFeatures::COLOR_ATTACHMENT | FormatFeatures::STORAGE_IMAGE)
        } else {
            !features.contains(FormatFeatures::DEPTH_STENCIL_ATTACHMENT)
        }
    }

    fn create_image(&mut self, desc: &GpuImageDesc) -> Result<Box<dyn GpuImage>> {
        if std::mem::take(&mut self.fail_next_image) {
            engine_bail!(LOG_SOURCE, "image allocation failed");
        }
        Ok(Box::new(MockImage {
            desc: *desc,
            serial: self.serial(),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Box<dyn GpuBuffer>> {
        Ok(Box::new(MockBuffer {
            usage: desc.usage,
            serial: self.serial(),
            data: Mutex::new(vec![0; desc.size as usize]),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Box<dyn GpuRenderPass>> {
        Ok(Box::new(MockRenderPass {
            desc: desc.clone(),
            serial: self.serial(),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_framebuffer(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        desc: &FramebufferDesc,
    ) -> Result<Box<dyn GpuFramebuffer>> {
        if desc.attachments.len() as u32 != render_pass.attachment_count() {
            engine_bail!(
                LOG_SOURCE,
                "framebuffer has {} attachments, render pass expects {}",
                desc.attachments.len(),
                render_pass.attachment_count()
            );
        }
        Ok(Box::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            serial: self.serial(),
            attachment_serials: desc.attachments.iter().map(|a| serial_of_image(*a)).collect(),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_shader(&mut self, desc: &ShaderModuleDesc) -> Result<Box<dyn GpuShaderModule>> {
        if desc.code.is_empty() || desc.code.len() % 4 != 0 {
            engine_bail!(LOG_SOURCE, "SPIR-V size {} is not a multiple of 4", desc.code.len());
        }
        Ok(Box::new(MockShaderModule {
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
            code_size: desc.code.len(),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_descriptor_sets(
        &mut self,
        layouts: &[DescriptorSetLayoutDesc],
        writes: &[DescriptorWrite],
    ) -> Result<Box<dyn GpuDescriptorSets>> {
        for write in writes {
            let Some(layout) = layouts.get(write.set as usize) else {
                engine_bail!(LOG_SOURCE, "write targets missing set {}", write.set);
            };
            let declared = layout.bindings.iter().find(|b| b.binding == write.binding);
            match declared {
                Some(binding) if binding.descriptor_type == write.resource.descriptor_type() => {}
                _ => engine_bail!(
                    LOG_SOURCE,
                    "write to set {} binding {} does not match its layout",
                    write.set,
                    write.binding
                ),
            }
        }

        Ok(Box::new(MockDescriptorSets {
            layouts: layouts.to_vec(),
            writes: writes
                .iter()
                .map(|w| (w.set, w.binding, w.resource.descriptor_type()))
                .collect(),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Box<dyn GpuPipeline>> {
        if desc.shader_modules.is_empty() {
            engine_bail!(LOG_SOURCE, "pipeline has no shader modules");
        }
        let set_count = desc.descriptor_sets.set_count();
        if desc.set_layouts.iter().any(|&index| index >= set_count) {
            engine_bail!(LOG_SOURCE, "pipeline layout references a missing descriptor set");
        }
        Ok(Box::new(MockPipeline {
            serial: self.serial(),
            topology: desc.topology,
            vertex_layout: desc.vertex_layout,
            stages: desc.shader_modules.iter().map(|m| m.stage()).collect(),
            set_layouts: desc.set_layouts.clone(),
            _token: LiveToken::new(&self.live),
        }))
    }

    fn create_command_list(&mut self, level: CommandListLevel) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(self.command_list(level)))
    }

    fn execute_one_time(
        &mut self,
        record: &mut dyn FnMut(&mut dyn CommandList) -> Result<()>,
    ) -> Result<()> {
        let mut cmd = self.command_list(CommandListLevel::Primary);
        cmd.begin(None)?;
        record(&mut cmd)?;
        cmd.end()?;
        self.one_time_commands.extend(cmd.commands);
        Ok(())
    }

    fn submit(&mut self, command_lists: &[&dyn CommandList]) -> Result<()> {
        for list in command_lists {
            let Some(list) = list.as_any().downcast_ref::<MockCommandList>() else {
                engine_bail!(LOG_SOURCE, "submitted a foreign command list");
            };
            self.submissions.push(list.commands.clone());
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.wait_idle_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_wait_idle {
            engine_bail!(LOG_SOURCE, "device lost");
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
