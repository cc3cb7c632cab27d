/// Pipeline trait and pipeline descriptor

use std::any::Any;

use crate::graphics_device::{Extent2D, GpuDescriptorSets, GpuRenderPass, GpuShaderModule};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
    /// Used for the full-screen quad
    TriangleFan,
}

/// Vertex input layout consumed by a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// No vertex buffer; vertices generated in the shader
    None,
    /// Interleaved position (vec3), normal (vec3), texcoord (vec2)
    Mesh,
    /// Per-instance position + size (vec4)
    Particle,
}

impl VertexLayout {
    /// Vertex stride in bytes
    pub fn stride(&self) -> u32 {
        match self {
            VertexLayout::None => 0,
            VertexLayout::Mesh => 32,
            VertexLayout::Particle => 16,
        }
    }
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Descriptor for creating a graphics pipeline
pub struct PipelineDesc<'a> {
    /// Render pass the pipeline draws in
    pub render_pass: &'a dyn GpuRenderPass,
    /// One module per stage
    pub shader_modules: Vec<&'a dyn GpuShaderModule>,
    pub topology: PrimitiveTopology,
    pub vertex_layout: VertexLayout,
    pub cull_mode: CullMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
    /// Static viewport/scissor size
    pub viewport: Extent2D,
    /// Descriptor sets whose layouts build the pipeline layout
    pub descriptor_sets: &'a dyn GpuDescriptorSets,
    /// Indices into `descriptor_sets`, in pipeline set order
    pub set_layouts: Vec<u32>,
}

/// Graphics pipeline resource trait
///
/// Implemented by backend-specific pipeline types. Destroyed on drop.
pub trait GpuPipeline: Send + Sync {
    fn topology(&self) -> PrimitiveTopology;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
