/// Shader module trait and descriptor

use std::any::Any;

/// Pipeline stage a shader module runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone, Copy)]
pub struct ShaderModuleDesc<'a> {
    pub stage: ShaderStage,
    /// SPIR-V bytecode (length must be a multiple of 4)
    pub code: &'a [u8],
    /// Entry point name
    pub entry_point: &'a str,
}

/// Shader module resource trait
///
/// Implemented by backend-specific shader types. Destroyed on drop.
pub trait GpuShaderModule: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn entry_point(&self) -> &str;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
