/// Descriptor sets - resource bindings visible to shaders

use std::any::Any;

use crate::graphics_device::{GpuBuffer, GpuImage};

/// Kind of resource bound at a descriptor binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    /// Image + sampler, read in shaders
    SampledImage,
    /// Image read/written by shaders
    StorageImage,
    UniformBuffer,
    StorageBuffer,
}

/// One binding of a descriptor set layout (visible to all graphics stages)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBindingDesc {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
}

/// Layout of one descriptor set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    pub bindings: Vec<DescriptorBindingDesc>,
}

/// Resource written into a binding
#[derive(Clone, Copy)]
pub enum DescriptorResource<'a> {
    SampledImage(&'a dyn GpuImage),
    StorageImage(&'a dyn GpuImage),
    UniformBuffer(&'a dyn GpuBuffer),
    StorageBuffer(&'a dyn GpuBuffer),
}

impl DescriptorResource<'_> {
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            DescriptorResource::SampledImage(_) => DescriptorType::SampledImage,
            DescriptorResource::StorageImage(_) => DescriptorType::StorageImage,
            DescriptorResource::UniformBuffer(_) => DescriptorType::UniformBuffer,
            DescriptorResource::StorageBuffer(_) => DescriptorType::StorageBuffer,
        }
    }
}

/// Write of one resource into `binding` of set `set`
#[derive(Clone, Copy)]
pub struct DescriptorWrite<'a> {
    /// Index into the layouts passed to `create_descriptor_sets`
    pub set: u32,
    pub binding: u32,
    pub resource: DescriptorResource<'a>,
}

/// Allocated descriptor sets (and their layouts)
///
/// Implemented by backend-specific types. Pool, layouts and sets are
/// destroyed on drop.
pub trait GpuDescriptorSets: Send + Sync {
    /// Number of sets allocated
    fn set_count(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
