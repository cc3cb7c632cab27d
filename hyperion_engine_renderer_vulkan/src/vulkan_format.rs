/// Engine → Vulkan enum mapping
///
/// Pure functions, no device needed.

use ash::vk;
use hyperion_engine::hyperion::device::{
    CullMode, DescriptorType, FormatFeatures, ImageTiling, ImageUsage, IndexType, LoadOp,
    PrimitiveTopology, ResourceState, ShaderStage, StoreOp, VertexLayout,
};
use hyperion_engine::hyperion::image::{FilterMode, ImageType, InternalFormat, WrapMode};

pub(crate) fn format_to_vk(format: InternalFormat) -> vk::Format {
    use InternalFormat::*;

    match format {
        None => vk::Format::UNDEFINED,

        R8 => vk::Format::R8_UNORM,
        RG8 => vk::Format::R8G8_UNORM,
        RGB8 => vk::Format::R8G8B8_UNORM,
        RGBA8 => vk::Format::R8G8B8A8_UNORM,

        R16 => vk::Format::R16_UNORM,
        RG16 => vk::Format::R16G16_UNORM,
        RGB16 => vk::Format::R16G16B16_UNORM,
        RGBA16 => vk::Format::R16G16B16A16_UNORM,

        R32 => vk::Format::R32_UINT,
        RG32 => vk::Format::R32G32_UINT,
        RGB32 => vk::Format::R32G32B32_UINT,
        RGBA32 => vk::Format::R32G32B32A32_UINT,

        R16F => vk::Format::R16_SFLOAT,
        RG16F => vk::Format::R16G16_SFLOAT,
        RGB16F => vk::Format::R16G16B16_SFLOAT,
        RGBA16F => vk::Format::R16G16B16A16_SFLOAT,

        R32F => vk::Format::R32_SFLOAT,
        RG32F => vk::Format::R32G32_SFLOAT,
        RGB32F => vk::Format::R32G32B32_SFLOAT,
        RGBA32F => vk::Format::R32G32B32A32_SFLOAT,

        BGRA8_UNORM => vk::Format::B8G8R8A8_UNORM,
        BGRA8_SRGB => vk::Format::B8G8R8A8_SRGB,

        DEPTH_16 => vk::Format::D16_UNORM,
        DEPTH_24 => vk::Format::X8_D24_UNORM_PACK32,
        DEPTH_32 | DEPTH_32F => vk::Format::D32_SFLOAT,
    }
}

pub(crate) fn aspect_mask(format: InternalFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

pub(crate) fn format_features_to_vk(features: FormatFeatures) -> vk::FormatFeatureFlags {
    let mut flags = vk::FormatFeatureFlags::empty();
    if features.contains(FormatFeatures::SAMPLED_IMAGE) {
        flags |= vk::FormatFeatureFlags::SAMPLED_IMAGE;
    }
    if features.contains(FormatFeatures::STORAGE_IMAGE) {
        flags |= vk::FormatFeatureFlags::STORAGE_IMAGE;
    }
    if features.contains(FormatFeatures::COLOR_ATTACHMENT) {
        flags |= vk::FormatFeatureFlags::COLOR_ATTACHMENT;
    }
    if features.contains(FormatFeatures::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if features.contains(FormatFeatures::BLIT_SRC) {
        flags |= vk::FormatFeatureFlags::BLIT_SRC;
    }
    if features.contains(FormatFeatures::BLIT_DST) {
        flags |= vk::FormatFeatureFlags::BLIT_DST;
    }
    if features.contains(FormatFeatures::SAMPLED_IMAGE_FILTER_LINEAR) {
        flags |= vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
    }
    flags
}

pub(crate) fn tiling_to_vk(tiling: ImageTiling) -> vk::ImageTiling {
    match tiling {
        ImageTiling::Optimal => vk::ImageTiling::OPTIMAL,
        ImageTiling::Linear => vk::ImageTiling::LINEAR,
    }
}

pub(crate) fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(ImageUsage::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(ImageUsage::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(ImageUsage::TRANSFER_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    if usage.contains(ImageUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(ImageUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    flags
}

/// Image type, view type and create flags
pub(crate) fn image_type_to_vk(
    image_type: ImageType,
) -> (vk::ImageType, vk::ImageViewType, vk::ImageCreateFlags) {
    match image_type {
        ImageType::Texture2D => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::TYPE_2D,
            vk::ImageCreateFlags::empty(),
        ),
        ImageType::Texture3D => (
            vk::ImageType::TYPE_3D,
            vk::ImageViewType::TYPE_3D,
            vk::ImageCreateFlags::empty(),
        ),
        ImageType::Cubemap => (
            vk::ImageType::TYPE_2D,
            vk::ImageViewType::CUBE,
            vk::ImageCreateFlags::CUBE_COMPATIBLE,
        ),
    }
}

/// Layout, access mask and pipeline stage an image is in for `state`
///
/// Depth formats are needed to pick the read-only layout for sampled depth.
pub(crate) fn resource_state_to_vk(
    state: ResourceState,
    is_depth: bool,
) -> (vk::ImageLayout, vk::AccessFlags, vk::PipelineStageFlags) {
    match state {
        ResourceState::Undefined => (
            vk::ImageLayout::UNDEFINED,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::TOP_OF_PIPE,
        ),
        ResourceState::CopySrc => (
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::TRANSFER,
        ),
        ResourceState::CopyDst => (
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TRANSFER,
        ),
        ResourceState::ShaderResource if is_depth => (
            vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        ResourceState::ShaderResource => (
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        ResourceState::UnorderedAccess => (
            vk::ImageLayout::GENERAL,
            vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
            vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER,
        ),
        ResourceState::RenderTarget => (
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        ),
        ResourceState::DepthStencil => (
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        ),
        ResourceState::Present => (
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        ),
    }
}

/// Mag/min filter and mipmap mode
pub(crate) fn filter_mode_to_vk(filter: FilterMode) -> (vk::Filter, vk::SamplerMipmapMode) {
    match filter {
        FilterMode::Nearest => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
        FilterMode::Linear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::NEAREST),
        FilterMode::LinearMipmap => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR),
    }
}

pub(crate) fn wrap_mode_to_vk(wrap: WrapMode) -> vk::SamplerAddressMode {
    match wrap {
        WrapMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        WrapMode::Repeat => vk::SamplerAddressMode::REPEAT,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
    }
}

pub(crate) fn descriptor_type_to_vk(descriptor_type: DescriptorType) -> vk::DescriptorType {
    match descriptor_type {
        DescriptorType::SampledImage => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorType::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::TriangleFan => vk::PrimitiveTopology::TRIANGLE_FAN,
    }
}

pub(crate) fn cull_mode_to_vk(cull_mode: CullMode) -> vk::CullModeFlags {
    match cull_mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

/// Vertex bindings and attributes of a layout (binding 0 only)
pub(crate) fn vertex_input_to_vk(
    layout: VertexLayout,
) -> (
    Vec<vk::VertexInputBindingDescription>,
    Vec<vk::VertexInputAttributeDescription>,
) {
    let attribute = |location: u32, format: vk::Format, offset: u32| {
        vk::VertexInputAttributeDescription {
            location,
            binding: 0,
            format,
            offset,
        }
    };

    match layout {
        VertexLayout::None => (Vec::new(), Vec::new()),
        VertexLayout::Mesh => (
            vec![vk::VertexInputBindingDescription {
                binding: 0,
                stride: layout.stride(),
                input_rate: vk::VertexInputRate::VERTEX,
            }],
            vec![
                // position, normal, texcoord
                attribute(0, vk::Format::R32G32B32_SFLOAT, 0),
                attribute(1, vk::Format::R32G32B32_SFLOAT, 12),
                attribute(2, vk::Format::R32G32_SFLOAT, 24),
            ],
        ),
        VertexLayout::Particle => (
            vec![vk::VertexInputBindingDescription {
                binding: 0,
                stride: layout.stride(),
                input_rate: vk::VertexInputRate::INSTANCE,
            }],
            vec![attribute(0, vk::Format::R32G32B32A32_SFLOAT, 0)],
        ),
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
