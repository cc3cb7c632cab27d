/// Render module - GPU object wrappers, buckets, post effects and the
/// deferred path

pub mod render_pass;
pub mod framebuffer;
pub mod shader;
pub mod renderable;
pub mod shader_globals;
pub mod descriptor_pool;
pub mod graphics_pipeline;
pub mod resources;
pub mod render_bucket;
pub mod post_fx;
pub mod deferred;

pub use render_pass::RenderPass;
pub use framebuffer::Framebuffer;
pub use shader::{Shader, SubShader};
pub use renderable::{Mesh, ParticleBatch, Renderable, Vertex};
pub use shader_globals::{
    GlobalBuffer, MaterialShaderData, ObjectShaderData, SceneShaderData, ShaderData,
    ShaderGlobals,
};
pub use descriptor_pool::{
    frame_sets, object_set, scene_set, DescriptorEntry, DescriptorPool, DescriptorSource,
    EFFECT_BINDING, GBUFFER_BINDING, GLOBAL_SET, MATERIALS_BINDING, OBJECTS_BINDING,
    SCENE_BINDING, VOXEL_MAP_BINDING,
};
pub use graphics_pipeline::{Bucket, GraphicsPipeline};
pub use resources::Resources;
pub use render_bucket::{BucketState, RenderBucket, RenderBucketContainer};
pub use post_fx::{PostEffect, PostProcessing};
pub use deferred::{DeferredRenderer, ShadowRenderer};

#[cfg(test)]
pub(crate) mod test_support;
