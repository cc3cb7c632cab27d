/// Fixtures shared by the render tests

use crate::asset::MemoryAssetLoader;
use crate::config::{EngineConfig, TextureFormatDefaults};
use crate::graphics_device::mock_graphics_device::{MockCommandList, MockGraphicsDevice};
use crate::graphics_device::{CommandList, ShaderStage, SubpassContents};
use crate::image::InternalFormat;
use crate::object::{Id, Ref};
use crate::render::{
    DescriptorPool, Framebuffer, RenderPass, Resources, Shader, ShaderGlobals, SubShader,
};

/// Smallest byte string the mock accepts as SPIR-V
pub(crate) const FAKE_SPIRV: [u8; 8] = [0x03, 0x02, 0x23, 0x07, 0, 0, 0, 0];

pub(crate) fn formats(device: &MockGraphicsDevice) -> TextureFormatDefaults {
    TextureFormatDefaults::find(device, &EngineConfig::default()).unwrap()
}

/// Vertex + fragment shader with modules already created
pub(crate) fn shader(device: &mut MockGraphicsDevice, resources: &Resources) -> Ref<Shader> {
    let shader = Shader::new(vec![
        SubShader {
            stage: ShaderStage::Vertex,
            code: FAKE_SPIRV.to_vec(),
            name: "test vert".to_string(),
        },
        SubShader {
            stage: ShaderStage::Fragment,
            code: FAKE_SPIRV.to_vec(),
            name: "test frag".to_string(),
        },
    ]);
    resources.add_shader(device, shader).unwrap()
}

/// Loader serving the deferred composite shader at its default paths
pub(crate) fn assets() -> MemoryAssetLoader {
    let config = EngineConfig::default();
    let (vertex, fragment) = config.deferred_shader_paths();
    let mut loader = MemoryAssetLoader::new();
    loader
        .insert(vertex, FAKE_SPIRV.to_vec())
        .insert(fragment, FAKE_SPIRV.to_vec());
    loader
}

/// Recorded commands of a command list created by the mock device
pub(crate) fn commands(cmd: &dyn CommandList) -> &[String] {
    &cmd.as_any()
        .downcast_ref::<MockCommandList>()
        .expect("not a mock command list")
        .commands
}

/// Color + depth render pass and a matching 64x64 framebuffer
pub(crate) fn targets(
    device: &mut MockGraphicsDevice,
    resources: &mut Resources,
) -> (Id<RenderPass>, Id<Framebuffer>) {
    let render_pass = resources
        .add_render_pass(
            device,
            RenderPass::with_formats(
                SubpassContents::SecondaryCommandLists,
                &[InternalFormat::RGBA8, InternalFormat::DEPTH_16],
            ),
        )
        .unwrap();
    let framebuffer = resources.add_framebuffer(device, 64, 64, render_pass).unwrap();
    (render_pass, framebuffer)
}

/// Created pool without descriptors
pub(crate) fn empty_pool(device: &mut MockGraphicsDevice, resources: &Resources) -> DescriptorPool {
    let mut pool = DescriptorPool::new(device.frames_in_flight);
    let globals = ShaderGlobals::new(1, 1);
    pool.create(device, resources, &globals).unwrap();
    pool
}

/// Command names without their arguments
pub(crate) fn names(commands: &[String]) -> Vec<&str> {
    commands
        .iter()
        .map(|command| command.split('(').next().unwrap_or(command))
        .collect()
}
