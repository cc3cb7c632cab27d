/// Shader - SPIR-V stages compiled into device shader modules
///
/// Shaders are shared between pipelines through `RefCounter<Shader>`; the
/// modules are released when the last `Ref<Shader>` goes away.

use crate::asset::AssetLoader;
use crate::error::Result;
use crate::graphics_device::{GpuShaderModule, GraphicsDevice, ShaderModuleDesc, ShaderStage};
use crate::object::{Id, Identified};
use crate::engine_debug;

pub struct SubShader {
    pub stage: ShaderStage,
    pub code: Vec<u8>,
    pub name: String,
}

pub struct Shader {
    id: Id<Shader>,
    sub_shaders: Vec<SubShader>,
    modules: Vec<Box<dyn GpuShaderModule>>,
}

impl Shader {
    pub fn new(sub_shaders: Vec<SubShader>) -> Self {
        Self {
            id: Id::BAD,
            sub_shaders,
            modules: Vec::new(),
        }
    }

    /// Build a shader from SPIR-V files, one per stage
    pub fn load(loader: &dyn AssetLoader, stages: &[(ShaderStage, &str)]) -> Result<Self> {
        let sub_shaders = stages
            .iter()
            .map(|&(stage, path)| {
                Ok(SubShader {
                    stage,
                    code: loader.load_bytes(path)?,
                    name: path.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sub_shaders))
    }

    pub fn sub_shaders(&self) -> &[SubShader] {
        &self.sub_shaders
    }

    pub fn modules(&self) -> Vec<&dyn GpuShaderModule> {
        self.modules.iter().map(|module| module.as_ref()).collect()
    }

    pub fn is_created(&self) -> bool {
        !self.modules.is_empty()
    }

    /// Create one shader module per stage (entry point `main`)
    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let mut modules = Vec::with_capacity(self.sub_shaders.len());
        for sub_shader in &self.sub_shaders {
            modules.push(device.create_shader(&ShaderModuleDesc {
                stage: sub_shader.stage,
                code: &sub_shader.code,
                entry_point: "main",
            })?);
        }

        engine_debug!(
            "hyperion::Shader",
            "Created {} shader module(s): {}",
            modules.len(),
            self.sub_shaders
                .iter()
                .map(|sub_shader| sub_shader.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.modules = modules;
        Ok(())
    }
}

impl Identified for Shader {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}
