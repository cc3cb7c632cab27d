//! Engine configuration
//!
//! Set through explicit setters before `Engine::initialize`; there is no
//! configuration file format.

use crate::error::{Error, Result};
use crate::graphics_device::{Extent3D, FormatFeatures, GraphicsDevice};
use crate::image::InternalFormat;

/// Roles with a device-dependent default texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormatDefault {
    Color,
    Depth,
    GBuffer,
    Storage,
}

impl TextureFormatDefault {
    pub const ALL: [TextureFormatDefault; 4] = [
        TextureFormatDefault::Color,
        TextureFormatDefault::Depth,
        TextureFormatDefault::GBuffer,
        TextureFormatDefault::Storage,
    ];

    /// Format features a candidate must support for this role
    pub fn required_features(self) -> FormatFeatures {
        match self {
            TextureFormatDefault::Color | TextureFormatDefault::GBuffer => {
                FormatFeatures::COLOR_ATTACHMENT
            }
            TextureFormatDefault::Depth => FormatFeatures::DEPTH_STENCIL_ATTACHMENT,
            TextureFormatDefault::Storage => FormatFeatures::STORAGE_IMAGE,
        }
    }
}

/// Resolved default formats, one per `TextureFormatDefault`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFormatDefaults {
    color: InternalFormat,
    depth: InternalFormat,
    gbuffer: InternalFormat,
    storage: InternalFormat,
}

impl TextureFormatDefaults {
    /// Pick the first supported candidate of every role
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` if a role has no supported candidate.
    pub fn find(device: &dyn GraphicsDevice, config: &EngineConfig) -> Result<Self> {
        let mut defaults = Self::default();
        for role in TextureFormatDefault::ALL {
            let candidates = config.format_candidates(role);
            let format = device
                .find_supported_format(candidates, role.required_features())
                .ok_or_else(|| {
                    Error::InitializationFailed(format!(
                        "no supported {:?} format among {:?}",
                        role, candidates
                    ))
                })?;
            defaults.set(role, format);
        }
        Ok(defaults)
    }

    pub fn get(&self, role: TextureFormatDefault) -> InternalFormat {
        match role {
            TextureFormatDefault::Color => self.color,
            TextureFormatDefault::Depth => self.depth,
            TextureFormatDefault::GBuffer => self.gbuffer,
            TextureFormatDefault::Storage => self.storage,
        }
    }

    pub fn set(&mut self, role: TextureFormatDefault, format: InternalFormat) {
        match role {
            TextureFormatDefault::Color => self.color = format,
            TextureFormatDefault::Depth => self.depth = format,
            TextureFormatDefault::GBuffer => self.gbuffer = format,
            TextureFormatDefault::Storage => self.storage = format,
        }
    }
}

/// Core engine configuration
///
/// # Example
///
/// ```
/// use hyperion_engine::hyperion::{EngineConfig, image::InternalFormat};
///
/// let mut config = EngineConfig::default();
/// config
///     .set_shadow_cadence(5)
///     .set_format_candidates(
///         hyperion_engine::hyperion::TextureFormatDefault::Color,
///         vec![InternalFormat::RGBA16F],
///     );
/// assert_eq!(config.shadow_cadence(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    color_candidates: Vec<InternalFormat>,
    depth_candidates: Vec<InternalFormat>,
    gbuffer_candidates: Vec<InternalFormat>,
    storage_candidates: Vec<InternalFormat>,
    voxel_map_extent: Extent3D,
    shadow_cadence: u32,
    shadow_cascades: u32,
    max_materials: usize,
    max_objects: usize,
    deferred_vertex_shader: String,
    deferred_fragment_shader: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            color_candidates: vec![
                InternalFormat::RGBA8,
                InternalFormat::RGBA16,
                InternalFormat::RGBA16F,
                InternalFormat::RGBA32F,
            ],
            depth_candidates: vec![InternalFormat::DEPTH_16, InternalFormat::DEPTH_32F],
            gbuffer_candidates: vec![InternalFormat::RGBA16F, InternalFormat::RGBA32F],
            storage_candidates: vec![InternalFormat::RGBA16F, InternalFormat::RGBA32F],
            voxel_map_extent: Extent3D::new(64, 64, 64),
            shadow_cadence: 10,
            shadow_cascades: 1,
            max_materials: 128,
            max_objects: 1024,
            deferred_vertex_shader: "vkshaders/deferred_vert.spv".to_string(),
            deferred_fragment_shader: "vkshaders/deferred_frag.spv".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn format_candidates(&self, role: TextureFormatDefault) -> &[InternalFormat] {
        match role {
            TextureFormatDefault::Color => &self.color_candidates,
            TextureFormatDefault::Depth => &self.depth_candidates,
            TextureFormatDefault::GBuffer => &self.gbuffer_candidates,
            TextureFormatDefault::Storage => &self.storage_candidates,
        }
    }

    /// Candidate formats for `role`, in order of preference
    pub fn set_format_candidates(
        &mut self,
        role: TextureFormatDefault,
        candidates: Vec<InternalFormat>,
    ) -> &mut Self {
        match role {
            TextureFormatDefault::Color => self.color_candidates = candidates,
            TextureFormatDefault::Depth => self.depth_candidates = candidates,
            TextureFormatDefault::GBuffer => self.gbuffer_candidates = candidates,
            TextureFormatDefault::Storage => self.storage_candidates = candidates,
        }
        self
    }

    pub fn voxel_map_extent(&self) -> Extent3D {
        self.voxel_map_extent
    }

    /// The voxel map takes the resolved `TextureFormatDefault::Storage` format
    pub fn set_voxel_map_extent(&mut self, extent: Extent3D) -> &mut Self {
        self.voxel_map_extent = extent;
        self
    }

    /// Shadows and voxel barrier run once every `shadow_cadence` frames
    pub fn shadow_cadence(&self) -> u32 {
        self.shadow_cadence
    }

    /// # Panics
    ///
    /// Panics if `cadence` is 0.
    pub fn set_shadow_cadence(&mut self, cadence: u32) -> &mut Self {
        assert!(cadence > 0, "shadow cadence must be at least 1");
        self.shadow_cadence = cadence;
        self
    }

    /// Shadow renderer passes per shadow frame
    pub fn shadow_cascades(&self) -> u32 {
        self.shadow_cascades
    }

    pub fn set_shadow_cascades(&mut self, cascades: u32) -> &mut Self {
        self.shadow_cascades = cascades;
        self
    }

    pub fn max_materials(&self) -> usize {
        self.max_materials
    }

    pub fn max_objects(&self) -> usize {
        self.max_objects
    }

    /// Capacity of the material and object shader-global arrays
    pub fn set_shader_global_capacity(&mut self, materials: usize, objects: usize) -> &mut Self {
        self.max_materials = materials;
        self.max_objects = objects;
        self
    }

    pub fn deferred_shader_paths(&self) -> (&str, &str) {
        (&self.deferred_vertex_shader, &self.deferred_fragment_shader)
    }

    /// Asset paths of the deferred composite SPIR-V (vertex, fragment)
    pub fn set_deferred_shader_paths(
        &mut self,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> &mut Self {
        self.deferred_vertex_shader = vertex.into();
        self.deferred_fragment_shader = fragment.into();
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
