/// DescriptorPool - descriptor set layouts and the resources bound to them
///
/// Set order is `[Global, Scene0, Object0, Scene1, Object1, ...]`: one
/// global set shared by every frame, then a scene and an object set per
/// frame in flight. Pipelines bind `[Global, Scene(f), Object(f)]` as their
/// sets 0, 1 and 2.
///
/// Descriptors are registered before `create`; they name their resource
/// through a `DescriptorSource` that is only resolved when the GPU sets are
/// built.

use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, DescriptorBindingDesc, DescriptorResource, DescriptorSetLayoutDesc,
    DescriptorType, DescriptorWrite, GpuDescriptorSets, GpuImage, GpuPipeline, GraphicsDevice,
};
use crate::image::Image;
use crate::object::Id;
use crate::render::{Framebuffer, GlobalBuffer, Resources, ShaderGlobals};
use crate::engine_debug;

const LOG_SOURCE: &str = "hyperion::DescriptorPool";

/// Set shared by every frame
pub const GLOBAL_SET: u32 = 0;

// ===== GLOBAL SET BINDINGS =====

/// First g-buffer attachment of the opaque bucket (four consecutive bindings)
pub const GBUFFER_BINDING: u32 = 0;
/// First binding of the composite effect and post filters
pub const EFFECT_BINDING: u32 = 4;
/// Voxel map storage image
pub const VOXEL_MAP_BINDING: u32 = 17;

// ===== PER-FRAME SET BINDINGS =====

/// Scene uniform buffer in the scene set
pub const SCENE_BINDING: u32 = 0;
/// Material storage buffer in the object set
pub const MATERIALS_BINDING: u32 = 0;
/// Object storage buffer in the object set
pub const OBJECTS_BINDING: u32 = 1;

/// Scene set of `frame`
pub fn scene_set(frame: u32) -> u32 {
    1 + 2 * frame
}

/// Object set of `frame`
pub fn object_set(frame: u32) -> u32 {
    2 + 2 * frame
}

/// Sets bound as pipeline sets 0, 1 and 2 while rendering `frame`
pub fn frame_sets(frame: u32) -> [u32; 3] {
    [GLOBAL_SET, scene_set(frame), object_set(frame)]
}

/// Where a descriptor's resource comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorSource {
    /// Attachment `index` of a framebuffer
    Attachment {
        framebuffer: Id<Framebuffer>,
        index: usize,
    },
    /// Texture living in the engine's texture table
    Texture(Id<Image>),
    /// One frame's copy of a shader-global buffer
    Buffer { buffer: GlobalBuffer, frame: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorEntry {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub source: DescriptorSource,
}

pub struct DescriptorPool {
    sets: Vec<Vec<DescriptorEntry>>,
    gpu_sets: Option<Box<dyn GpuDescriptorSets>>,
}

impl DescriptorPool {
    /// Empty layouts for the global set plus two sets per frame
    pub fn new(frames_in_flight: u32) -> Self {
        Self {
            sets: vec![Vec::new(); 1 + 2 * frames_in_flight as usize],
            gpu_sets: None,
        }
    }

    pub fn set_count(&self) -> u32 {
        self.sets.len() as u32
    }

    pub fn frames_in_flight(&self) -> u32 {
        (self.set_count() - 1) / 2
    }

    /// Descriptors registered in `set`, in registration order
    pub fn bindings(&self, set: u32) -> &[DescriptorEntry] {
        self.sets.get(set as usize).map_or(&[], |entries| entries.as_slice())
    }

    pub fn gpu_descriptor_sets(&self) -> Option<&dyn GpuDescriptorSets> {
        self.gpu_sets.as_deref()
    }

    pub fn is_created(&self) -> bool {
        self.gpu_sets.is_some()
    }

    /// Register a descriptor at `binding` of `set`
    ///
    /// # Panics
    ///
    /// Panics if the pool is already created, if `set` does not exist or if
    /// `binding` is already taken in `set`.
    pub fn add_descriptor(
        &mut self,
        set: u32,
        binding: u32,
        descriptor_type: DescriptorType,
        source: DescriptorSource,
    ) {
        assert!(
            self.gpu_sets.is_none(),
            "descriptor added to set {} after the pool was created",
            set
        );
        let set_count = self.set_count();
        let Some(entries) = self.sets.get_mut(set as usize) else {
            panic!("descriptor set {} out of range ({} sets)", set, set_count);
        };
        assert!(
            entries.iter().all(|entry| entry.binding != binding),
            "binding {} of descriptor set {} is already in use",
            binding,
            set
        );

        entries.push(DescriptorEntry {
            binding,
            descriptor_type,
            source,
        });
    }

    /// Resolve every source and allocate the GPU descriptor sets
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if a source is missing or not yet created,
    /// or does not fit its descriptor type.
    pub fn create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        resources: &Resources,
        globals: &ShaderGlobals,
    ) -> Result<()> {
        let layouts: Vec<DescriptorSetLayoutDesc> = self
            .sets
            .iter()
            .map(|entries| DescriptorSetLayoutDesc {
                bindings: entries
                    .iter()
                    .map(|entry| DescriptorBindingDesc {
                        binding: entry.binding,
                        descriptor_type: entry.descriptor_type,
                    })
                    .collect(),
            })
            .collect();

        let mut writes = Vec::new();
        for (set, entries) in self.sets.iter().enumerate() {
            for entry in entries {
                writes.push(DescriptorWrite {
                    set: set as u32,
                    binding: entry.binding,
                    resource: resolve(entry, resources, globals)?,
                });
            }
        }

        self.gpu_sets = Some(device.create_descriptor_sets(&layouts, &writes)?);
        engine_debug!(
            LOG_SOURCE,
            "Created {} descriptor set(s) with {} binding(s)",
            layouts.len(),
            writes.len()
        );
        Ok(())
    }

    /// Bind the global, scene and object sets of `frame`
    ///
    /// # Panics
    ///
    /// Panics if the pool is not created or `frame` is out of range.
    pub fn bind(
        &self,
        cmd: &mut dyn CommandList,
        pipeline: &dyn GpuPipeline,
        frame: u32,
    ) -> Result<()> {
        let Some(gpu_sets) = self.gpu_sets.as_deref() else {
            panic!("descriptor pool bound before create");
        };
        assert!(
            frame < self.frames_in_flight(),
            "frame {} out of range ({} frames in flight)",
            frame,
            self.frames_in_flight()
        );
        cmd.bind_descriptor_sets(pipeline, gpu_sets, &frame_sets(frame))
    }

    /// Release the GPU sets; registered descriptors stay
    pub fn destroy(&mut self) {
        self.gpu_sets = None;
    }
}

fn resolve<'a>(
    entry: &DescriptorEntry,
    resources: &'a Resources,
    globals: &'a ShaderGlobals,
) -> Result<DescriptorResource<'a>> {
    match entry.descriptor_type {
        DescriptorType::SampledImage => {
            Ok(DescriptorResource::SampledImage(resolve_image(entry, resources)?))
        }
        DescriptorType::StorageImage => {
            Ok(DescriptorResource::StorageImage(resolve_image(entry, resources)?))
        }
        DescriptorType::UniformBuffer => {
            let (buffer, frame) = buffer_source(entry)?;
            globals
                .buffer(buffer, frame)
                .map(DescriptorResource::UniformBuffer)
                .ok_or_else(|| missing(entry))
        }
        DescriptorType::StorageBuffer => {
            let (buffer, frame) = buffer_source(entry)?;
            globals
                .buffer(buffer, frame)
                .map(DescriptorResource::StorageBuffer)
                .ok_or_else(|| missing(entry))
        }
    }
}

fn resolve_image<'a>(entry: &DescriptorEntry, resources: &'a Resources) -> Result<&'a dyn GpuImage> {
    let image = match entry.source {
        DescriptorSource::Attachment { framebuffer, index } => resources
            .framebuffers
            .get(framebuffer)
            .and_then(|framebuffer| framebuffer.attachments().get(index)),
        DescriptorSource::Texture(id) => resources.textures.get(id),
        DescriptorSource::Buffer { .. } => return Err(mismatch(entry)),
    };
    image
        .and_then(|image| image.gpu_image())
        .ok_or_else(|| missing(entry))
}

fn buffer_source(entry: &DescriptorEntry) -> Result<(GlobalBuffer, u32)> {
    match entry.source {
        DescriptorSource::Buffer { buffer, frame } => Ok((buffer, frame)),
        _ => Err(mismatch(entry)),
    }
}

fn missing(entry: &DescriptorEntry) -> Error {
    Error::InvalidResource(format!(
        "binding {}: {:?} is missing or not created",
        entry.binding, entry.source
    ))
}

fn mismatch(entry: &DescriptorEntry) -> Error {
    Error::InvalidResource(format!(
        "binding {}: {:?} cannot back a {:?} descriptor",
        entry.binding, entry.source, entry.descriptor_type
    ))
}

#[cfg(test)]
#[path = "descriptor_pool_tests.rs"]
mod tests;
