/// Per-frame shader globals
///
/// Host-side arrays of scene, material and object data, each mirrored in one
/// GPU buffer per frame in flight. Host writes reach frame N's buffer only
/// when `update_buffer(N)` runs.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::error::Result;
use crate::graphics_device::{BufferDesc, BufferUsage, GpuBuffer, GraphicsDevice, MemoryLocation};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneShaderData {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec4,
    pub light_direction: Vec4,
}

impl Default for SceneShaderData {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec4::ZERO,
            light_direction: Vec4::new(0.0, -1.0, 0.0, 0.0),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialShaderData {
    pub albedo: Vec4,
    pub metalness: f32,
    pub roughness: f32,
    pub _padding: [f32; 2],
}

impl Default for MaterialShaderData {
    fn default() -> Self {
        Self {
            albedo: Vec4::ONE,
            metalness: 0.0,
            roughness: 0.5,
            _padding: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectShaderData {
    pub model_matrix: Mat4,
}

impl Default for ObjectShaderData {
    fn default() -> Self {
        Self {
            model_matrix: Mat4::IDENTITY,
        }
    }
}

/// Fixed-size host array with one GPU buffer per frame
pub struct ShaderData<T: Pod> {
    data: Vec<T>,
    usage: BufferUsage,
    buffers: Vec<Box<dyn GpuBuffer>>,
}

impl<T: Pod + Default> ShaderData<T> {
    pub fn new(count: usize, usage: BufferUsage) -> Self {
        Self {
            data: vec![T::default(); count],
            usage,
            buffers: Vec::new(),
        }
    }
}

impl<T: Pod> ShaderData<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Size of one frame's buffer in bytes
    pub fn byte_size(&self) -> u64 {
        std::mem::size_of_val(self.data.as_slice()) as u64
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: usize, value: T) {
        assert!(
            index < self.data.len(),
            "shader data index {} out of range ({} entries)",
            index,
            self.data.len()
        );
        self.data[index] = value;
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Allocate one GPU buffer per frame
    pub fn create(&mut self, device: &mut dyn GraphicsDevice, frames: u32) -> Result<()> {
        let mut buffers = Vec::with_capacity(frames as usize);
        for _ in 0..frames {
            buffers.push(device.create_buffer(&BufferDesc {
                size: self.byte_size(),
                usage: self.usage,
                location: MemoryLocation::CpuToGpu,
            })?);
        }
        self.buffers = buffers;
        Ok(())
    }

    /// Copy the host array into `frame`'s buffer
    ///
    /// # Panics
    ///
    /// Panics if `frame` has no buffer.
    pub fn update_buffer(&self, frame: u32) -> Result<()> {
        let Some(buffer) = self.buffers.get(frame as usize) else {
            panic!(
                "no shader data buffer for frame {} ({} created)",
                frame,
                self.buffers.len()
            );
        };
        buffer.update(0, bytemuck::cast_slice(&self.data))
    }

    pub fn buffer(&self, frame: u32) -> Option<&dyn GpuBuffer> {
        self.buffers.get(frame as usize).map(|buffer| buffer.as_ref())
    }

    pub fn destroy(&mut self) {
        self.buffers.clear();
    }
}

/// Which shader-global array a descriptor refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalBuffer {
    Scene,
    Materials,
    Objects,
}

pub struct ShaderGlobals {
    pub scene: ShaderData<SceneShaderData>,
    pub materials: ShaderData<MaterialShaderData>,
    pub objects: ShaderData<ObjectShaderData>,
}

impl ShaderGlobals {
    pub fn new(max_materials: usize, max_objects: usize) -> Self {
        Self {
            scene: ShaderData::new(1, BufferUsage::Uniform),
            materials: ShaderData::new(max_materials, BufferUsage::Storage),
            objects: ShaderData::new(max_objects, BufferUsage::Storage),
        }
    }

    pub fn create(&mut self, device: &mut dyn GraphicsDevice, frames: u32) -> Result<()> {
        self.scene.create(device, frames)?;
        self.materials.create(device, frames)?;
        self.objects.create(device, frames)
    }

    /// Push all three arrays to `frame`'s buffers
    pub fn update(&self, frame: u32) -> Result<()> {
        self.scene.update_buffer(frame)?;
        self.objects.update_buffer(frame)?;
        self.materials.update_buffer(frame)
    }

    pub fn buffer(&self, which: GlobalBuffer, frame: u32) -> Option<&dyn GpuBuffer> {
        match which {
            GlobalBuffer::Scene => self.scene.buffer(frame),
            GlobalBuffer::Materials => self.materials.buffer(frame),
            GlobalBuffer::Objects => self.objects.buffer(frame),
        }
    }

    pub fn destroy(&mut self) {
        self.scene.destroy();
        self.objects.destroy();
        self.materials.destroy();
    }
}

#[cfg(test)]
#[path = "shader_globals_tests.rs"]
mod tests;
