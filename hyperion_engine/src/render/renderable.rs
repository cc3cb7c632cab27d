/// Renderable - closed set of drawable kinds
///
/// Each variant owns its GPU buffers and knows how to record its own draw.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

use crate::error::Result;
use crate::graphics_device::{
    BufferDesc, BufferUsage, CommandList, GpuBuffer, GraphicsDevice, IndexType, MemoryLocation,
};

/// Interleaved mesh vertex (`VertexLayout::Mesh`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, texcoord: Vec2) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// Indexed triangle mesh
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_buffer: Option<Box<dyn GpuBuffer>>,
    index_buffer: Option<Box<dyn GpuBuffer>>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.vertex_buffer = Some(upload(
            device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&self.vertices),
        )?);
        self.index_buffer = Some(upload(
            device,
            BufferUsage::Index,
            bytemuck::cast_slice(&self.indices),
        )?);
        Ok(())
    }

    fn render(&self, cmd: &mut dyn CommandList) -> Result<()> {
        let (Some(vertices), Some(indices)) = (&self.vertex_buffer, &self.index_buffer) else {
            panic!("mesh rendered before create");
        };
        cmd.bind_vertex_buffer(vertices.as_ref(), 0)?;
        cmd.bind_index_buffer(indices.as_ref(), 0, IndexType::U32)?;
        cmd.draw_indexed(self.index_count(), 1, 0, 0)
    }
}

/// Camera-facing particle quads, one instance per particle
pub struct ParticleBatch {
    /// xyz position, w size
    particles: Vec<Vec4>,
    instance_buffer: Option<Box<dyn GpuBuffer>>,
}

impl ParticleBatch {
    pub fn new(particles: Vec<Vec4>) -> Self {
        Self {
            particles,
            instance_buffer: None,
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.instance_buffer = Some(upload(
            device,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&self.particles),
        )?);
        Ok(())
    }

    fn render(&self, cmd: &mut dyn CommandList) -> Result<()> {
        let Some(instances) = &self.instance_buffer else {
            panic!("particle batch rendered before create");
        };
        cmd.bind_vertex_buffer(instances.as_ref(), 0)?;
        cmd.draw(4, self.particle_count(), 0)
    }
}

pub enum Renderable {
    Mesh(Mesh),
    Particles(ParticleBatch),
    /// Screen-covering quad generated in the vertex shader (triangle fan)
    FullScreenQuad,
}

impl Renderable {
    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        match self {
            Renderable::Mesh(mesh) => mesh.create(device),
            Renderable::Particles(batch) => batch.create(device),
            Renderable::FullScreenQuad => Ok(()),
        }
    }

    /// Record the draw; the pipeline and descriptor sets are already bound
    pub fn render(&self, cmd: &mut dyn CommandList) -> Result<()> {
        match self {
            Renderable::Mesh(mesh) => mesh.render(cmd),
            Renderable::Particles(batch) => batch.render(cmd),
            Renderable::FullScreenQuad => cmd.draw(4, 1, 0),
        }
    }

    pub fn destroy(&mut self) {
        match self {
            Renderable::Mesh(mesh) => {
                mesh.vertex_buffer = None;
                mesh.index_buffer = None;
            }
            Renderable::Particles(batch) => batch.instance_buffer = None,
            Renderable::FullScreenQuad => {}
        }
    }
}

fn upload(
    device: &mut dyn GraphicsDevice,
    usage: BufferUsage,
    bytes: &[u8],
) -> Result<Box<dyn GpuBuffer>> {
    let buffer = device.create_buffer(&BufferDesc {
        size: bytes.len() as u64,
        usage,
        location: MemoryLocation::CpuToGpu,
    })?;
    buffer.update(0, bytes)?;
    Ok(buffer)
}
