/// Graphics device module - GPU-facing traits and descriptors

pub mod graphics_device;
pub mod gpu_image;
pub mod buffer;
pub mod render_pass;
pub mod frame_buffer;
pub mod shader;
pub mod pipeline;
pub mod descriptor_set;
pub mod command_list;

pub use graphics_device::*;
pub use gpu_image::*;
pub use buffer::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use shader::*;
pub use pipeline::*;
pub use descriptor_set::*;
pub use command_list::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
