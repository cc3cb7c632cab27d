/*!
# Hyperion Engine - Vulkan Backend

Vulkan implementation of the `hyperion_engine` graphics device traits, built
on `ash` for the API bindings and `gpu-allocator` for memory management.

```no_run
use hyperion_engine::hyperion::device::Config;
use hyperion_engine_renderer_vulkan::VulkanGraphicsDevice;
# fn window() -> winit::window::Window { unimplemented!() }

let device = VulkanGraphicsDevice::new(&window(), Config::default())?;
# Ok::<(), hyperion_engine::hyperion::Error>(())
```
*/

mod vulkan_context;
mod vulkan_format;
mod vulkan_sampler;
mod vulkan_image;
mod vulkan_buffer;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_descriptor_set;
mod vulkan_command_list;
mod vulkan_device;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_device::VulkanGraphicsDevice;
pub use vulkan_image::VulkanImage;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_render_pass::VulkanRenderPass;
pub use vulkan_frame_buffer::VulkanFramebuffer;
pub use vulkan_shader::VulkanShaderModule;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_descriptor_set::VulkanDescriptorSets;
pub use vulkan_command_list::VulkanCommandList;

#[cfg(feature = "vulkan-validation")]
pub use vulkan_debug::{print_validation_stats_report, reset_validation_stats, validation_stats, ValidationStats};
