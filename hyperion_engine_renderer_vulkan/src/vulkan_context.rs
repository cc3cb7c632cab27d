/// GpuContext - Shared GPU state for all Vulkan objects
///
/// Every resource handle keeps an `Arc<GpuContext>` so it can free itself on
/// drop without reaching back into the device.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

pub(crate) const LOG_SOURCE: &str = "hyperion::vulkan";

pub(crate) struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// Memory allocator; dropped explicitly before the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Kept for teardown (destroyed by `VulkanGraphicsDevice::drop`)
    pub instance: ash::Instance,

    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    /// Destroy allocator, messenger, device and instance
    ///
    /// # Safety
    ///
    /// The GPU must be idle and no other object may use the context afterwards.
    pub unsafe fn destroy(&mut self) {
        ManuallyDrop::drop(&mut self.allocator);

        if let (Some(debug_utils), Some(messenger)) =
            (&self.debug_utils_loader, self.debug_messenger.take())
        {
            debug_utils.destroy_debug_utils_messenger(messenger, None);
        }

        self.device.destroy_device(None);
        self.instance.destroy_instance(None);
    }
}
