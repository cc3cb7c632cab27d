/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Owns the instance, logical device, graphics queue and allocator (through
/// `GpuContext`). The window is only used at creation time, to pick a queue
/// able to present and to read the surface extent.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use hyperion_engine::hyperion::device::{
    BufferDesc, CommandList, CommandListLevel, Config, DescriptorSetLayoutDesc, DescriptorWrite,
    Extent2D, FormatFeatures, FramebufferDesc, GpuBuffer, GpuDescriptorSets, GpuFramebuffer,
    GpuImage, GpuImageDesc, GpuPipeline, GpuRenderPass, GpuShaderModule, GraphicsDevice,
    ImageFormatQuery, ImageTiling, PipelineDesc, RenderPassDesc, ShaderModuleDesc,
};
use hyperion_engine::hyperion::image::InternalFormat;
use hyperion_engine::hyperion::{Error, Result};
use hyperion_engine::{engine_bail, engine_err, engine_error, engine_info, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::any::Any;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use winit::window::Window;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::{GpuContext, LOG_SOURCE};
use crate::vulkan_descriptor_set::VulkanDescriptorSets;
use crate::vulkan_format::{format_features_to_vk, format_to_vk, image_type_to_vk, image_usage_to_vk, tiling_to_vk};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_image::VulkanImage;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_sampler::SamplerCache;
use crate::vulkan_shader::VulkanShaderModule;

/// Log and wrap a construction failure
fn init_failed(message: String) -> Error {
    engine_error!(LOG_SOURCE, "{}", message);
    Error::InitializationFailed(message)
}

pub struct VulkanGraphicsDevice {
    /// Keeps the Vulkan loader alive
    _entry: ash::Entry,
    physical_device: vk::PhysicalDevice,
    frames_in_flight: u32,
    extent: Extent2D,
    sampler_cache: SamplerCache,
    ctx: Arc<GpuContext>,
}

impl VulkanGraphicsDevice {
    /// Create the device for `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window the engine will eventually present to
    /// * `config` - Validation, application info and frames in flight
    pub fn new(window: &Window, config: Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_failed(format!("Failed to load Vulkan library: {:?}", e)))?;

            let app_name = std::ffi::CString::new(config.app_name.as_str())
                .map_err(|_| init_failed(format!("Invalid application name: {:?}", config.app_name)))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Hyperion")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window.display_handle()
                .map_err(|e| init_failed(format!("Failed to get display handle: {}", e)))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed(format!("Failed to get required extensions: {:?}", e)))?
                .to_vec();

            let validation = config.enable_validation && cfg!(feature = "vulkan-validation");
            if config.enable_validation && !validation {
                engine_warn!(LOG_SOURCE, "Validation requested but the `vulkan-validation` feature is disabled");
            }

            let mut layer_names = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None)
                .map_err(|e| init_failed(format!("Failed to create Vulkan instance: {:?}", e)))?;

            let (debug_utils_loader, debug_messenger) = Self::create_debug_messenger(&entry, &instance, validation)?;

            // Temporary surface for queue selection and extent
            let window_handle = window.window_handle()
                .map_err(|e| init_failed(format!("Failed to get window handle: {}", e)))?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_failed(format!("Failed to create surface: {:?}", e)))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let physical_devices = instance.enumerate_physical_devices()
                .map_err(|e| init_failed(format!("Failed to enumerate physical devices: {:?}", e)))?;

            // First device exposing a graphics queue that can present
            let selected = physical_devices.iter().find_map(|&physical_device| {
                instance
                    .get_physical_device_queue_family_properties(physical_device)
                    .iter()
                    .enumerate()
                    .find(|(index, family)| {
                        family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                            && surface_loader
                                .get_physical_device_surface_support(physical_device, *index as u32, surface)
                                .unwrap_or(false)
                    })
                    .map(|(index, _)| (physical_device, index as u32))
            });
            let Some((physical_device, graphics_family)) = selected else {
                surface_loader.destroy_surface(surface, None);
                return Err(init_failed("No Vulkan GPU with a presentable graphics queue found".to_string()));
            };

            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| init_failed(format!("Failed to query surface capabilities: {:?}", e)))?;
            let extent = if capabilities.current_extent.width != u32::MAX {
                Extent2D::new(capabilities.current_extent.width, capabilities.current_extent.height)
            } else {
                let size = window.inner_size();
                Extent2D::new(size.width, size.height)
            };
            surface_loader.destroy_surface(surface, None);

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            // Geometry shaders are optional (particle pipelines need them)
            let supported = instance.get_physical_device_features(physical_device);
            let device_features = vk::PhysicalDeviceFeatures::default()
                .geometry_shader(supported.geometry_shader == vk::TRUE);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance.create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_failed(format!("Failed to create logical device: {:?}", e)))?;
            let graphics_queue = device.get_device_queue(graphics_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_failed(format!("Failed to create GPU allocator: {:?}", e)))?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = std::ffi::CStr::from_ptr(properties.device_name.as_ptr()).to_string_lossy();
            engine_info!(LOG_SOURCE, "Vulkan device: {} ({}x{} surface)", device_name, extent.width, extent.height);

            let ctx = Arc::new(GpuContext {
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_queue_family: graphics_family,
                instance,
                debug_utils_loader,
                debug_messenger,
            });

            Ok(Self {
                _entry: entry,
                physical_device,
                frames_in_flight: config.frames_in_flight.max(1),
                extent,
                sampler_cache: SamplerCache::new(Arc::clone(&ctx)),
                ctx,
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        validation: bool,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        if !validation {
            return Ok((None, None));
        }
        crate::vulkan_debug::reset_validation_stats();
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        let messenger = debug_utils
            .create_debug_utils_messenger(&crate::vulkan_debug::messenger_create_info(), None)
            .map_err(|e| init_failed(format!("Failed to create debug messenger: {:?}", e)))?;
        Ok((Some(debug_utils), Some(messenger)))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    unsafe fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
        _validation: bool,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        Ok((None, None))
    }

    /// Submit `list` signaling its fence
    fn submit_one(&self, list: &VulkanCommandList) -> Result<()> {
        let command_buffers = [list.command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        unsafe {
            self.ctx.device.reset_fences(&[list.fence])
                .map_err(|e| engine_err!(LOG_SOURCE, "submit: failed to reset fence: {:?}", e))?;
            self.ctx.device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], list.fence)
                .map_err(|e| engine_err!(LOG_SOURCE, "submit: failed to submit queue: {:?}", e))
        }
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    fn swapchain_extent(&self) -> Extent2D {
        self.extent
    }

    fn supports_image_format(&self, query: &ImageFormatQuery) -> bool {
        if query.format == InternalFormat::None {
            return false;
        }
        let (image_type, _, flags) = image_type_to_vk(query.image_type);

        unsafe {
            self.ctx.instance
                .get_physical_device_image_format_properties(
                    self.physical_device,
                    format_to_vk(query.format),
                    image_type,
                    tiling_to_vk(query.tiling),
                    image_usage_to_vk(query.usage),
                    flags,
                )
                .is_ok()
        }
    }

    fn supports_format_features(
        &self,
        format: InternalFormat,
        tiling: ImageTiling,
        features: FormatFeatures,
    ) -> bool {
        if format == InternalFormat::None {
            return false;
        }
        let properties = unsafe {
            self.ctx.instance
                .get_physical_device_format_properties(self.physical_device, format_to_vk(format))
        };
        let available = match tiling {
            ImageTiling::Optimal => properties.optimal_tiling_features,
            ImageTiling::Linear => properties.linear_tiling_features,
        };
        available.contains(format_features_to_vk(features))
    }

    fn create_image(&mut self, desc: &GpuImageDesc) -> Result<Box<dyn GpuImage>> {
        if desc.extent.width == 0 || desc.extent.height == 0 {
            engine_bail!(LOG_SOURCE, "Cannot create a {}x{} image", desc.extent.width, desc.extent.height);
        }
        let sampler = self.sampler_cache.get(desc.filter_mode, desc.wrap_mode)?;
        Ok(Box::new(VulkanImage::new(Arc::clone(&self.ctx), desc, sampler)?))
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Box<dyn GpuBuffer>> {
        Ok(Box::new(VulkanBuffer::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Box<dyn GpuRenderPass>> {
        Ok(Box::new(VulkanRenderPass::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_framebuffer(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        desc: &FramebufferDesc,
    ) -> Result<Box<dyn GpuFramebuffer>> {
        Ok(Box::new(VulkanFramebuffer::new(Arc::clone(&self.ctx), render_pass, desc)?))
    }

    fn create_shader(&mut self, desc: &ShaderModuleDesc) -> Result<Box<dyn GpuShaderModule>> {
        Ok(Box::new(VulkanShaderModule::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_descriptor_sets(
        &mut self,
        layouts: &[DescriptorSetLayoutDesc],
        writes: &[DescriptorWrite],
    ) -> Result<Box<dyn GpuDescriptorSets>> {
        Ok(Box::new(VulkanDescriptorSets::new(Arc::clone(&self.ctx), layouts, writes)?))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Box<dyn GpuPipeline>> {
        Ok(Box::new(VulkanPipeline::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_command_list(&mut self, level: CommandListLevel) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(VulkanCommandList::new(Arc::clone(&self.ctx), level)?))
    }

    fn execute_one_time(
        &mut self,
        record: &mut dyn FnMut(&mut dyn CommandList) -> Result<()>,
    ) -> Result<()> {
        let mut list = VulkanCommandList::new(Arc::clone(&self.ctx), CommandListLevel::Primary)?;
        list.begin(None)?;
        record(&mut list)?;
        list.end()?;

        self.submit_one(&list)?;
        list.wait()
    }

    fn submit(&mut self, command_lists: &[&dyn CommandList]) -> Result<()> {
        for command_list in command_lists {
            let list = command_list
                .as_any()
                .downcast_ref::<VulkanCommandList>()
                .ok_or_else(|| engine_err!(LOG_SOURCE, "submit: command list does not belong to the Vulkan backend"))?;
            if list.level() != CommandListLevel::Primary {
                engine_bail!(LOG_SOURCE, "submit: secondary command lists are executed, not submitted");
            }
            self.submit_one(list)?;
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to wait idle: {:?}", e))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }

        // Releases the cache's context reference
        self.sampler_cache.shutdown();

        match Arc::get_mut(&mut self.ctx) {
            Some(ctx) => unsafe { ctx.destroy() },
            None => engine_warn!(
                LOG_SOURCE,
                "{} GPU object(s) outlive the device; Vulkan device not destroyed",
                Arc::strong_count(&self.ctx) - 1
            ),
        }
    }
}
