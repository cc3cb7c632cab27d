/// Hyperion Engine - explicitly constructed rendering context
///
/// The engine owns the graphics device, the asset loader and every render
/// subsystem (resource tables, render buckets, deferred renderer, shader
/// globals, descriptor pool). Applications build one with `Engine::new`,
/// then drive it through `initialize`, `compile`, the per-frame calls and
/// `destroy`.
///
/// Logging is the one process-wide service: the active logger lives in a
/// static and is swapped through `Engine::set_logger`.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

use crate::asset::AssetLoader;
use crate::callbacks::{EngineCallbacks, EngineEvent, EngineEventArgs};
use crate::config::{EngineConfig, TextureFormatDefault, TextureFormatDefaults};
use crate::error::Result;
use crate::graphics_device::{
    CommandList, DescriptorType, GraphicsDevice, ResourceState, ShaderStage,
};
use crate::image::{Image, InternalFormat};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::object::{Id, Ref};
use crate::render::{
    object_set, scene_set, Bucket, DeferredRenderer, DescriptorPool, DescriptorSource,
    Framebuffer, GlobalBuffer, GraphicsPipeline, MaterialShaderData, ObjectShaderData,
    PostEffect, RenderBucketContainer, RenderPass, Resources, SceneShaderData, Shader,
    ShaderGlobals, ShadowRenderer, MATERIALS_BINDING, OBJECTS_BINDING, SCENE_BINDING,
};
use crate::{engine_debug, engine_info};

const LOG_SOURCE: &str = "hyperion::Engine";

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EngineState {
    /// Built; post effects and configuration may still change
    Created,
    /// Render targets, shader globals and the deferred renderer exist
    Initialized,
    /// Descriptor sets and pipelines exist; frames can be rendered
    Compiled,
    Destroyed,
}

/// Main engine context
///
/// # Example
///
/// ```no_run
/// use hyperion_engine::hyperion::{Engine, EngineConfig};
/// use hyperion_engine::hyperion::asset::FileAssetLoader;
/// use hyperion_engine::hyperion::device::{CommandListLevel, GraphicsDevice};
/// # fn device() -> Box<dyn GraphicsDevice> { unimplemented!() }
///
/// let mut engine = Engine::new(
///     device(),
///     Box::new(FileAssetLoader::new("assets")),
///     EngineConfig::default(),
/// );
/// engine.initialize()?;
/// engine.compile()?;
///
/// let mut primary = engine.device_mut().create_command_list(CommandListLevel::Primary)?;
/// primary.begin(None)?;
/// engine.update_descriptor_data(0)?;
/// engine.render(primary.as_mut(), 0)?;
/// primary.end()?;
///
/// engine.destroy()?;
/// # Ok::<(), hyperion_engine::hyperion::Error>(())
/// ```
pub struct Engine {
    config: EngineConfig,
    state: EngineState,
    format_defaults: TextureFormatDefaults,
    /// Engine lifecycle events
    pub callbacks: EngineCallbacks,
    deferred: DeferredRenderer,
    buckets: RenderBucketContainer,
    shader_globals: ShaderGlobals,
    descriptor_pool: DescriptorPool,
    /// After every holder of a `Ref<Shader>`
    resources: Resources,
    assets: Box<dyn AssetLoader>,
    /// Dropped after every GPU object
    device: Box<dyn GraphicsDevice>,
}

impl Engine {
    pub fn new(
        device: Box<dyn GraphicsDevice>,
        assets: Box<dyn AssetLoader>,
        config: EngineConfig,
    ) -> Self {
        let frames_in_flight = device.frames_in_flight();
        let mut deferred = DeferredRenderer::new(config.shadow_cadence());
        deferred.set_shadow_cascades(config.shadow_cascades());
        Self {
            state: EngineState::Created,
            format_defaults: TextureFormatDefaults::default(),
            callbacks: EngineCallbacks::new(),
            deferred,
            buckets: RenderBucketContainer::new(),
            shader_globals: ShaderGlobals::new(config.max_materials(), config.max_objects()),
            descriptor_pool: DescriptorPool::new(frames_in_flight),
            resources: Resources::new(),
            assets,
            device,
            config,
        }
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    pub fn assets(&self) -> &dyn AssetLoader {
        self.assets.as_ref()
    }

    /// Resolved default format of `role` (`InternalFormat::None` before
    /// `initialize`)
    pub fn texture_format_default(&self, role: TextureFormatDefault) -> InternalFormat {
        self.format_defaults.get(role)
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn buckets(&self) -> &RenderBucketContainer {
        &self.buckets
    }

    pub fn deferred(&self) -> &DeferredRenderer {
        &self.deferred
    }

    pub fn shader_globals(&self) -> &ShaderGlobals {
        &self.shader_globals
    }

    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.descriptor_pool
    }

    fn event_args(&self) -> EngineEventArgs {
        EngineEventArgs {
            frames_in_flight: self.device.frames_in_flight(),
            extent: self.device.swapchain_extent(),
        }
    }

    // ===== LIFECYCLE =====

    /// Resolve texture format defaults, create the bucket render targets,
    /// the shader-global buffers and the deferred renderer
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` if a texture format role has no
    /// supported candidate; device errors otherwise.
    ///
    /// # Panics
    ///
    /// Panics unless the engine is freshly created.
    pub fn initialize(&mut self) -> Result<()> {
        assert_eq!(
            self.state,
            EngineState::Created,
            "engine initialized twice"
        );

        self.format_defaults = TextureFormatDefaults::find(self.device.as_ref(), &self.config)?;
        engine_debug!(LOG_SOURCE, "Texture format defaults: {:?}", self.format_defaults);

        self.buckets.create(
            self.device.as_mut(),
            &mut self.resources,
            &self.format_defaults,
        )?;

        let frames_in_flight = self.device.frames_in_flight();
        self.shader_globals
            .create(self.device.as_mut(), frames_in_flight)?;
        for frame in 0..frames_in_flight {
            self.descriptor_pool.add_descriptor(
                scene_set(frame),
                SCENE_BINDING,
                DescriptorType::UniformBuffer,
                DescriptorSource::Buffer {
                    buffer: GlobalBuffer::Scene,
                    frame,
                },
            );
            self.descriptor_pool.add_descriptor(
                object_set(frame),
                MATERIALS_BINDING,
                DescriptorType::StorageBuffer,
                DescriptorSource::Buffer {
                    buffer: GlobalBuffer::Materials,
                    frame,
                },
            );
            self.descriptor_pool.add_descriptor(
                object_set(frame),
                OBJECTS_BINDING,
                DescriptorType::StorageBuffer,
                DescriptorSource::Buffer {
                    buffer: GlobalBuffer::Objects,
                    frame,
                },
            );
        }

        self.deferred.create(
            self.device.as_mut(),
            self.assets.as_ref(),
            &self.config,
            &self.format_defaults,
            &mut self.resources,
            &self.buckets,
            &mut self.descriptor_pool,
        )?;

        self.state = EngineState::Initialized;
        engine_info!(
            LOG_SOURCE,
            "Engine initialized ({} frame(s) in flight)",
            frames_in_flight
        );
        Ok(())
    }

    /// Upload shader globals for every frame, build the descriptor sets and
    /// every pipeline, then trigger `CreateGraphicsPipelines` (persisted)
    ///
    /// # Panics
    ///
    /// Panics unless the engine is initialized and not yet compiled.
    pub fn compile(&mut self) -> Result<()> {
        assert_eq!(
            self.state,
            EngineState::Initialized,
            "engine compiled before initialize or compiled twice"
        );

        for frame in 0..self.device.frames_in_flight() {
            self.shader_globals.update(frame)?;
        }

        self.descriptor_pool.create(
            self.device.as_mut(),
            &self.resources,
            &self.shader_globals,
        )?;
        self.deferred.create_pipelines(
            self.device.as_mut(),
            &mut self.resources,
            &self.descriptor_pool,
        )?;
        self.buckets.create_pipelines(
            self.device.as_mut(),
            &self.resources,
            &self.descriptor_pool,
        )?;

        self.state = EngineState::Compiled;
        let args = self.event_args();
        self.callbacks
            .trigger_persisted(EngineEvent::CreateGraphicsPipelines, args);
        engine_info!(LOG_SOURCE, "Engine compiled");
        Ok(())
    }

    /// Push host-side scene, material and object data into `frame`'s buffers
    pub fn update_descriptor_data(&mut self, frame: u32) -> Result<()> {
        self.shader_globals.update(frame)
    }

    /// Record the whole deferred frame into `primary`
    ///
    /// # Panics
    ///
    /// Panics unless the engine is compiled.
    pub fn render(&mut self, primary: &mut dyn CommandList, frame: u32) -> Result<()> {
        assert_eq!(
            self.state,
            EngineState::Compiled,
            "engine rendered before compile"
        );
        self.deferred.render(
            &mut self.resources,
            &mut self.buckets,
            &self.descriptor_pool,
            primary,
            frame,
        )
    }

    /// Record one bucket's pass into `primary`
    ///
    /// # Panics
    ///
    /// Panics unless the engine is compiled.
    pub fn render_bucket(
        &mut self,
        bucket: Bucket,
        primary: &mut dyn CommandList,
        frame: u32,
    ) -> Result<()> {
        assert_eq!(
            self.state,
            EngineState::Compiled,
            "engine rendered before compile"
        );
        self.buckets
            .render(bucket, &self.resources, &self.descriptor_pool, primary, frame)
    }

    /// Wait for the device, trigger `DestroyGraphicsPipelines`, then release
    /// every GPU object the engine owns
    ///
    /// Keeps going past failures and returns the first one. Calling it again
    /// is a no-op.
    pub fn destroy(&mut self) -> Result<()> {
        if self.state == EngineState::Destroyed {
            return Ok(());
        }
        let idle = self.device.wait_idle();

        let args = self.event_args();
        self.callbacks
            .trigger(EngineEvent::DestroyGraphicsPipelines, args);

        let results = [
            idle,
            self.deferred.destroy(&mut self.resources),
            self.buckets.destroy(&mut self.resources),
            self.resources.destroy(),
        ];
        self.shader_globals.destroy();
        self.descriptor_pool.destroy();

        self.state = EngineState::Destroyed;
        engine_info!(LOG_SOURCE, "Engine destroyed");
        results.into_iter().collect()
    }

    // ===== RESOURCES =====

    /// Create the shader's modules and share it
    pub fn add_shader(&mut self, shader: Shader) -> Result<Ref<Shader>> {
        self.resources.add_shader(self.device.as_mut(), shader)
    }

    /// Load a shader from SPIR-V assets, one per stage
    pub fn load_shader(
        &mut self,
        stages: &[(ShaderStage, &str)],
    ) -> Result<Ref<Shader>> {
        let shader = Shader::load(self.assets.as_ref(), stages)?;
        self.add_shader(shader)
    }

    /// Create a sampled texture, uploading its host bytes
    pub fn add_texture(&mut self, image: Image) -> Result<Id<Image>> {
        self.resources
            .add_texture(self.device.as_mut(), image, ResourceState::ShaderResource)
    }

    pub fn remove_texture(&mut self, id: Id<Image>) -> Result<()> {
        self.resources.remove_texture(id)
    }

    pub fn add_render_pass(&mut self, render_pass: RenderPass) -> Result<Id<RenderPass>> {
        self.resources
            .add_render_pass(self.device.as_mut(), render_pass)
    }

    /// Framebuffer with one attachment per attachment of `render_pass`
    pub fn add_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        render_pass: Id<RenderPass>,
    ) -> Result<Id<Framebuffer>> {
        self.resources
            .add_framebuffer(self.device.as_mut(), width, height, render_pass)
    }

    /// Store `pipeline` in its bucket; it is created right away once the
    /// engine is compiled, otherwise by `compile`
    ///
    /// # Panics
    ///
    /// Panics before `initialize` (the bucket has no render pass yet).
    pub fn add_graphics_pipeline(
        &mut self,
        pipeline: GraphicsPipeline,
    ) -> Result<Id<GraphicsPipeline>> {
        self.buckets
            .bucket_mut(pipeline.bucket())
            .add_graphics_pipeline(
                self.device.as_mut(),
                &self.resources,
                &self.descriptor_pool,
                pipeline,
            )
    }

    pub fn remove_graphics_pipeline(
        &mut self,
        bucket: Bucket,
        id: Id<GraphicsPipeline>,
    ) -> Result<()> {
        self.buckets.bucket_mut(bucket).remove_graphics_pipeline(id)
    }

    /// Append a filter to the post-processing chain
    ///
    /// # Panics
    ///
    /// Panics once the engine is initialized.
    pub fn add_post_effect(&mut self, effect: PostEffect) {
        assert_eq!(
            self.state,
            EngineState::Created,
            "post effects must be added before initialize"
        );
        self.deferred.post_processing_mut().add_filter(effect);
    }

    pub fn set_shadow_renderer(&mut self, shadow_renderer: Box<dyn ShadowRenderer>) {
        self.deferred.set_shadow_renderer(shadow_renderer);
    }

    // ===== SHADER GLOBALS =====

    pub fn set_scene_data(&mut self, scene: SceneShaderData) {
        self.shader_globals.scene.set(0, scene);
    }

    pub fn set_material(&mut self, index: usize, material: MaterialShaderData) {
        self.shader_globals.materials.set(index, material);
    }

    pub fn set_object(&mut self, index: usize, object: ObjectShaderData) {
        self.shader_globals.objects.set(index, object);
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, network logger, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hyperion_engine::hyperion::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level (typically Error)
    /// * `source` - Source module (e.g., "hyperion::Engine")
    /// * `message` - Log message
    /// * `file` - Source file path
    /// * `line` - Source line number
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
