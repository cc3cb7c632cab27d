use std::sync::{Arc, Mutex};

use super::*;
use crate::asset::MemoryAssetLoader;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{MockCommandList, MockGraphicsDevice};
use crate::graphics_device::{CommandListLevel, Extent3D};
use crate::render::test_support::{self, names};
use crate::render::{GraphicsPipeline, Mesh, Renderable, ShaderGlobals, Vertex};

/// (frame, cascade) of every shadow pass requested
#[derive(Clone, Default)]
struct RecordedShadows(Arc<Mutex<Vec<(u32, u32)>>>);

impl RecordedShadows {
    fn passes(&self) -> Vec<(u32, u32)> {
        self.0.lock().unwrap().clone()
    }
}

impl ShadowRenderer for RecordedShadows {
    fn render_shadows(
        &mut self,
        _primary: &mut dyn CommandList,
        frame: u32,
        cascade: u32,
    ) -> Result<()> {
        self.0.lock().unwrap().push((frame, cascade));
        Ok(())
    }
}

struct Fixture {
    device: MockGraphicsDevice,
    pool: DescriptorPool,
    deferred: DeferredRenderer,
    buckets: RenderBucketContainer,
    resources: Resources,
}

/// Fully created deferred path with `filters` post filters and the given
/// bucket pipelines
fn fixture(filters: usize, pipelines: Vec<(Bucket, Renderable)>) -> Fixture {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let config = EngineConfig::default();
    let formats = test_support::formats(&device);
    let mut buckets = RenderBucketContainer::new();
    buckets.create(&mut device, &mut resources, &formats).unwrap();

    let mut pool = DescriptorPool::new(device.frames_in_flight);
    for (bucket, renderable) in pipelines {
        let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), bucket);
        pipeline.add_renderable(renderable);
        buckets
            .bucket_mut(bucket)
            .add_graphics_pipeline(&mut device, &resources, &pool, pipeline)
            .unwrap();
    }

    let mut deferred = DeferredRenderer::new(config.shadow_cadence());
    for _ in 0..filters {
        deferred
            .post_processing_mut()
            .add_filter(PostEffect::new(test_support::shader(&mut device, &resources)));
    }
    deferred
        .create(
            &mut device,
            &test_support::assets(),
            &config,
            &formats,
            &mut resources,
            &buckets,
            &mut pool,
        )
        .unwrap();

    pool.create(&mut device, &resources, &ShaderGlobals::new(1, 1))
        .unwrap();
    buckets
        .create_pipelines(&mut device, &resources, &pool)
        .unwrap();
    deferred
        .create_pipelines(&mut device, &mut resources, &pool)
        .unwrap();

    Fixture {
        device,
        pool,
        deferred,
        buckets,
        resources,
    }
}

fn triangle() -> Renderable {
    let vertex = Vertex::new(glam::Vec3::ZERO, glam::Vec3::Z, glam::Vec2::ZERO);
    Renderable::Mesh(Mesh::new(vec![vertex; 3], vec![0, 1, 2]))
}

fn render_frame(f: &mut Fixture, primary: &mut dyn CommandList, frame: u32) {
    primary.begin(None).unwrap();
    f.deferred
        .render(&mut f.resources, &mut f.buckets, &f.pool, primary, frame)
        .unwrap();
    primary.end().unwrap();
}

// ============================================================================
// Creation
// ============================================================================

#[test]
#[should_panic(expected = "shadow cadence must be at least 1")]
fn test_zero_cadence_panics() {
    DeferredRenderer::new(0);
}

#[test]
fn test_create_registers_global_descriptors() {
    let f = fixture(1, Vec::new());

    let bindings: Vec<u32> = f
        .pool
        .bindings(GLOBAL_SET)
        .iter()
        .map(|entry| entry.binding)
        .collect();
    // voxel map, g-buffer, composite effect, then the filter
    assert_eq!(bindings, vec![17, 0, 1, 2, 3, 4, 5, 6, 7, 8]);

    let opaque = f.buckets.bucket(Bucket::Opaque).framebuffer();
    let translucent = f.buckets.bucket(Bucket::Translucent).framebuffer();
    let sources: Vec<DescriptorSource> = f
        .pool
        .bindings(GLOBAL_SET)
        .iter()
        .map(|entry| entry.source)
        .collect();
    assert_eq!(sources[0], DescriptorSource::Texture(f.deferred.voxel_map()));
    assert_eq!(
        sources[2],
        DescriptorSource::Attachment {
            framebuffer: opaque,
            index: 1,
        }
    );
    assert_eq!(
        sources[5],
        DescriptorSource::Attachment {
            framebuffer: translucent,
            index: 0,
        }
    );
}

#[test]
fn test_composite_draws_into_the_translucent_targets() {
    let f = fixture(0, Vec::new());

    let effect = f.deferred.effect().unwrap();
    let translucent = f.buckets.bucket(Bucket::Translucent);
    assert_eq!(effect.render_pass(), translucent.render_pass());
    assert_eq!(effect.framebuffer(), translucent.framebuffer());

    let voxel_map = f.resources.textures.get(f.deferred.voxel_map()).unwrap();
    assert_eq!(voxel_map.state(), ResourceState::UnorderedAccess);
    assert_eq!(voxel_map.image_type(), ImageType::Texture3D);
    assert_eq!(voxel_map.extent(), Extent3D::new(64, 64, 64));
    let storage = test_support::formats(&f.device).get(TextureFormatDefault::Storage);
    assert_eq!(voxel_map.format(), storage);
}

#[test]
fn test_missing_composite_shader_fails() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let formats = test_support::formats(&device);
    let mut buckets = RenderBucketContainer::new();
    buckets.create(&mut device, &mut resources, &formats).unwrap();
    let mut pool = DescriptorPool::new(2);
    let mut deferred = DeferredRenderer::new(10);

    let result = deferred.create(
        &mut device,
        &MemoryAssetLoader::new(),
        &EngineConfig::default(),
        &formats,
        &mut resources,
        &buckets,
        &mut pool,
    );

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(deferred.effect().is_none());
}

// ============================================================================
// Frame sequence
// ============================================================================

#[test]
fn test_frame_runs_passes_in_order() {
    let mut f = fixture(
        1,
        vec![
            (Bucket::Opaque, Renderable::FullScreenQuad),
            (Bucket::Skybox, triangle()),
            (Bucket::Translucent, Renderable::FullScreenQuad),
        ],
    );
    let mut primary = f.device.command_list(CommandListLevel::Primary);

    render_frame(&mut f, &mut primary, 0);

    let top_level: Vec<&str> = names(&primary.commands)
        .into_iter()
        .filter(|command| !command.starts_with("secondary:"))
        .collect();
    assert_eq!(
        top_level,
        vec![
            // g-buffer: skybox, opaque
            "begin",
            "begin_render_pass",
            "execute_secondary",
            "execute_secondary",
            "end_render_pass",
            "barrier",
            // post filter
            "begin_render_pass",
            "execute_secondary",
            "end_render_pass",
            // composite, translucent
            "begin_render_pass",
            "execute_secondary",
            "execute_secondary",
            "end_render_pass",
            "end",
        ]
    );

    // Skybox draws before opaque, both inheriting the g-buffer targets
    let all = names(&primary.commands);
    let skybox_draw = all.iter().position(|&c| c == "secondary:draw_indexed").unwrap();
    let opaque_draw = all.iter().position(|&c| c == "secondary:draw").unwrap();
    assert!(skybox_draw < opaque_draw);
    let inherited: Vec<&String> = primary
        .commands
        .iter()
        .filter(|command| command.starts_with("secondary:begin("))
        .collect();
    assert_eq!(inherited.len(), 5);
    assert_eq!(inherited[0], inherited[1]);
    assert_eq!(inherited[3], inherited[4]);
    assert_ne!(inherited[1], inherited[3]);
}

#[test]
fn test_shadows_follow_the_cadence() {
    let mut f = fixture(0, Vec::new());
    let shadows = RecordedShadows::default();
    f.deferred.set_shadow_renderer(Box::new(shadows.clone()));
    let mut primary = f.device.command_list(CommandListLevel::Primary);

    let mut barrier_frames = Vec::new();
    for counter in 0..21u32 {
        render_frame(&mut f, &mut primary, counter % 2);
        if primary.commands.iter().any(|c| c.starts_with("barrier")) {
            barrier_frames.push(counter);
        }
    }

    assert_eq!(barrier_frames, vec![0, 10, 20]);
    assert_eq!(shadows.passes(), vec![(0, 0), (0, 0), (0, 0)]);
    assert_eq!(f.deferred.frame_counter(), 21);
    assert!(primary
        .commands
        .iter()
        .any(|c| c.contains("UnorderedAccess->UnorderedAccess")));
}

#[test]
fn test_every_cascade_renders_on_shadow_frames() {
    let mut f = fixture(0, Vec::new());
    let shadows = RecordedShadows::default();
    f.deferred.set_shadow_renderer(Box::new(shadows.clone()));
    f.deferred.set_shadow_cascades(3);
    let mut primary = f.device.command_list(CommandListLevel::Primary);

    for counter in 0..11u32 {
        render_frame(&mut f, &mut primary, counter % 2);
    }

    assert_eq!(
        shadows.passes(),
        vec![(0, 0), (0, 1), (0, 2), (0, 0), (0, 1), (0, 2)]
    );
}

#[test]
fn test_zero_cascades_skips_the_shadow_renderer() {
    let mut f = fixture(0, Vec::new());
    let shadows = RecordedShadows::default();
    f.deferred.set_shadow_renderer(Box::new(shadows.clone()));
    f.deferred.set_shadow_cascades(0);
    let mut primary = f.device.command_list(CommandListLevel::Primary);

    render_frame(&mut f, &mut primary, 0);

    assert!(shadows.passes().is_empty());
    // The voxel barrier still follows the cadence
    assert!(primary.commands.iter().any(|c| c.starts_with("barrier")));
}

#[test]
fn test_composite_is_rerecorded_every_frame() {
    let mut f = fixture(0, Vec::new());
    let mut primary = f.device.command_list(CommandListLevel::Primary);

    render_frame(&mut f, &mut primary, 1);
    render_frame(&mut f, &mut primary, 1);

    let effect = f.deferred.effect().unwrap();
    let composite = effect
        .secondary(1)
        .unwrap()
        .as_any()
        .downcast_ref::<MockCommandList>()
        .unwrap();
    assert_eq!(composite.recordings, 2);
    // Each recording is consumed by the frame that executed it
    assert!(!effect.is_recorded(1));
    assert!(!effect.is_recorded(0));
    assert!(test_support::commands(effect.secondary(1).unwrap())
        .contains(&"bind_descriptor_sets([0, 3, 4])".to_string()));
}

#[test]
#[should_panic(expected = "deferred renderer rendered before create")]
fn test_render_before_create_panics() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let mut buckets = RenderBucketContainer::new();
    let pool = DescriptorPool::new(2);
    let mut deferred = DeferredRenderer::new(10);
    let mut primary = device.command_list(CommandListLevel::Primary);

    let _ = deferred.render(&mut resources, &mut buckets, &pool, &mut primary, 0);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_destroy_keeps_the_bucket_targets() {
    let mut f = fixture(1, Vec::new());
    let translucent = f.buckets.bucket(Bucket::Translucent).framebuffer();

    f.deferred.destroy(&mut f.resources).unwrap();

    assert!(f.deferred.effect().is_none());
    assert!(!f.deferred.voxel_map().is_valid());
    assert!(f.resources.textures.is_empty());
    assert!(f.resources.graphics_pipelines.is_empty());
    assert!(f.resources.framebuffers.contains(translucent));
    // Five bucket render passes, the filter's own is gone
    assert_eq!(f.resources.render_passes.len(), 5);
}
