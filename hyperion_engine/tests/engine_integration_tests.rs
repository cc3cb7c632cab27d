//! Integration tests for Engine on the Vulkan backend
//!
//! These tests drive the engine lifecycle against a real device.
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test engine_integration_tests -- --ignored


use gpu_test_utils::{create_test_engine, create_test_engine_without_assets};
use hyperion_engine::hyperion::asset::FileAssetLoader;
use hyperion_engine::hyperion::callbacks::EngineEvent;
use hyperion_engine::hyperion::device::{Extent3D, ResourceState, SubpassContents};
use hyperion_engine::hyperion::image::{FilterMode, Image, ImageType, InternalFormat, WrapMode};
use hyperion_engine::hyperion::render::{Bucket, BucketState, RenderPass};
use hyperion_engine::hyperion::{EngineConfig, EngineState, Error, TextureFormatDefault};
use serial_test::serial;
use std::cell::Cell;
use std::rc::Rc;

// ============================================================================
// LIFECYCLE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_engine_creation() {
    let engine = create_test_engine_without_assets();

    assert_eq!(engine.state(), EngineState::Created);
    assert!(engine.device().frames_in_flight() >= 1);
    assert_eq!(
        engine.texture_format_default(TextureFormatDefault::Color),
        InternalFormat::None
    );
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_initialize_without_composite_shader_fails() {
    let mut engine = create_test_engine_without_assets();

    let result = engine.initialize();

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(engine.state(), EngineState::Created);

    // Formats and bucket targets were resolved before the shader load
    for role in TextureFormatDefault::ALL {
        assert_ne!(engine.texture_format_default(role), InternalFormat::None);
    }
    assert!(engine.texture_format_default(TextureFormatDefault::Depth).is_depth());
    for bucket in Bucket::ALL {
        assert_eq!(engine.buckets().bucket(bucket).state(), BucketState::FramebufferCreated);
    }

    assert!(engine.destroy().is_ok());
    assert_eq!(engine.state(), EngineState::Destroyed);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_missing_shader_directory_reports_not_found() {
    let assets = FileAssetLoader::new("this/directory/does/not/exist");
    let mut engine = create_test_engine(Box::new(assets), EngineConfig::default());

    assert!(matches!(engine.initialize(), Err(Error::NotFound(_))));
    engine.destroy().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_destroy_twice_is_noop() {
    let mut engine = create_test_engine_without_assets();

    let destroyed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&destroyed);
    engine
        .callbacks
        .on(EngineEvent::DestroyGraphicsPipelines, move |args| {
            assert!(args.extent.width > 0);
            counter.set(counter.get() + 1);
        });

    engine.destroy().unwrap();
    engine.destroy().unwrap();

    assert_eq!(destroyed.get(), 1);
}

// ============================================================================
// RESOURCE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_add_and_remove_texture() {
    let mut engine = create_test_engine_without_assets();

    let image = Image::texture(
        Extent3D::new(8, 8, 1),
        InternalFormat::RGBA8,
        ImageType::Texture2D,
        FilterMode::LinearMipmap,
        WrapMode::Repeat,
        Some(vec![128; 8 * 8 * 4]),
    );
    let id = engine.add_texture(image).unwrap();

    let texture = engine.resources().textures.get(id).unwrap();
    assert!(texture.is_created());
    assert_eq!(texture.state(), ResourceState::ShaderResource);
    assert_eq!(texture.num_mipmaps(), 4);

    engine.remove_texture(id).unwrap();
    assert!(engine.resources().textures.get(id).is_none());

    engine.destroy().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_render_pass_and_framebuffer() {
    let mut engine = create_test_engine_without_assets();

    let render_pass = engine
        .add_render_pass(RenderPass::with_formats(
            SubpassContents::Inline,
            &[InternalFormat::RGBA8, InternalFormat::RGBA16F, InternalFormat::DEPTH_32F],
        ))
        .unwrap();
    let framebuffer = engine.add_framebuffer(256, 128, render_pass).unwrap();

    let resources = engine.resources();
    assert!(resources.render_passes.get(render_pass).unwrap().is_created());
    let framebuffer = resources.framebuffers.get(framebuffer).unwrap();
    assert!(framebuffer.is_created());
    assert_eq!(framebuffer.num_attachments(), 3);
    assert!(framebuffer
        .attachments()
        .iter()
        .all(|attachment| attachment.is_created()));

    engine.destroy().unwrap();
}
