use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockPipeline};
use crate::render::test_support::{self, names};
use crate::render::{Mesh, Resources, Vertex};
use glam::{Vec2, Vec3};

fn triangle() -> Renderable {
    let vertex = |x: f32, y: f32| Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z, Vec2::new(x, y));
    Renderable::Mesh(Mesh::new(
        vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
        vec![0, 1, 2],
    ))
}

// ============================================================================
// Bucket defaults
// ============================================================================

#[test]
fn test_bucket_order_and_index() {
    assert_eq!(Bucket::ALL.len(), 5);
    assert_eq!(Bucket::Skybox.index(), 0);
    assert_eq!(Bucket::Screen.index(), 4);
    assert!(Bucket::Opaque < Bucket::Translucent);
}

#[test]
fn test_bucket_defaults() {
    let mut device = MockGraphicsDevice::new();
    let resources = Resources::new();
    let shader = test_support::shader(&mut device, &resources);

    let opaque = GraphicsPipeline::new(shader.clone(), Bucket::Opaque);
    assert_eq!(opaque.topology(), PrimitiveTopology::TriangleList);
    assert_eq!(opaque.vertex_layout(), VertexLayout::Mesh);

    let particles = GraphicsPipeline::new(shader.clone(), Bucket::Particle);
    assert_eq!(particles.vertex_layout(), VertexLayout::Particle);

    let screen = GraphicsPipeline::new(shader, Bucket::Screen);
    assert_eq!(screen.topology(), PrimitiveTopology::TriangleFan);
    assert_eq!(screen.vertex_layout(), VertexLayout::None);
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_builds_pipeline_and_renderables() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, _) = test_support::targets(&mut device, &mut resources);
    let pool = test_support::empty_pool(&mut device, &resources);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Opaque);
    pipeline.add_renderable(triangle());
    let live = device.live_objects();

    pipeline
        .create(&mut device, resources.render_passes.get(render_pass).unwrap(), &pool)
        .unwrap();

    // vertex buffer, index buffer, pipeline
    assert_eq!(device.live_objects(), live + 3);
    let gpu = pipeline.gpu_pipeline().unwrap().as_any().downcast_ref::<MockPipeline>().unwrap();
    assert_eq!(gpu.set_layouts, vec![0, 1, 2]);
    assert_eq!(gpu.stages.len(), 2);
    assert!(!pipeline.has_frame_data());

    pipeline.create_frame_data(&mut device).unwrap();
    assert!(pipeline.has_frame_data());
    assert_eq!(device.live_objects(), live + 5);
}

#[test]
fn test_create_before_pool_fails() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, _) = test_support::targets(&mut device, &mut resources);
    let pool = DescriptorPool::new(2);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Opaque);

    let result = pipeline.create(&mut device, resources.render_passes.get(render_pass).unwrap(), &pool);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(!pipeline.is_created());
}

#[test]
#[should_panic(expected = "after create")]
fn test_add_renderable_after_create_panics() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, _) = test_support::targets(&mut device, &mut resources);
    let pool = test_support::empty_pool(&mut device, &resources);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Opaque);
    pipeline
        .create(&mut device, resources.render_passes.get(render_pass).unwrap(), &pool)
        .unwrap();

    pipeline.add_renderable(triangle());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_records_secondary_inside_the_pass() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, framebuffer) = test_support::targets(&mut device, &mut resources);
    let pool = test_support::empty_pool(&mut device, &resources);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Opaque);
    pipeline.add_renderable(triangle());
    let render_pass = resources.render_passes.get(render_pass).unwrap();
    let framebuffer = resources.framebuffers.get(framebuffer).unwrap();
    pipeline.create(&mut device, render_pass, &pool).unwrap();
    pipeline.create_frame_data(&mut device).unwrap();

    let mut primary = device.command_list(CommandListLevel::Primary);
    primary.begin(None).unwrap();
    pipeline
        .render(&mut primary, render_pass, framebuffer, &pool, 1)
        .unwrap();

    assert_eq!(
        names(&primary.commands),
        vec![
            "begin",
            "execute_secondary",
            "secondary:begin",
            "secondary:bind_pipeline",
            "secondary:bind_descriptor_sets",
            "secondary:bind_vertex_buffer",
            "secondary:bind_index_buffer",
            "secondary:draw_indexed",
            "secondary:end",
        ]
    );
    assert!(primary.commands.contains(&"secondary:bind_descriptor_sets([0, 3, 4])".to_string()));
    assert!(primary.commands.contains(&"secondary:draw_indexed(3, 1, 0, 0)".to_string()));
}

#[test]
fn test_bind_and_draw_records_inline() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, _) = test_support::targets(&mut device, &mut resources);
    let pool = test_support::empty_pool(&mut device, &resources);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Screen);
    pipeline.add_renderable(Renderable::FullScreenQuad);
    pipeline
        .create(&mut device, resources.render_passes.get(render_pass).unwrap(), &pool)
        .unwrap();

    let mut cmd = device.command_list(CommandListLevel::Secondary);
    cmd.begin(None).unwrap();
    pipeline.bind_and_draw(&mut cmd, &pool, 0).unwrap();

    assert_eq!(
        names(&cmd.commands),
        vec!["begin", "bind_pipeline", "bind_descriptor_sets", "draw"]
    );
    assert_eq!(cmd.commands[3], "draw(4, 1, 0)");
}

#[test]
#[should_panic(expected = "rendered before create")]
fn test_render_before_create_panics() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, framebuffer) = test_support::targets(&mut device, &mut resources);
    let pool = DescriptorPool::new(2);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Opaque);
    let mut primary = device.command_list(CommandListLevel::Primary);

    let _ = pipeline.render(
        &mut primary,
        resources.render_passes.get(render_pass).unwrap(),
        resources.framebuffers.get(framebuffer).unwrap(),
        &pool,
        0,
    );
}

#[test]
fn test_destroy_releases_gpu_objects() {
    let mut device = MockGraphicsDevice::new();
    let mut resources = Resources::new();
    let (render_pass, _) = test_support::targets(&mut device, &mut resources);
    let pool = test_support::empty_pool(&mut device, &resources);
    let mut pipeline = GraphicsPipeline::new(test_support::shader(&mut device, &resources), Bucket::Opaque);
    pipeline.add_renderable(triangle());
    let live = device.live_objects();
    pipeline
        .create(&mut device, resources.render_passes.get(render_pass).unwrap(), &pool)
        .unwrap();
    pipeline.create_frame_data(&mut device).unwrap();

    pipeline.destroy().unwrap();

    assert_eq!(device.live_objects(), live);
    assert!(!pipeline.is_created());
    assert_eq!(pipeline.renderables().len(), 1);
}
