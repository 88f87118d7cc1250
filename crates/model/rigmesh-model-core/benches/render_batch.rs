use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nalgebra::{UnitQuaternion, Vector3, Vector4};
use rigmesh_model_core::{
    hash_name, sort_entries, ModelWorld, PropertyValue, SceneGraph, WorldConfig,
};
use rigmesh_test_fixtures::{
    model_resource, rig_scene, skeleton_chain, MockGraphics, MockRigEngine, MockSceneGraph,
};

struct Frame {
    world: ModelWorld,
    scene: MockSceneGraph,
    rig: MockRigEngine,
    graphics: MockGraphics,
}

/// `count` promoted instances over a shared resource; every fourth one
/// carries a tint override so the list splits into more than one batch.
fn frame_of(count: usize) -> Frame {
    let mut graphics = MockGraphics::new();
    let mut world = ModelWorld::new(
        WorldConfig {
            max_model_count: count,
        },
        &mut graphics,
    );
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_chain(4)));

    for i in 0..count {
        let owner = scene.new_node().unwrap();
        let index = world
            .create(
                owner,
                resource.clone(),
                Vector3::new(i as f32, 0.0, 0.0),
                UnitQuaternion::identity(),
                0,
                &mut scene,
                &mut rig,
            )
            .unwrap();
        world.add_to_update(index);
        if i % 4 == 0 {
            world
                .set_property(
                    index,
                    hash_name("tint"),
                    &PropertyValue::Vector4(Vector4::new(1.0, 0.5, 0.5, 1.0)),
                    &mut rig,
                )
                .unwrap();
        }
    }

    Frame {
        world,
        scene,
        rig,
        graphics,
    }
}

fn bench_render_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_batch");
    for count in [16usize, 64, 256] {
        let mut frame = frame_of(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                frame.graphics.uploads.clear();
                frame.world.update();
                let mut entries = frame.world.render(&frame.scene, &frame.rig);
                sort_entries(&mut entries);
                let objects = frame
                    .world
                    .dispatch(&entries, &frame.rig, &mut frame.graphics);
                black_box(objects.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render_batch);
criterion_main!(benches);
