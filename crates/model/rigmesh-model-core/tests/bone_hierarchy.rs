//! Attach/detach lifecycle and the mirrored bone-node hierarchy.

use nalgebra::{UnitQuaternion, Vector3};
use rigmesh_model_core::{ModelError, ModelWorld, SceneGraph, WorldConfig};
use rigmesh_test_fixtures::{
    model_resource, rig_scene, skeleton_chain, skeleton_tree, MockGraphics, MockRigEngine,
    MockSceneGraph,
};

fn world_of(capacity: usize) -> (ModelWorld, MockGraphics) {
    let mut graphics = MockGraphics::new();
    let world = ModelWorld::new(
        WorldConfig {
            max_model_count: capacity,
        },
        &mut graphics,
    );
    (world, graphics)
}

#[test]
fn attach_mirrors_every_bone_with_correct_parents() {
    let (mut world, _graphics) = world_of(8);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_tree()));

    let owner = scene.new_node().unwrap();
    let index = world
        .create(
            owner,
            resource.clone(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap();

    let nodes = world.component(index).unwrap().node_instances.clone();
    assert_eq!(nodes.len(), 5);
    assert_eq!(scene.bone_node_count(), 5);

    // Bone 0 parents to the owning node; bone i to its parent bone's node.
    assert_eq!(scene.parent_of(nodes[0]), Some(owner));
    let parents = [0usize, 0, 1, 2];
    for (i, p) in parents.iter().enumerate() {
        assert_eq!(scene.parent_of(nodes[i + 1]), Some(nodes[*p]));
    }

    // Reverse-order parenting + child-prepending keeps enumeration in
    // bone order.
    assert_eq!(scene.children(nodes[0]), vec![nodes[1], nodes[2]]);
}

#[test]
fn root_bone_composes_component_offset_with_bind_pose() {
    let (mut world, _graphics) = world_of(4);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_chain(3)));

    let owner = scene.new_node().unwrap();
    let index = world
        .create(
            owner,
            resource,
            Vector3::new(5.0, -1.0, 0.0),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap();

    let nodes = &world.component(index).unwrap().node_instances;
    let root_local = scene.local_transform(nodes[0]);
    assert_eq!(root_local.translation, Vector3::new(5.0, -1.0, 0.0));
    // Non-root bones carry the raw bind pose.
    assert_eq!(scene.local_transform(nodes[1]).translation, Vector3::new(1.0, 0.0, 0.0));
}

#[test]
fn detach_releases_bones_rig_and_slot() {
    let (mut world, _graphics) = world_of(2);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_chain(4)));

    let owner = scene.new_node().unwrap();
    let index = world
        .create(
            owner,
            resource.clone(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap();
    assert_eq!(rig.instance_count(), 1);

    world.destroy(index, &mut scene, &mut rig);
    assert_eq!(scene.bone_node_count(), 0);
    assert_eq!(rig.instance_count(), 0);
    assert_eq!(world.live_count(), 0);

    // The freed slot is reused by the next attach.
    let again = world
        .create(
            owner,
            resource,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap();
    assert_eq!(again, index);
}

#[test]
fn attach_beyond_capacity_fails_without_side_effects() {
    let (mut world, _graphics) = world_of(1);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_chain(2)));

    let owner = scene.new_node().unwrap();
    world
        .create(
            owner,
            resource.clone(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap();

    let nodes_before = scene.node_count();
    let err = world
        .create(
            owner,
            resource,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            1,
            &mut scene,
            &mut rig,
        )
        .unwrap_err();
    assert_eq!(err, ModelError::WorldFull { capacity: 1 });
    assert_eq!(scene.node_count(), nodes_before);
    assert_eq!(rig.instance_count(), 1);
}

#[test]
fn rig_creation_failure_rolls_back_the_slot() {
    let (mut world, _graphics) = world_of(2);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    rig.fail_creates = 1;
    let resource = model_resource(rig_scene(skeleton_chain(2)));

    let owner = scene.new_node().unwrap();
    let err = world
        .create(
            owner,
            resource.clone(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::Rig(_)));
    assert_eq!(world.live_count(), 0);
    assert_eq!(scene.bone_node_count(), 0);

    // Recovers on the next attempt.
    assert!(world
        .create(
            owner,
            resource,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .is_ok());
}

#[test]
fn bone_synthesis_failure_leaves_no_orphans() {
    let (mut world, _graphics) = world_of(2);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_chain(4)));

    let owner = scene.new_node().unwrap();
    scene.node_budget = Some(2); // third bone node allocation fails

    let err = world
        .create(
            owner,
            resource,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap_err();
    assert_eq!(err, ModelError::BoneSynthesis { created: 2, total: 4 });
    assert_eq!(world.live_count(), 0);
    assert_eq!(rig.instance_count(), 0);
    // Owner remains; every partially created bone node is gone.
    assert_eq!(scene.node_count(), 1);
    assert_eq!(scene.bone_node_count(), 0);
}

#[test]
fn identifier_exhaustion_is_also_rolled_back() {
    let (mut world, _graphics) = world_of(2);
    let mut scene = MockSceneGraph::new();
    let mut rig = MockRigEngine::new();
    let resource = model_resource(rig_scene(skeleton_chain(3)));

    let owner = scene.new_node().unwrap();
    scene.index_budget = Some(1);

    let err = world
        .create(
            owner,
            resource,
            Vector3::zeros(),
            UnitQuaternion::identity(),
            0,
            &mut scene,
            &mut rig,
        )
        .unwrap_err();
    assert_eq!(err, ModelError::BoneSynthesis { created: 1, total: 3 });
    assert_eq!(scene.bone_node_count(), 0);
    assert_eq!(rig.instance_count(), 0);
}
