//! The virtual property surface: skin, animation, cursor, playback_rate,
//! and the material-constant fallthrough.

use nalgebra::{UnitQuaternion, Vector3, Vector4};
use rigmesh_model_core::{
    hash_name, InstanceIndex, ModelWorld, PropertyError, PropertyValue, SceneGraph, WorldConfig,
};
use rigmesh_test_fixtures::{
    model_resource, rig_scene, skeleton_chain, MockGraphics, MockRigEngine, MockSceneGraph,
};

struct Fixture {
    world: ModelWorld,
    rig: MockRigEngine,
    index: InstanceIndex,
}

impl Fixture {
    fn new() -> Self {
        let mut graphics = MockGraphics::new();
        let mut world = ModelWorld::new(WorldConfig { max_model_count: 2 }, &mut graphics);
        let mut scene = MockSceneGraph::new();
        let mut rig = MockRigEngine::new();
        let owner = scene.new_node().unwrap();
        let index = world
            .create(
                owner,
                model_resource(rig_scene(skeleton_chain(2))),
                Vector3::zeros(),
                UnitQuaternion::identity(),
                0,
                &mut scene,
                &mut rig,
            )
            .unwrap();
        Self { world, rig, index }
    }
}

#[test]
fn skin_round_trips_through_the_rig() {
    let mut f = Fixture::new();
    assert_eq!(
        f.world.get_property(f.index, hash_name("skin"), &f.rig),
        Ok(PropertyValue::Hash(hash_name("default")))
    );

    f.world
        .set_property(
            f.index,
            hash_name("skin"),
            &PropertyValue::Hash(hash_name("armored")),
            &mut f.rig,
        )
        .unwrap();
    assert_eq!(
        f.world.get_property(f.index, hash_name("skin"), &f.rig),
        Ok(PropertyValue::Hash(hash_name("armored")))
    );
}

#[test]
fn unknown_skin_is_an_unsupported_value() {
    let mut f = Fixture::new();
    let err = f
        .world
        .set_property(
            f.index,
            hash_name("skin"),
            &PropertyValue::Hash(hash_name("ghost")),
            &mut f.rig,
        )
        .unwrap_err();
    assert_eq!(
        err,
        PropertyError::UnsupportedValue {
            name: hash_name("skin")
        }
    );
}

#[test]
fn skin_rejects_non_hash_values() {
    let mut f = Fixture::new();
    let err = f
        .world
        .set_property(
            f.index,
            hash_name("skin"),
            &PropertyValue::Number(1.0),
            &mut f.rig,
        )
        .unwrap_err();
    assert_eq!(
        err,
        PropertyError::TypeMismatch {
            name: hash_name("skin")
        }
    );
}

#[test]
fn animation_reflects_the_playing_animation_and_is_read_only() {
    let mut f = Fixture::new();
    assert_eq!(
        f.world.get_property(f.index, hash_name("animation"), &f.rig),
        Ok(PropertyValue::Hash(hash_name("idle")))
    );
    // Writing falls through to the constant path, which has no such name.
    let err = f
        .world
        .set_property(
            f.index,
            hash_name("animation"),
            &PropertyValue::Hash(hash_name("run")),
            &mut f.rig,
        )
        .unwrap_err();
    assert_eq!(
        err,
        PropertyError::NotFound {
            name: hash_name("animation")
        }
    );
}

#[test]
fn cursor_is_clamped_by_the_rig() {
    let mut f = Fixture::new();
    assert_eq!(
        f.world.get_property(f.index, hash_name("cursor"), &f.rig),
        Ok(PropertyValue::Number(0.0))
    );

    f.world
        .set_property(
            f.index,
            hash_name("cursor"),
            &PropertyValue::Number(0.5),
            &mut f.rig,
        )
        .unwrap();
    assert_eq!(
        f.world.get_property(f.index, hash_name("cursor"), &f.rig),
        Ok(PropertyValue::Number(0.5))
    );

    let err = f
        .world
        .set_property(
            f.index,
            hash_name("cursor"),
            &PropertyValue::Number(1.5),
            &mut f.rig,
        )
        .unwrap_err();
    assert_eq!(
        err,
        PropertyError::UnsupportedValue {
            name: hash_name("cursor")
        }
    );
}

#[test]
fn playback_rate_rejects_negative_values() {
    let mut f = Fixture::new();
    f.world
        .set_property(
            f.index,
            hash_name("playback_rate"),
            &PropertyValue::Number(2.0),
            &mut f.rig,
        )
        .unwrap();
    assert_eq!(
        f.world
            .get_property(f.index, hash_name("playback_rate"), &f.rig),
        Ok(PropertyValue::Number(2.0))
    );

    let err = f
        .world
        .set_property(
            f.index,
            hash_name("playback_rate"),
            &PropertyValue::Number(-1.0),
            &mut f.rig,
        )
        .unwrap_err();
    assert_eq!(
        err,
        PropertyError::UnsupportedValue {
            name: hash_name("playback_rate")
        }
    );
}

#[test]
fn constants_fall_through_with_material_defaults() {
    let mut f = Fixture::new();
    // No override yet: the material default is reported.
    assert_eq!(
        f.world.get_property(f.index, hash_name("tint"), &f.rig),
        Ok(PropertyValue::Vector4(Vector4::new(1.0, 1.0, 1.0, 1.0)))
    );

    let red = Vector4::new(1.0, 0.0, 0.0, 1.0);
    f.world
        .set_property(
            f.index,
            hash_name("tint"),
            &PropertyValue::Vector4(red),
            &mut f.rig,
        )
        .unwrap();
    assert_eq!(
        f.world.get_property(f.index, hash_name("tint"), &f.rig),
        Ok(PropertyValue::Vector4(red))
    );

    f.world.component_mut(f.index).unwrap().reset_constant(hash_name("tint"));
    assert_eq!(
        f.world.get_property(f.index, hash_name("tint"), &f.rig),
        Ok(PropertyValue::Vector4(Vector4::new(1.0, 1.0, 1.0, 1.0)))
    );
}

#[test]
fn unknown_names_are_not_found_in_both_directions() {
    let mut f = Fixture::new();
    assert_eq!(
        f.world.get_property(f.index, hash_name("bogus"), &f.rig),
        Err(PropertyError::NotFound {
            name: hash_name("bogus")
        })
    );
    assert_eq!(
        f.world.set_property(
            f.index,
            hash_name("bogus"),
            &PropertyValue::Number(1.0),
            &mut f.rig,
        ),
        Err(PropertyError::NotFound {
            name: hash_name("bogus")
        })
    );
}

#[test]
fn free_slots_report_not_found() {
    let f = Fixture::new();
    assert_eq!(
        f.world.get_property(InstanceIndex(1), hash_name("skin"), &f.rig),
        Err(PropertyError::NotFound {
            name: hash_name("skin")
        })
    );
}
