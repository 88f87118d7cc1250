//! Scriptable rig engine: poses and events are pushed by the test, then
//! pulled by the world's post-update pass.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Matrix4, Point3, Vector3};
use rigmesh_api_core::{hash_name, NameHash, Transform};
use rigmesh_model_core::{
    IkSource, ModelVertex, RigEngine, RigError, RigEvent, RigInstanceId, RigInstanceParams,
    RigPlayback,
};

#[derive(Clone, Debug)]
pub struct PlayRecord {
    pub instance: RigInstanceId,
    pub animation: NameHash,
    pub playback: RigPlayback,
    pub blend_duration: f32,
    pub offset: f32,
    pub playback_rate: f32,
}

struct RigInstance {
    params: RigInstanceParams,
    enabled: bool,
    mesh: NameHash,
    animation: NameHash,
    playback: RigPlayback,
    cursor: f32,
    rate: f32,
    pose: Vec<Transform>,
    events: Vec<RigEvent>,
    vertex_count: usize,
    ik: Vec<(NameHash, IkSource, f32)>,
    ik_resolved: HashMap<NameHash, Vector3<f32>>,
}

pub struct MockRigEngine {
    instances: HashMap<RigInstanceId, RigInstance>,
    next: u32,
    /// Animations `play_animation` accepts.
    pub valid_animations: HashSet<NameHash>,
    /// Skins `set_mesh` accepts.
    pub valid_skins: HashSet<NameHash>,
    /// Fail the next `create_instance` calls while > 0.
    pub fail_creates: usize,
    pub plays: Vec<PlayRecord>,
    pub cancels: Vec<RigInstanceId>,
}

impl Default for MockRigEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRigEngine {
    pub fn new() -> Self {
        let mut valid_animations = HashSet::new();
        valid_animations.insert(hash_name("idle"));
        valid_animations.insert(hash_name("run"));
        let mut valid_skins = HashSet::new();
        valid_skins.insert(hash_name("default"));
        valid_skins.insert(hash_name("armored"));
        Self {
            instances: HashMap::new(),
            next: 0,
            valid_animations,
            valid_skins,
            fail_creates: 0,
            plays: Vec::new(),
            cancels: Vec::new(),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Push a solved pose, to be applied on the next post-update.
    pub fn push_pose(&mut self, instance: RigInstanceId, pose: Vec<Transform>) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.pose = pose;
        }
    }

    /// Queue a completion event for the currently playing animation.
    pub fn complete_current(&mut self, instance: RigInstanceId) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.events.push(RigEvent::Completed {
                animation: inst.animation,
                playback: inst.playback,
            });
        }
    }

    pub fn push_event(&mut self, instance: RigInstanceId, event: RigEvent) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.events.push(event);
        }
    }

    pub fn set_vertex_count(&mut self, instance: RigInstanceId, count: usize) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.vertex_count = count;
        }
    }

    pub fn is_enabled(&self, instance: RigInstanceId) -> bool {
        self.instances.get(&instance).map(|i| i.enabled).unwrap_or(false)
    }

    /// Bone count of the skeleton the instance was created against.
    pub fn skeleton_bone_count(&self, instance: RigInstanceId) -> Option<usize> {
        self.instances
            .get(&instance)
            .map(|i| i.params.skeleton.bone_count())
    }

    pub fn ik_resolved(&self, instance: RigInstanceId, constraint: NameHash) -> Option<Vector3<f32>> {
        self.instances
            .get(&instance)
            .and_then(|i| i.ik_resolved.get(&constraint).copied())
    }

    pub fn ik_mix(&self, instance: RigInstanceId, constraint: NameHash) -> Option<f32> {
        self.instances.get(&instance).and_then(|i| {
            i.ik
                .iter()
                .find(|(c, _, _)| *c == constraint)
                .map(|(_, _, mix)| *mix)
        })
    }
}

impl RigEngine for MockRigEngine {
    fn create_instance(&mut self, params: RigInstanceParams) -> Result<RigInstanceId, RigError> {
        if self.fail_creates > 0 {
            self.fail_creates -= 1;
            return Err(RigError::InvalidBindData);
        }
        self.next += 1;
        let id = RigInstanceId(self.next);
        let instance = RigInstance {
            mesh: params.mesh,
            animation: params.default_animation,
            playback: RigPlayback::LoopForward,
            cursor: 0.0,
            rate: 1.0,
            pose: Vec::new(),
            events: Vec::new(),
            vertex_count: 4,
            ik: Vec::new(),
            ik_resolved: HashMap::new(),
            enabled: true,
            params,
        };
        self.instances.insert(id, instance);
        Ok(id)
    }

    fn destroy_instance(&mut self, instance: RigInstanceId) {
        self.instances.remove(&instance);
    }

    fn is_valid(&self, instance: RigInstanceId) -> bool {
        self.instances.contains_key(&instance)
    }

    fn set_enabled(&mut self, instance: RigInstanceId, enabled: bool) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.enabled = enabled;
        }
    }

    fn play_animation(
        &mut self,
        instance: RigInstanceId,
        animation: NameHash,
        playback: RigPlayback,
        blend_duration: f32,
        offset: f32,
        playback_rate: f32,
    ) -> Result<(), RigError> {
        if !self.valid_animations.contains(&animation) {
            return Err(RigError::AnimationNotFound { animation });
        }
        let inst = self
            .instances
            .get_mut(&instance)
            .ok_or(RigError::InvalidInstance)?;
        inst.animation = animation;
        inst.playback = playback;
        self.plays.push(PlayRecord {
            instance,
            animation,
            playback,
            blend_duration,
            offset,
            playback_rate,
        });
        Ok(())
    }

    fn cancel_animation(&mut self, instance: RigInstanceId) {
        self.cancels.push(instance);
    }

    fn mesh(&self, instance: RigInstanceId) -> NameHash {
        self.instances
            .get(&instance)
            .map(|i| i.mesh)
            .unwrap_or(NameHash::EMPTY)
    }

    fn set_mesh(&mut self, instance: RigInstanceId, mesh: NameHash) -> Result<(), RigError> {
        if !self.valid_skins.contains(&mesh) {
            return Err(RigError::SkinNotFound { skin: mesh });
        }
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.mesh = mesh;
        }
        Ok(())
    }

    fn animation(&self, instance: RigInstanceId) -> NameHash {
        self.instances
            .get(&instance)
            .map(|i| i.animation)
            .unwrap_or(NameHash::EMPTY)
    }

    fn cursor(&self, instance: RigInstanceId) -> f32 {
        self.instances.get(&instance).map(|i| i.cursor).unwrap_or(0.0)
    }

    fn set_cursor(&mut self, instance: RigInstanceId, cursor: f32) -> Result<(), RigError> {
        if !(0.0..=1.0).contains(&cursor) {
            return Err(RigError::InvalidInstance);
        }
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.cursor = cursor;
        }
        Ok(())
    }

    fn playback_rate(&self, instance: RigInstanceId) -> f32 {
        self.instances.get(&instance).map(|i| i.rate).unwrap_or(0.0)
    }

    fn set_playback_rate(&mut self, instance: RigInstanceId, rate: f32) -> Result<(), RigError> {
        if rate < 0.0 {
            return Err(RigError::InvalidInstance);
        }
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.rate = rate;
        }
        Ok(())
    }

    fn pose(&self, instance: RigInstanceId) -> &[Transform] {
        self.instances
            .get(&instance)
            .map(|i| i.pose.as_slice())
            .unwrap_or(&[])
    }

    fn drain_events(&mut self, instance: RigInstanceId) -> Vec<RigEvent> {
        self.instances
            .get_mut(&instance)
            .map(|i| std::mem::take(&mut i.events))
            .unwrap_or_default()
    }

    fn vertex_count(&self, instance: RigInstanceId) -> usize {
        self.instances
            .get(&instance)
            .map(|i| i.vertex_count)
            .unwrap_or(0)
    }

    fn generate_vertex_data(
        &self,
        instance: RigInstanceId,
        world: &Matrix4<f32>,
        out: &mut Vec<ModelVertex>,
    ) {
        let Some(inst) = self.instances.get(&instance) else {
            return;
        };
        for i in 0..inst.vertex_count {
            let p = world.transform_point(&Point3::new(i as f32, 0.0, 0.0));
            out.push(ModelVertex {
                position: [p.x, p.y, p.z],
                texcoord: [0.0, 0.0],
                color: [255, 255, 255, 255],
            });
        }
    }

    fn set_ik_target(
        &mut self,
        instance: RigInstanceId,
        constraint: NameHash,
        mix: f32,
        source: IkSource,
    ) -> bool {
        let Some(inst) = self.instances.get_mut(&instance) else {
            return false;
        };
        inst.ik.retain(|(c, _, _)| *c != constraint);
        inst.ik.push((constraint, source, mix));
        true
    }

    fn ik_targets(&self, instance: RigInstanceId) -> Vec<(NameHash, IkSource)> {
        self.instances
            .get(&instance)
            .map(|i| {
                i.ik
                    .iter()
                    .filter(|(_, _, mix)| *mix > 0.0)
                    .map(|(c, s, _)| (*c, *s))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_ik_position(
        &mut self,
        instance: RigInstanceId,
        constraint: NameHash,
        local: Vector3<f32>,
    ) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.ik_resolved.insert(constraint, local);
        }
    }

    fn clear_ik_target(&mut self, instance: RigInstanceId, constraint: NameHash) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            for (c, _, mix) in inst.ik.iter_mut() {
                if *c == constraint {
                    *mix = 0.0;
                }
            }
        }
    }
}
