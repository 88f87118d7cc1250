//! Translation/rotation/scale transform with the composition variants the
//! scene component needs: full composition and one that keeps the parent's
//! forward-axis (Z) scale out of the child's translation.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Rotate-scale-translate transform. Points map as
/// `translation + rotation * (scale ∘ p)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Transform with unit scale.
    pub fn new(translation: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self {
            translation,
            rotation,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_scale(
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Compose `self ∘ rhs`: `rhs` expressed in the space of `self`.
    pub fn mul(&self, rhs: &Transform) -> Transform {
        Transform {
            translation: self.translation
                + self.rotation * self.scale.component_mul(&rhs.translation),
            rotation: self.rotation * rhs.rotation,
            scale: self.scale.component_mul(&rhs.scale),
        }
    }

    /// As [`mul`](Self::mul), but the parent's Z scale does not feed into
    /// the child's translation. Used when the owning node is configured
    /// not to scale along its forward axis.
    pub fn mul_no_scale_z(&self, rhs: &Transform) -> Transform {
        let mut translation_scale = self.scale;
        translation_scale.z = 1.0;
        Transform {
            translation: self.translation
                + self.rotation * translation_scale.component_mul(&rhs.translation),
            rotation: self.rotation * rhs.rotation,
            scale: self.scale.component_mul(&rhs.scale),
        }
    }

    /// Inverse transform. Exact for uniform scale, which is the only kind
    /// this component composes with (component locals carry unit scale).
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vector3::new(
            1.0 / self.scale.x,
            1.0 / self.scale.y,
            1.0 / self.scale.z,
        );
        Transform {
            translation: -inv_scale.component_mul(&(inv_rotation * self.translation)),
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    #[inline]
    pub fn apply_point(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.translation + self.rotation * self.scale.component_mul(&p)
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_is_neutral() {
        let t = Transform::with_scale(
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
            Vector3::new(2.0, 2.0, 2.0),
        );
        let composed = Transform::identity().mul(&t);
        assert_relative_eq!(composed.translation, t.translation, epsilon = 1e-6);
        assert_relative_eq!(composed.scale, t.scale, epsilon = 1e-6);
    }

    #[test]
    fn inverse_round_trips_points_under_uniform_scale() {
        let t = Transform::with_scale(
            Vector3::new(4.0, -1.0, 2.5),
            UnitQuaternion::from_euler_angles(0.0, FRAC_PI_2, 0.4),
            Vector3::new(3.0, 3.0, 3.0),
        );
        let p = Vector3::new(0.5, -2.0, 7.0);
        let round_trip = t.inverse().apply_point(t.apply_point(p));
        assert_relative_eq!(round_trip, p, epsilon = 1e-4);
    }

    #[test]
    fn no_scale_z_suppresses_forward_axis_translation_scale() {
        let parent = Transform::with_scale(
            Vector3::zeros(),
            UnitQuaternion::identity(),
            Vector3::new(1.0, 1.0, 5.0),
        );
        let child = Transform::new(Vector3::new(0.0, 0.0, 2.0), UnitQuaternion::identity());

        let scaled = parent.mul(&child);
        let unscaled = parent.mul_no_scale_z(&child);

        assert_relative_eq!(scaled.translation.z, 10.0, epsilon = 1e-6);
        assert_relative_eq!(unscaled.translation.z, 2.0, epsilon = 1e-6);
        // Scale itself still composes either way.
        assert_relative_eq!(unscaled.scale.z, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn matrix_matches_apply_point() {
        let t = Transform::with_scale(
            Vector3::new(1.0, 0.0, -2.0),
            UnitQuaternion::from_euler_angles(0.3, 0.0, 0.0),
            Vector3::new(2.0, 2.0, 2.0),
        );
        let p = Vector3::new(1.0, 1.0, 1.0);
        let by_transform = t.apply_point(p);
        let by_matrix = t.to_matrix().transform_point(&nalgebra::Point3::from(p));
        assert_relative_eq!(by_transform, by_matrix.coords, epsilon = 1e-5);
    }
}
