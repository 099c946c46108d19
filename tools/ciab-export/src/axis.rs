//! Coordinate convention conversion
//!
//! Maps host-space vectors, quaternions and transforms into the target
//! convention. Both conversions are involutions, so `revert_*` is the same
//! mapping applied again.

use glam::{Mat4, Quat, Vec3, Vec4};
use serde::Deserialize;

/// Axis remap applied to everything the exporter emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AxisConversion {
    /// Keep host axes (glTF and OBJ are already Y-up)
    #[default]
    Identity,
    /// Z-up host to Y-up target: swap the Y and Z axes
    SwapYz,
}

/// Permutation matrix swapping rows/columns 1 and 2
const SWAP_YZ: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::Y, Vec4::W);

impl AxisConversion {
    pub fn convert_vector(self, v: Vec3) -> Vec3 {
        match self {
            Self::Identity => v,
            Self::SwapYz => Vec3::new(v.x, v.z, v.y),
        }
    }

    /// `(w, x, y, z) -> (-w, x, z, y)`
    ///
    /// The axis swap is a reflection, so the rotation axis picks up a sign
    /// flip; negating `w` instead keeps the same rotation with a shorter form.
    pub fn convert_quaternion(self, q: Quat) -> Quat {
        match self {
            Self::Identity => q,
            Self::SwapYz => Quat::from_xyzw(q.x, q.z, q.y, -q.w),
        }
    }

    /// `M -> P * M * P`
    pub fn convert_transform(self, m: Mat4) -> Mat4 {
        match self {
            Self::Identity => m,
            Self::SwapYz => SWAP_YZ * m * SWAP_YZ,
        }
    }

    pub fn revert_vector(self, v: Vec3) -> Vec3 {
        self.convert_vector(v)
    }

    pub fn revert_quaternion(self, q: Quat) -> Quat {
        self.convert_quaternion(q)
    }

    pub fn revert_transform(self, m: Mat4) -> Mat4 {
        self.convert_transform(m)
    }
}

/// Quaternion in wire order `(w, x, y, z)`
pub fn quat_to_wxyz(q: Quat) -> [f32; 4] {
    [q.w, q.x, q.y, q.z]
}

/// Normalize, falling back to identity for a degenerate quaternion
pub fn normalize_or_identity(q: Quat) -> Quat {
    let length_squared = q.length_squared();
    if length_squared > f32::EPSILON && length_squared.is_finite() {
        q * length_squared.sqrt().recip()
    } else {
        Quat::IDENTITY
    }
}
