//! # Math 模块
//!
//! 补间可插值的值类型，以及刚体的局部姿态。

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// 可线性插值的值
pub trait Lerp: Copy {
    /// 在 `self` 与 `other` 之间插值，`t` 不做限制
    fn lerp_to(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// 局部姿态（引擎空间的局部位置 + 局部旋转）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// 原点、无旋转
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}
