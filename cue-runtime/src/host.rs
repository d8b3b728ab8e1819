//! # Host 模块
//!
//! 宿主能力接口。
//!
//! 核心逻辑不持有任何场景数据，只通过这些接口读写宿主对象。
//!
//! ## 设计说明
//!
//! 所有方法都取 `&self`，实现方使用 `Cell` / `RefCell` 做内部可变性，
//! 组件以 `Rc<dyn Trait>` 持有。这样同一个宿主对象可以被多个组件共享
//! （例如出现与消失效果写同一个节点），不会产生借用冲突。
//!
//! 可选的协作者用 `Option<Rc<dyn Trait>>` 表示，在构造时确定，之后不再判空。

use glam::Vec3;

use crate::math::Pose;

/// 节点的局部变换（位置 + 缩放）
pub trait NodeTransform {
    fn local_position(&self) -> Vec3;

    fn set_local_position(&self, position: Vec3);

    fn local_scale(&self) -> Vec3;

    fn set_local_scale(&self, scale: Vec3);
}

/// 节点子树的启用/停用
pub trait NodeActivation {
    fn set_active(&self, active: bool);

    fn is_active(&self) -> bool;
}

/// 动画驱动报告的当前状态
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorStateInfo {
    /// 当前状态名
    pub state: String,
    /// 归一化播放进度（0 为开始，1 为播放完一轮）
    pub normalized_time: f32,
}

/// 宿主动画驱动
pub trait AnimatorDriver {
    /// 是否存在该状态
    fn has_state(&self, state: &str) -> bool;

    /// 以混合时长过渡到目标状态（从头播放）
    fn cross_fade(&self, state: &str, blend_seconds: f32);

    /// 查询当前状态
    fn current_state(&self) -> AnimatorStateInfo;

    /// 启用/停用动画驱动的姿态
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;
}

/// 布娃娃刚体
pub trait RigidBodyHandle {
    /// 刚体所在节点的局部姿态
    fn local_pose(&self) -> Pose;

    fn set_local_pose(&self, pose: Pose);

    /// `true` 时不受物理模拟驱动
    fn set_kinematic(&self, kinematic: bool);

    fn set_detect_collisions(&self, detect: bool);

    /// 线速度和角速度清零
    fn reset_velocity(&self);
}

/// 全局物理世界
pub trait PhysicsWorld {
    fn gravity(&self) -> Vec3;

    fn set_gravity(&self, gravity: Vec3);
}

/// 粒子系统
pub trait ParticleEmitter {
    /// 停止发射并清除现有粒子
    fn stop_and_clear(&self);

    fn play(&self);
}

/// 音源
pub trait AudioCue {
    fn play(&self);

    /// 以指定音量播放一次（不打断循环播放）
    fn play_one_shot(&self, volume: f32);

    fn stop(&self);
}

/// 界面按钮
pub trait ButtonView {
    fn set_visible(&self, visible: bool);

    fn set_label(&self, label: &str);
}

/// 对外消息桥
pub trait MessageBridge {
    /// 发送一条已编码的消息
    fn send(&self, payload: &str);
}
