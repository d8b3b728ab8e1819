//! # Sim 模块
//!
//! 宿主能力的内存实现，不依赖任何真实设备或引擎。
//!
//! 用于无头运行（`host-cli`）和测试：每个对象都记录被调用的次数，
//! 动画驱动按每个状态的片段长度推进进度，刚体在非运动学时按重力简单下落。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::{Quat, Vec3};
use tracing::{debug, info};

use crate::host::{
    AnimatorDriver, AnimatorStateInfo, AudioCue, ButtonView, MessageBridge, NodeActivation,
    NodeTransform, ParticleEmitter, PhysicsWorld, RigidBodyHandle,
};
use crate::interaction::TargetInteraction;
use crate::math::Pose;
use crate::message::{TargetEvent, TargetMessage};
use crate::rig::CharacterRig;
use crate::sequence::SequenceOrchestrator;

// ========== 节点 ==========

/// 内存节点变换
#[derive(Debug)]
pub struct SimTransform {
    position: Cell<Vec3>,
    scale: Cell<Vec3>,
}

impl SimTransform {
    /// 位于 `position`，缩放为 1
    pub fn at(position: Vec3) -> Rc<Self> {
        Rc::new(Self {
            position: Cell::new(position),
            scale: Cell::new(Vec3::ONE),
        })
    }
}

impl NodeTransform for SimTransform {
    fn local_position(&self) -> Vec3 {
        self.position.get()
    }

    fn set_local_position(&self, position: Vec3) {
        self.position.set(position);
    }

    fn local_scale(&self) -> Vec3 {
        self.scale.get()
    }

    fn set_local_scale(&self, scale: Vec3) {
        self.scale.set(scale);
    }
}

/// 内存节点启用状态
#[derive(Debug)]
pub struct SimNode {
    active: Cell<bool>,
}

impl SimNode {
    pub fn new(active: bool) -> Rc<Self> {
        Rc::new(Self {
            active: Cell::new(active),
        })
    }
}

impl NodeActivation for SimNode {
    fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

// ========== 动画 ==========

/// 内存动画驱动
///
/// `cross_fade` 只记录请求，下一次 [`advance`](Self::advance) 才切换状态并从头播放。
#[derive(Debug)]
pub struct SimAnimator {
    /// 状态名 → 片段长度（秒）
    states: RefCell<HashMap<String, f32>>,
    current: RefCell<String>,
    /// 当前状态已播放时间
    time: Cell<f32>,
    pending: RefCell<Option<String>>,
    enabled: Cell<bool>,
    stalled: Cell<bool>,
    cross_fades: Cell<u32>,
}

impl SimAnimator {
    /// 创建动画驱动，初始停在 `initial`（片段长度 1 秒）
    pub fn new(initial: &str) -> Rc<Self> {
        let animator = Rc::new(Self {
            states: RefCell::new(HashMap::new()),
            current: RefCell::new(initial.to_string()),
            time: Cell::new(0.0),
            pending: RefCell::new(None),
            enabled: Cell::new(true),
            stalled: Cell::new(false),
            cross_fades: Cell::new(0),
        });
        animator.add_state(initial, 1.0);
        animator
    }

    pub fn add_state(&self, name: &str, length: f32) {
        self.states.borrow_mut().insert(name.to_string(), length);
    }

    /// 卡住时既不切换状态也不推进进度
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.set(stalled);
    }

    /// 推进播放时间；停用或卡住时不推进
    pub fn advance(&self, dt: f32) {
        if self.stalled.get() || !self.enabled.get() {
            return;
        }

        if let Some(next) = self.pending.borrow_mut().take() {
            *self.current.borrow_mut() = next;
            self.time.set(0.0);
        }
        self.time.set(self.time.get() + dt.max(0.0));
    }

    pub fn cross_fade_count(&self) -> u32 {
        self.cross_fades.get()
    }
}

impl AnimatorDriver for SimAnimator {
    fn has_state(&self, state: &str) -> bool {
        self.states.borrow().contains_key(state)
    }

    fn cross_fade(&self, state: &str, blend_seconds: f32) {
        debug!(state = %state, blend = blend_seconds, "模拟动画过渡");
        self.cross_fades.set(self.cross_fades.get() + 1);
        *self.pending.borrow_mut() = Some(state.to_string());
    }

    fn current_state(&self) -> AnimatorStateInfo {
        let state = self.current.borrow().clone();
        let length = self.states.borrow().get(&state).copied().unwrap_or(0.0);
        let normalized_time = if length > 0.0 {
            self.time.get() / length
        } else {
            1.0
        };
        AnimatorStateInfo {
            state,
            normalized_time,
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

// ========== 物理 ==========

/// 内存刚体
///
/// 非运动学时按重力做显式欧拉积分，并绕 X 轴缓慢翻滚。
#[derive(Debug)]
pub struct SimBody {
    pose: Cell<Pose>,
    velocity: Cell<Vec3>,
    kinematic: Cell<bool>,
    detect_collisions: Cell<bool>,
}

impl SimBody {
    pub fn new(pose: Pose) -> Rc<Self> {
        Rc::new(Self {
            pose: Cell::new(pose),
            velocity: Cell::new(Vec3::ZERO),
            kinematic: Cell::new(false),
            detect_collisions: Cell::new(false),
        })
    }

    /// 物理步进
    pub fn integrate(&self, dt: f32, gravity: Vec3) {
        if self.kinematic.get() {
            return;
        }
        let velocity = self.velocity.get() + gravity * dt;
        self.velocity.set(velocity);

        let mut pose = self.pose.get();
        pose.position += velocity * dt;
        pose.rotation = (Quat::from_rotation_x(dt) * pose.rotation).normalize();
        self.pose.set(pose);
    }

    pub fn is_kinematic(&self) -> bool {
        self.kinematic.get()
    }

    pub fn detects_collisions(&self) -> bool {
        self.detect_collisions.get()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity.get()
    }
}

impl RigidBodyHandle for SimBody {
    fn local_pose(&self) -> Pose {
        self.pose.get()
    }

    fn set_local_pose(&self, pose: Pose) {
        self.pose.set(pose);
    }

    fn set_kinematic(&self, kinematic: bool) {
        self.kinematic.set(kinematic);
    }

    fn set_detect_collisions(&self, detect: bool) {
        self.detect_collisions.set(detect);
    }

    fn reset_velocity(&self) {
        self.velocity.set(Vec3::ZERO);
    }
}

/// 内存物理世界
#[derive(Debug)]
pub struct SimPhysics {
    gravity: Cell<Vec3>,
}

impl SimPhysics {
    pub fn new(gravity: Vec3) -> Rc<Self> {
        Rc::new(Self {
            gravity: Cell::new(gravity),
        })
    }
}

impl PhysicsWorld for SimPhysics {
    fn gravity(&self) -> Vec3 {
        self.gravity.get()
    }

    fn set_gravity(&self, gravity: Vec3) {
        self.gravity.set(gravity);
    }
}

// ========== 反馈 ==========

/// 内存粒子系统
#[derive(Debug, Default)]
pub struct SimParticles {
    playing: Cell<bool>,
    plays: Cell<u32>,
}

impl SimParticles {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn play_count(&self) -> u32 {
        self.plays.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }
}

impl ParticleEmitter for SimParticles {
    fn stop_and_clear(&self) {
        self.playing.set(false);
    }

    fn play(&self) {
        self.playing.set(true);
        self.plays.set(self.plays.get() + 1);
    }
}

/// 内存音源
#[derive(Debug, Default)]
pub struct SimAudio {
    playing: Cell<bool>,
    plays: Cell<u32>,
    stops: Cell<u32>,
    one_shots: RefCell<Vec<f32>>,
}

impl SimAudio {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn play_count(&self) -> u32 {
        self.plays.get()
    }

    pub fn stop_count(&self) -> u32 {
        self.stops.get()
    }

    /// 每次单次播放的音量
    pub fn one_shot_volumes(&self) -> Vec<f32> {
        self.one_shots.borrow().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }
}

impl AudioCue for SimAudio {
    fn play(&self) {
        self.playing.set(true);
        self.plays.set(self.plays.get() + 1);
    }

    fn play_one_shot(&self, volume: f32) {
        self.one_shots.borrow_mut().push(volume);
    }

    fn stop(&self) {
        self.playing.set(false);
        self.stops.set(self.stops.get() + 1);
    }
}

// ========== 界面与消息 ==========

/// 内存按钮
#[derive(Debug, Default)]
pub struct SimButton {
    visible: Cell<bool>,
    label: RefCell<String>,
}

impl SimButton {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn label(&self) -> String {
        self.label.borrow().clone()
    }
}

impl ButtonView for SimButton {
    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn set_label(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
    }
}

/// 内存消息桥，记录所有发出的消息
#[derive(Debug, Default)]
pub struct SimBridge {
    sent: RefCell<Vec<String>>,
}

impl SimBridge {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    /// 已发送消息的事件类型（无法解码的消息被跳过）
    pub fn events(&self) -> Vec<TargetEvent> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|payload| TargetMessage::from_payload(payload).ok())
            .map(|message| message.event_type)
            .collect()
    }
}

impl MessageBridge for SimBridge {
    fn send(&self, payload: &str) {
        info!(payload = %payload, "发送到消息桥");
        self.sent.borrow_mut().push(payload.to_string());
    }
}

// ========== 角色 ==========

/// 一个完整的模拟角色
///
/// 字段保留具体类型，方便检查调用记录；[`rig`](Self::rig) 把它们作为能力接口交给组件。
#[derive(Debug)]
pub struct SimCharacter {
    pub root: Rc<SimNode>,
    pub transform: Rc<SimTransform>,
    pub animator: Rc<SimAnimator>,
    pub appear_particles: Rc<SimParticles>,
    pub disappear_particles: Rc<SimParticles>,
    pub appear_sound: Rc<SimAudio>,
    pub pop_sfx: Rc<SimAudio>,
    pub disappear_sfx: Rc<SimAudio>,
    pub ragdoll_sfx: Rc<SimAudio>,
    pub bodies: Vec<Rc<SimBody>>,
    pub physics: Rc<SimPhysics>,
    pub button: Rc<SimButton>,
    pub bridge: Rc<SimBridge>,
}

impl SimCharacter {
    /// 创建角色，动画驱动中有 `state`（片段长度 `clip_length` 秒）
    pub fn new(state: &str, clip_length: f32) -> Self {
        let animator = SimAnimator::new("idle");
        animator.add_state(state, clip_length);

        // 骨盆、脊柱、头
        let bodies = [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.4, 0.0),
            Vec3::new(0.0, 1.7, 0.05),
        ]
        .into_iter()
        .map(|position| SimBody::new(Pose::new(position, Quat::IDENTITY)))
        .collect();

        Self {
            root: SimNode::new(true),
            transform: SimTransform::at(Vec3::ZERO),
            animator,
            appear_particles: SimParticles::new(),
            disappear_particles: SimParticles::new(),
            appear_sound: SimAudio::new(),
            pop_sfx: SimAudio::new(),
            disappear_sfx: SimAudio::new(),
            ragdoll_sfx: SimAudio::new(),
            bodies,
            physics: SimPhysics::new(Vec3::new(0.0, -9.81, 0.0)),
            button: SimButton::new(),
            bridge: SimBridge::new(),
        }
    }

    /// 以能力接口的形式交出所有对象
    pub fn rig(&self) -> CharacterRig {
        CharacterRig {
            root: Some(self.root.clone()),
            transform: Some(self.transform.clone()),
            animator: Some(self.animator.clone()),
            appear_particles: Some(self.appear_particles.clone()),
            disappear_particles: Some(self.disappear_particles.clone()),
            appear_sound: Some(self.appear_sound.clone()),
            pop_sfx: Some(self.pop_sfx.clone()),
            disappear_sfx: Some(self.disappear_sfx.clone()),
            ragdoll_sfx: Some(self.ragdoll_sfx.clone()),
            bodies: self
                .bodies
                .iter()
                .map(|body| body.clone() as Rc<dyn RigidBodyHandle>)
                .collect(),
            physics: Some(self.physics.clone()),
            button: Some(self.button.clone()),
            bridge: Some(self.bridge.clone()),
        }
    }

    /// 推进宿主侧的模拟（动画 + 物理）
    pub fn advance(&self, dt: f32) {
        self.animator.advance(dt);
        let gravity = self.physics.gravity();
        for body in &self.bodies {
            body.integrate(dt, gravity);
        }
    }

    /// 推进 `frames` 帧：先宿主模拟，再序列
    pub fn step(&self, sequence: &mut SequenceOrchestrator, dt: f32, frames: usize) {
        for _ in 0..frames {
            self.advance(dt);
            sequence.tick(dt);
        }
    }

    /// 推进 `frames` 帧：先宿主模拟，再交互协调器
    pub fn step_interaction(&self, interaction: &mut TargetInteraction, dt: f32, frames: usize) {
        for _ in 0..frames {
            self.advance(dt);
            interaction.tick(dt);
        }
    }
}
