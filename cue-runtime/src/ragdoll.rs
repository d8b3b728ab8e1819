//! # Ragdoll 模块
//!
//! 布娃娃打断：中止出场序列，把角色交给物理模拟，一段时间后恢复并隐藏角色。
//!
//! ## 状态转换
//!
//! ```text
//! Inactive ──activate()──► Active ──(隐藏倒计时)──► Restoring ──(反馈保持)──► Inactive
//!    ▲                       │                        │
//!    └────── cancel() ───────┴────────────────────────┘（立即恢复）
//! ```
//!
//! 重力是全局值：覆盖时记录原值，恢复时清除记录，保证每次激活只恢复一次。

use std::rc::Rc;

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::config::RagdollConfig;
use crate::delay::DelayedAction;
use crate::host::{AnimatorDriver, AudioCue, NodeActivation, PhysicsWorld, RigidBodyHandle};
use crate::math::Pose;
use crate::sequence::SequenceOrchestrator;

/// 布娃娃状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RagdollState {
    #[default]
    Inactive,
    /// 物理模拟中，等待隐藏
    Active,
    /// 消失反馈播放中，等待恢复
    Restoring,
}

/// 布娃娃事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagdollEvent {
    /// 自然结束：姿态已恢复，角色已隐藏
    Restored,
}

/// 倒计时到点后的下一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RagdollStep {
    Hide,
    Restore,
}

/// 布娃娃使用的宿主对象
#[derive(Default)]
pub struct RagdollParts {
    pub bodies: Vec<Rc<dyn RigidBodyHandle>>,
    pub animator: Option<Rc<dyn AnimatorDriver>>,
    pub physics: Option<Rc<dyn PhysicsWorld>>,
    /// 角色根节点，恢复后停用
    pub character: Option<Rc<dyn NodeActivation>>,
    pub sfx: Option<Rc<dyn AudioCue>>,
}

/// 布娃娃打断控制器
pub struct RagdollInterruptController {
    config: RagdollConfig,
    bodies: Vec<Rc<dyn RigidBodyHandle>>,
    animator: Option<Rc<dyn AnimatorDriver>>,
    physics: Option<Rc<dyn PhysicsWorld>>,
    character: Option<Rc<dyn NodeActivation>>,
    sfx: Option<Rc<dyn AudioCue>>,
    /// 静止姿态快照
    rest_pose: Vec<(Rc<dyn RigidBodyHandle>, Pose)>,
    /// 覆盖前的重力；`Some` 表示当前处于覆盖状态
    original_gravity: Option<Vec3>,
    timer: DelayedAction<RagdollStep>,
    /// 零延迟的下一步，留到下一次 `tick` 执行
    ready: Option<RagdollStep>,
    state: RagdollState,
}

impl std::fmt::Debug for RagdollInterruptController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagdollInterruptController")
            .field("state", &self.state)
            .field("bodies", &self.bodies.len())
            .field("captured", &self.rest_pose.len())
            .field("gravity_overridden", &self.original_gravity.is_some())
            .field("timer", &self.timer)
            .finish()
    }
}

impl RagdollInterruptController {
    /// 创建控制器
    ///
    /// 重复的刚体只保留一个。创建时记录静止姿态，并把所有刚体设为运动学。
    pub fn new(config: RagdollConfig, parts: RagdollParts) -> Self {
        let mut bodies: Vec<Rc<dyn RigidBodyHandle>> = Vec::with_capacity(parts.bodies.len());
        for body in parts.bodies {
            if !bodies.iter().any(|known| Rc::ptr_eq(known, &body)) {
                bodies.push(body);
            }
        }
        if bodies.is_empty() {
            warn!("没有布娃娃刚体，布娃娃只会中止序列");
        }
        if parts.physics.is_none() {
            debug!("没有物理世界，布娃娃不会覆盖重力");
        }

        let mut controller = Self {
            config,
            bodies,
            animator: parts.animator,
            physics: parts.physics,
            character: parts.character,
            sfx: parts.sfx,
            rest_pose: Vec::new(),
            original_gravity: None,
            timer: DelayedAction::new(),
            ready: None,
            state: RagdollState::Inactive,
        };
        controller.capture_pose();
        controller.restore_rest_pose();
        controller
    }

    /// 激活布娃娃
    ///
    /// 已经激活（包括恢复中）时不做任何事并返回 `false`。
    /// 序列总会先被中止，之后处于 `Idle`。
    pub fn activate(&mut self, sequence: &mut SequenceOrchestrator) -> bool {
        if self.state != RagdollState::Inactive {
            debug!(state = ?self.state, "布娃娃已激活，忽略");
            return false;
        }

        info!(bodies = self.bodies.len(), "激活布娃娃");
        sequence.stop_audio();
        sequence.stop();

        if self.rest_pose.is_empty() {
            self.capture_pose();
        }

        self.enable_simulation();
        self.apply_gravity();

        if let Some(sfx) = &self.sfx {
            sfx.stop();
            sfx.play_one_shot(self.config.volume);
        }

        self.transition(RagdollState::Active);
        self.ready = self.timer.schedule(self.config.hide_wait(), RagdollStep::Hide);
        true
    }

    /// 立即恢复，不等待倒计时
    ///
    /// 任何状态下都可调用。不会停用角色节点，也不产生事件。
    ///
    /// # 返回
    /// 调用前是否处于激活状态
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        if was_active {
            info!(state = ?self.state, "取消布娃娃");
        }

        self.timer.cancel();
        self.ready = None;
        self.restore_rest_pose();
        self.state = RagdollState::Inactive;
        was_active
    }

    /// 每帧推进
    pub fn tick(
        &mut self,
        dt: f32,
        sequence: &mut SequenceOrchestrator,
    ) -> Option<RagdollEvent> {
        let (mut step, overshoot) = match self.ready.take() {
            Some(step) => (step, 0.0),
            None => self.timer.tick_with_overshoot(dt)?,
        };

        loop {
            match step {
                RagdollStep::Hide => {
                    debug!(overshoot, "布娃娃隐藏倒计时结束，播放消失反馈");
                    sequence.play_ragdoll_disappear_fx();
                    self.transition(RagdollState::Restoring);

                    // 隐藏晚于到点的部分计入反馈保持时间
                    let hold = self.config.disappear_fx_duration - overshoot;
                    match self.timer.schedule(hold, RagdollStep::Restore) {
                        Some(next) => step = next,
                        None => return None,
                    }
                }
                RagdollStep::Restore => {
                    self.restore_rest_pose();
                    if let Some(character) = &self.character {
                        character.set_active(false);
                    }
                    self.transition(RagdollState::Inactive);
                    info!("布娃娃结束，角色已隐藏");
                    return Some(RagdollEvent::Restored);
                }
            }
        }
    }

    /// 恢复静止姿态
    ///
    /// 刚体设为运动学并清零速度，姿态写回快照，重新启用动画驱动，恢复重力。
    pub fn restore_rest_pose(&mut self) {
        for body in &self.bodies {
            body.reset_velocity();
            body.set_kinematic(true);
        }

        for (body, pose) in &self.rest_pose {
            body.set_local_pose(*pose);
        }

        if let Some(animator) = &self.animator {
            animator.set_enabled(true);
        }

        self.restore_gravity();
    }

    /// 重新记录所有刚体的当前姿态
    pub fn capture_pose(&mut self) {
        self.rest_pose = self
            .bodies
            .iter()
            .map(|body| (body.clone(), body.local_pose()))
            .collect();
        debug!(count = self.rest_pose.len(), "记录布娃娃静止姿态");
    }

    /// 恢复被覆盖的重力
    ///
    /// # 返回
    /// 是否确实恢复了（未覆盖时不做任何事）
    pub fn restore_gravity(&mut self) -> bool {
        let Some(original) = self.original_gravity.take() else {
            return false;
        };
        if let Some(physics) = &self.physics {
            physics.set_gravity(original);
            debug!(gravity = ?original, "恢复重力");
        }
        true
    }

    // ========== 查询 ==========

    pub fn state(&self) -> RagdollState {
        self.state
    }

    /// 是否处于激活状态（包括恢复中）
    pub fn is_active(&self) -> bool {
        self.state != RagdollState::Inactive
    }

    /// 去重后的刚体数量
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_gravity_overridden(&self) -> bool {
        self.original_gravity.is_some()
    }

    pub fn config(&self) -> &RagdollConfig {
        &self.config
    }

    // ========== 内部 ==========

    fn enable_simulation(&self) {
        if let Some(animator) = &self.animator {
            animator.set_enabled(false);
        }
        for body in &self.bodies {
            body.set_kinematic(false);
            body.set_detect_collisions(true);
        }
    }

    fn apply_gravity(&mut self) {
        let Some(physics) = &self.physics else {
            return;
        };
        if self.original_gravity.is_none() {
            self.original_gravity = Some(physics.gravity());
        }
        physics.set_gravity(self.config.gravity);
    }

    fn transition(&mut self, to: RagdollState) {
        debug!(from = ?self.state, to = ?to, "布娃娃状态切换");
        self.state = to;
    }
}

impl Drop for RagdollInterruptController {
    fn drop(&mut self) {
        self.restore_gravity();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::StageConfig;
    use crate::sequence::SequenceState;
    use crate::sim::SimCharacter;

    fn build(config: &StageConfig) -> (SimCharacter, SequenceOrchestrator, RagdollInterruptController) {
        let character = SimCharacter::new(&config.sequence.state_name, 2.0);
        let rig = character.rig();
        let sequence = rig.sequence(config);
        let ragdoll = rig.ragdoll(config);
        (character, sequence, ragdoll)
    }

    /// 推进到布娃娃结束，返回用掉的帧数
    fn run_until_restored(
        character: &SimCharacter,
        sequence: &mut SequenceOrchestrator,
        ragdoll: &mut RagdollInterruptController,
        dt: f32,
    ) -> Option<usize> {
        for frame in 1..=1000 {
            character.advance(dt);
            sequence.tick(dt);
            if ragdoll.tick(dt, sequence) == Some(RagdollEvent::Restored) {
                return Some(frame);
            }
        }
        None
    }

    #[test]
    fn test_construction_makes_bodies_kinematic() {
        let config = StageConfig::default();
        let (character, _sequence, ragdoll) = build(&config);

        assert!(character.bodies.iter().all(|body| body.is_kinematic()));
        assert_eq!(ragdoll.state(), RagdollState::Inactive);
        assert!(!ragdoll.is_gravity_overridden());
    }

    #[test]
    fn test_duplicate_bodies_are_captured_once() {
        let config = StageConfig::default();
        let character = SimCharacter::new(&config.sequence.state_name, 2.0);
        let mut rig = character.rig();
        let first = rig.bodies[0].clone();
        rig.bodies.push(first);

        let ragdoll = rig.ragdoll(&config);
        assert_eq!(rig.bodies.len(), 4);
        assert_eq!(ragdoll.body_count(), 3);
    }

    #[test]
    fn test_activate_stops_sequence() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);

        sequence.start();
        character.step(&mut sequence, 0.1, 2);
        assert_eq!(sequence.state(), SequenceState::WaitingAnimation);

        assert!(ragdoll.activate(&mut sequence));
        assert_eq!(sequence.state(), SequenceState::Idle);
        assert_eq!(ragdoll.state(), RagdollState::Active);
        assert!(!character.animator.is_enabled());
        assert!(character.bodies.iter().all(|body| !body.is_kinematic()));
        assert_eq!(character.physics.gravity(), config.ragdoll.gravity);
        assert_eq!(character.ragdoll_sfx.one_shot_volumes(), vec![1.0]);
        assert_eq!(character.ragdoll_sfx.stop_count(), 1);
    }

    #[test]
    fn test_activate_twice_is_noop() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);

        assert!(ragdoll.activate(&mut sequence));
        assert!(!ragdoll.activate(&mut sequence));
        assert_eq!(character.ragdoll_sfx.one_shot_volumes().len(), 1);
    }

    #[test]
    fn test_full_cycle_restores_pose_and_gravity() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);
        let before: Vec<Pose> = character.bodies.iter().map(|b| b.local_pose()).collect();
        let gravity_before = character.physics.gravity();

        ragdoll.activate(&mut sequence);
        character.advance(0.5);
        // 物理模拟确实改变了姿态
        assert_ne!(character.bodies[0].local_pose(), before[0]);

        let frames = run_until_restored(&character, &mut sequence, &mut ragdoll, 0.1);
        // 3 秒隐藏 + 0.5 秒反馈
        assert!(matches!(frames, Some(34..=36)));

        let after: Vec<Pose> = character.bodies.iter().map(|b| b.local_pose()).collect();
        assert_eq!(after, before);
        assert_eq!(character.physics.gravity(), gravity_before);
        assert!(character.animator.is_enabled());
        assert!(!character.root.is_active());
        assert_eq!(character.disappear_particles.play_count(), 1);
        assert_eq!(ragdoll.state(), RagdollState::Inactive);
    }

    #[test]
    fn test_full_cycle_lands_on_exact_frame_at_60_fps() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);

        ragdoll.activate(&mut sequence);
        let frames = run_until_restored(&character, &mut sequence, &mut ragdoll, 1.0 / 60.0);
        // (3 + 0.5) 秒 × 60
        assert_eq!(frames, Some(210));
    }

    #[test]
    fn test_hide_overshoot_shortens_feedback_hold() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);

        ragdoll.activate(&mut sequence);
        // 第 8 帧 (3.2 秒) 隐藏，超出的 0.2 秒计入 0.5 秒的保持，第 9 帧恢复
        let frames = run_until_restored(&character, &mut sequence, &mut ragdoll, 0.4);
        assert_eq!(frames, Some(9));
    }

    #[test]
    fn test_hide_wait_uses_longer_duration() {
        let mut config = StageConfig::default();
        config.ragdoll.hide_delay = 1.0;
        config.ragdoll.button_hide_seconds = 2.0;
        config.ragdoll.disappear_fx_duration = 0.0;
        let (character, mut sequence, mut ragdoll) = build(&config);

        ragdoll.activate(&mut sequence);
        let frames = run_until_restored(&character, &mut sequence, &mut ragdoll, 0.25);
        assert_eq!(frames, Some(8));
    }

    #[test]
    fn test_cancel_restores_immediately() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);
        let gravity_before = character.physics.gravity();

        ragdoll.activate(&mut sequence);
        character.advance(0.5);
        assert!(ragdoll.cancel());

        assert_eq!(ragdoll.state(), RagdollState::Inactive);
        assert_eq!(character.physics.gravity(), gravity_before);
        assert!(character.bodies.iter().all(|body| body.is_kinematic()));
        // 取消后不会再有事件
        assert_eq!(run_until_restored(&character, &mut sequence, &mut ragdoll, 0.5), None);
        assert_eq!(character.disappear_particles.play_count(), 0);
    }

    #[test]
    fn test_gravity_restored_exactly_once() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);

        ragdoll.activate(&mut sequence);
        assert!(ragdoll.restore_gravity());
        // 外部之后又改了重力，不应被再次覆盖
        character.physics.set_gravity(Vec3::new(0.0, -1.0, 0.0));
        assert!(!ragdoll.restore_gravity());

        ragdoll.cancel();
        assert_eq!(character.physics.gravity(), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_drop_restores_gravity() {
        let config = StageConfig::default();
        let (character, mut sequence, mut ragdoll) = build(&config);
        let gravity_before = character.physics.gravity();

        ragdoll.activate(&mut sequence);
        drop(ragdoll);
        assert_eq!(character.physics.gravity(), gravity_before);
    }
}
