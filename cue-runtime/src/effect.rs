//! # Effect 模块
//!
//! 出现/消失效果播放器。
//!
//! 一个效果 = 延迟 + 缩放补间 + 位移补间 + 粒子/音效反馈。
//! 延迟到点时：粒子先停止并清空再播放，音效播放，然后补间从 `from` 开始推进。
//! 反馈是“发出即不管”的，播放器不等待它们结束。

use std::rc::Rc;

use glam::Vec3;
use tracing::debug;

use crate::delay::DelayedAction;
use crate::easing::EasingFunction;
use crate::host::{AudioCue, NodeTransform, ParticleEmitter};
use crate::tween::{Tween, TweenSpec};

/// 效果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// 出现：构造时节点被放到起始（隐藏）姿态
    Appear,
    /// 消失：构造时不改动节点
    Disappear,
}

impl EffectKind {
    fn name(self) -> &'static str {
        match self {
            Self::Appear => "appear",
            Self::Disappear => "disappear",
        }
    }
}

/// 效果的运动参数
///
/// 位置偏移相对于节点的基准位置（挂接节点时记录的局部位置）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectMotion {
    pub from_scale: Vec3,
    pub to_scale: Vec3,
    pub scale_duration: f32,
    pub from_offset: Vec3,
    pub to_offset: Vec3,
    pub move_duration: f32,
    pub easing: EasingFunction,
}

impl EffectMotion {
    /// 不产生任何运动（只有粒子/音效的效果）
    pub fn still() -> Self {
        Self {
            from_scale: Vec3::ONE,
            to_scale: Vec3::ONE,
            scale_duration: 0.0,
            from_offset: Vec3::ZERO,
            to_offset: Vec3::ZERO,
            move_duration: 0.0,
            easing: EasingFunction::default(),
        }
    }

    fn scale_spec(&self) -> TweenSpec<Vec3> {
        TweenSpec::new(self.from_scale, self.to_scale, self.scale_duration)
            .with_easing(self.easing)
    }

    fn move_spec(&self, base: Vec3) -> TweenSpec<Vec3> {
        TweenSpec::new(base + self.from_offset, base + self.to_offset, self.move_duration)
            .with_easing(self.easing)
    }
}

/// 一次播放的运行状态
#[derive(Debug)]
struct EffectRun {
    /// 延迟倒计时
    pending: DelayedAction<()>,
    scale: Tween<Vec3>,
    position: Tween<Vec3>,
    /// 本次播放的反馈是否已经发出
    side_effects_fired: bool,
}

/// 效果播放器
pub struct EffectPlayer {
    kind: EffectKind,
    motion: EffectMotion,
    /// 默认延迟（秒）
    delay: f32,
    transform: Option<Rc<dyn NodeTransform>>,
    /// 挂接节点时记录的局部位置
    base_position: Vec3,
    particles: Option<Rc<dyn ParticleEmitter>>,
    audio: Vec<Rc<dyn AudioCue>>,
    run: EffectRun,
}

impl std::fmt::Debug for EffectPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectPlayer")
            .field("kind", &self.kind)
            .field("delay", &self.delay)
            .field("has_transform", &self.transform.is_some())
            .field("has_particles", &self.particles.is_some())
            .field("audio", &self.audio.len())
            .field("run", &self.run)
            .finish()
    }
}

impl EffectPlayer {
    /// 创建效果播放器（尚未挂接任何宿主对象）
    pub fn new(kind: EffectKind, motion: EffectMotion, delay: f32) -> Self {
        let run = EffectRun {
            pending: DelayedAction::new(),
            scale: Tween::new(motion.scale_spec()),
            position: Tween::new(motion.move_spec(Vec3::ZERO)),
            side_effects_fired: false,
        };
        Self {
            kind,
            motion,
            delay,
            transform: None,
            base_position: Vec3::ZERO,
            particles: None,
            audio: Vec::new(),
            run,
        }
    }

    /// 挂接目标节点
    ///
    /// 记录节点当前局部位置作为基准；出现效果会立即把节点放到起始姿态。
    pub fn with_transform(mut self, transform: Rc<dyn NodeTransform>) -> Self {
        self.base_position = transform.local_position();
        self.run.position = Tween::new(self.motion.move_spec(self.base_position));
        self.transform = Some(transform);
        if self.kind == EffectKind::Appear {
            self.reset_to_start();
        }
        self
    }

    /// 挂接粒子系统（初始为停止并清空状态）
    pub fn with_particles(mut self, particles: Rc<dyn ParticleEmitter>) -> Self {
        particles.stop_and_clear();
        self.particles = Some(particles);
        self
    }

    /// 追加一个音源
    pub fn with_audio(mut self, audio: Rc<dyn AudioCue>) -> Self {
        self.audio.push(audio);
        self
    }

    // ========== 播放控制 ==========

    /// 按默认延迟播放
    pub fn play_with_delay(&mut self) {
        self.play_with_custom_delay(self.delay);
    }

    /// 立即播放
    pub fn play_immediate(&mut self) {
        self.play_with_custom_delay(0.0);
    }

    /// 按指定延迟播放
    ///
    /// 之前未触发的延迟和进行中的补间都会被取消。
    pub fn play_with_custom_delay(&mut self, delay: f32) {
        self.run.scale.cancel();
        self.run.position.cancel();
        self.run.side_effects_fired = false;

        debug!(effect = self.kind.name(), delay = delay, "播放效果");
        if self.run.pending.schedule(delay, ()).is_some() {
            self.fire();
        }
    }

    /// 只发出粒子/音效反馈，不触碰补间和延迟
    pub fn burst(&mut self) {
        self.emit_feedback();
    }

    /// 取消延迟和补间，保留当前值
    pub fn stop(&mut self) {
        self.run.pending.cancel();
        self.run.scale.cancel();
        self.run.position.cancel();
    }

    /// 停止粒子和音效
    pub fn stop_feedback(&mut self) {
        if let Some(particles) = &self.particles {
            particles.stop_and_clear();
        }
        for audio in &self.audio {
            audio.stop();
        }
    }

    /// 回到起始姿态并清除待触发状态
    pub fn reset_to_start(&mut self) {
        self.run.pending.cancel();
        self.run.scale.reset();
        self.run.position.reset();
        self.write_values();
    }

    /// 落到结束姿态并清除待触发状态
    pub fn reset_to_end(&mut self) {
        self.run.pending.cancel();
        self.run.scale.finish();
        self.run.position.finish();
        self.write_values();
    }

    /// 每帧推进
    pub fn tick(&mut self, dt: f32) {
        if self.run.pending.tick(dt).is_some() {
            // 补间从下一帧开始推进
            self.fire();
            return;
        }

        let scale_running = self.run.scale.is_running();
        let position_running = self.run.position.is_running();
        if !scale_running && !position_running {
            return;
        }

        self.run.scale.advance(dt);
        self.run.position.advance(dt);

        // 只写回本帧确实在推进的补间，避免覆盖其他效果对同一节点的写入
        if let Some(transform) = &self.transform {
            if scale_running {
                transform.set_local_scale(self.run.scale.value());
            }
            if position_running {
                transform.set_local_position(self.run.position.value());
            }
        }
    }

    // ========== 查询 ==========

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// 是否有待触发的延迟
    pub fn is_pending(&self) -> bool {
        self.run.pending.is_pending()
    }

    /// 是否有补间在推进
    pub fn is_animating(&self) -> bool {
        self.run.scale.is_running() || self.run.position.is_running()
    }

    /// 本次播放的反馈是否已经发出
    pub fn has_fired(&self) -> bool {
        self.run.side_effects_fired
    }

    pub fn current_scale(&self) -> Vec3 {
        self.run.scale.value()
    }

    pub fn current_position(&self) -> Vec3 {
        self.run.position.value()
    }

    // ========== 内部 ==========

    fn fire(&mut self) {
        self.emit_feedback();
        self.run.side_effects_fired = true;

        self.run.scale.restart();
        self.run.position.restart();
        self.write_values();
    }

    fn emit_feedback(&self) {
        if let Some(particles) = &self.particles {
            particles.stop_and_clear();
            particles.play();
        }
        for audio in &self.audio {
            audio.play();
        }
    }

    fn write_values(&self) {
        if let Some(transform) = &self.transform {
            transform.set_local_scale(self.run.scale.value());
            transform.set_local_position(self.run.position.value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimAudio, SimParticles, SimTransform};

    fn appear_motion() -> EffectMotion {
        EffectMotion {
            from_scale: Vec3::splat(0.01),
            to_scale: Vec3::ONE,
            scale_duration: 0.5,
            from_offset: Vec3::new(0.0, -1.0, 0.0),
            to_offset: Vec3::ZERO,
            move_duration: 1.0,
            easing: EasingFunction::Linear,
        }
    }

    fn disappear_motion() -> EffectMotion {
        EffectMotion {
            from_scale: Vec3::ONE,
            to_scale: Vec3::splat(0.01),
            scale_duration: 0.5,
            from_offset: Vec3::ZERO,
            to_offset: Vec3::new(0.0, -1.0, 0.0),
            move_duration: 0.5,
            easing: EasingFunction::Linear,
        }
    }

    #[test]
    fn test_appear_snaps_to_start_on_attach() {
        let node = SimTransform::at(Vec3::new(0.0, 2.0, 0.0));
        let _player = EffectPlayer::new(EffectKind::Appear, appear_motion(), 0.0)
            .with_transform(node.clone());

        assert_eq!(node.local_scale(), Vec3::splat(0.01));
        assert_eq!(node.local_position(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_disappear_leaves_node_on_attach() {
        let node = SimTransform::at(Vec3::new(0.0, 2.0, 0.0));
        let _player = EffectPlayer::new(EffectKind::Disappear, disappear_motion(), 2.0)
            .with_transform(node.clone());

        assert_eq!(node.local_scale(), Vec3::ONE);
        assert_eq!(node.local_position(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_play_immediate_runs_to_end() {
        let node = SimTransform::at(Vec3::ZERO);
        let particles = SimParticles::new();
        let sound = SimAudio::new();
        let mut player = EffectPlayer::new(EffectKind::Appear, appear_motion(), 0.0)
            .with_transform(node.clone())
            .with_particles(particles.clone())
            .with_audio(sound.clone());

        player.play_immediate();
        assert!(player.has_fired());
        assert_eq!(particles.play_count(), 1);
        assert_eq!(sound.play_count(), 1);

        player.tick(0.25);
        let half = node.local_scale();
        assert!(half.x > 0.01 && half.x < 1.0);

        for _ in 0..4 {
            player.tick(0.25);
        }
        assert_eq!(node.local_scale(), Vec3::ONE);
        assert_eq!(node.local_position(), Vec3::ZERO);
        assert!(!player.is_animating());
    }

    #[test]
    fn test_delayed_play_fires_once() {
        let particles = SimParticles::new();
        let mut player = EffectPlayer::new(EffectKind::Disappear, disappear_motion(), 1.0)
            .with_particles(particles.clone());

        player.play_with_delay();
        assert!(player.is_pending());
        assert!(!player.has_fired());

        player.tick(0.5);
        assert_eq!(particles.play_count(), 0);
        player.tick(0.5);
        assert_eq!(particles.play_count(), 1);
        assert!(player.has_fired());

        // 补间结束后不会再触发
        for _ in 0..10 {
            player.tick(0.5);
        }
        assert_eq!(particles.play_count(), 1);
    }

    #[test]
    fn test_stop_cancels_pending_and_freezes() {
        let node = SimTransform::at(Vec3::ZERO);
        let particles = SimParticles::new();
        let mut player = EffectPlayer::new(EffectKind::Disappear, disappear_motion(), 0.5)
            .with_transform(node.clone())
            .with_particles(particles.clone());

        player.play_with_delay();
        player.stop();
        player.tick(1.0);
        assert_eq!(particles.play_count(), 0);
        assert!(!player.is_pending());

        player.play_immediate();
        player.tick(0.25);
        let frozen = node.local_scale();
        player.stop();
        player.tick(0.25);
        assert_eq!(node.local_scale(), frozen);
    }

    #[test]
    fn test_reset_extremes() {
        let node = SimTransform::at(Vec3::ZERO);
        let mut player = EffectPlayer::new(EffectKind::Disappear, disappear_motion(), 0.0)
            .with_transform(node.clone());

        player.play_immediate();
        player.tick(0.25);

        player.reset_to_end();
        assert_eq!(node.local_scale(), Vec3::splat(0.01));
        assert_eq!(node.local_position(), Vec3::new(0.0, -1.0, 0.0));

        player.reset_to_start();
        assert_eq!(node.local_scale(), Vec3::ONE);
        assert_eq!(node.local_position(), Vec3::ZERO);
        assert!(!player.is_animating());
    }

    #[test]
    fn test_finished_effect_does_not_overwrite_node() {
        let node = SimTransform::at(Vec3::ZERO);
        let mut player = EffectPlayer::new(EffectKind::Appear, appear_motion(), 0.0)
            .with_transform(node.clone());

        player.play_immediate();
        for _ in 0..8 {
            player.tick(0.25);
        }
        // 其他效果写入同一节点
        node.set_local_scale(Vec3::splat(3.0));
        player.tick(0.25);
        assert_eq!(node.local_scale(), Vec3::splat(3.0));
    }

    #[test]
    fn test_burst_and_stop_feedback() {
        let particles = SimParticles::new();
        let sound = SimAudio::new();
        let mut player = EffectPlayer::new(EffectKind::Disappear, EffectMotion::still(), 2.0)
            .with_particles(particles.clone())
            .with_audio(sound.clone());

        player.burst();
        assert_eq!(particles.play_count(), 1);
        assert_eq!(sound.play_count(), 1);
        assert!(!player.is_pending());

        player.stop_feedback();
        assert!(!particles.is_playing());
        assert!(!sound.is_playing());
    }
}
