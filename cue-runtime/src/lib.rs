//! # Cue Runtime
//!
//! AR 角色出场的时序编排核心库。
//!
//! ## 架构概述
//!
//! `cue-runtime` 是纯逻辑核心，不做渲染、物理模拟或目标追踪。
//! 它通过 **能力接口** 读写宿主对象，并由宿主每帧驱动：
//!
//! ```text
//! Host                                Runtime
//!   │                                    │
//!   │──── on_target_status / click ────►│
//!   │                                    │
//!   │──── tick(dt) ────────────────────►│ 补间 / 延迟 / 动画等待 / 布娃娃
//!   │◄─── NodeTransform / AudioCue ... ──│
//!   │                                    │
//! ```
//!
//! 所有等待都是显式状态机，每帧推进一次，取消在下一帧生效。单线程，无锁。
//!
//! ## 核心类型
//!
//! - [`Tween`] / [`DelayedAction`]：时间原语
//! - [`EffectPlayer`]：出现/消失效果（延迟 + 补间 + 粒子/音效）
//! - [`AnimationWaiter`]：等待动画状态播放完一轮
//! - [`SequenceOrchestrator`]：出现 → 等待动画 → 消失
//! - [`RagdollInterruptController`]：布娃娃打断与恢复
//! - [`TargetInteraction`]：追踪状态、按钮、对外消息
//!
//! ## 使用示例
//!
//! ```ignore
//! use cue_runtime::{StageConfig, TrackingStatus};
//!
//! let config = StageConfig::load("stage.json");
//! let mut interaction = rig.interaction(&config);
//!
//! interaction.on_target_status(TrackingStatus::Tracked);
//! interaction.on_button_clicked();
//!
//! // 主循环
//! loop {
//!     interaction.tick(dt);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`host`]：宿主能力接口
//! - `sim`：能力接口的内存实现（`sim` feature）
//! - [`config`]：舞台配置
//! - [`error`]：错误类型定义

pub mod anim_wait;
pub mod config;
pub mod delay;
pub mod easing;
pub mod effect;
pub mod error;
pub mod host;
pub mod interaction;
pub mod math;
pub mod message;
pub mod ragdoll;
pub mod rig;
pub mod sequence;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod tween;

// 重导出核心类型
pub use anim_wait::{AnimationWaiter, WaitOutcome, WaitPhase, WaitPoll};
pub use config::{
    AppearConfig, DisappearConfig, InteractionConfig, RagdollConfig, SequenceConfig, StageConfig,
};
pub use delay::DelayedAction;
pub use easing::EasingFunction;
pub use effect::{EffectKind, EffectMotion, EffectPlayer};
pub use error::{ConfigError, CueError, CueResult, WaitError};
pub use host::{
    AnimatorDriver, AnimatorStateInfo, AudioCue, ButtonView, MessageBridge, NodeActivation,
    NodeTransform, ParticleEmitter, PhysicsWorld, RigidBodyHandle,
};
pub use interaction::{InteractionParts, TargetInteraction, TrackingStatus};
pub use math::{Lerp, Pose};
pub use message::{TargetEvent, TargetMessage};
pub use ragdoll::{RagdollEvent, RagdollInterruptController, RagdollParts, RagdollState};
pub use rig::CharacterRig;
pub use sequence::{
    ListenerId, SequenceFinished, SequenceOrchestrator, SequenceParts, SequenceState,
};
pub use tween::{Tween, TweenSpec, TweenState};
