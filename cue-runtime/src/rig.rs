//! # Rig 模块
//!
//! 角色的宿主对象清单，以及由清单组装各个组件。
//!
//! 宿主只需要把自己有的对象填进 [`CharacterRig`]，缺少的保持 `None`，
//! 组件在构造时一次性确定哪些协作者存在。

use std::rc::Rc;

use crate::config::StageConfig;
use crate::effect::{EffectKind, EffectMotion, EffectPlayer};
use crate::host::{
    AnimatorDriver, AudioCue, ButtonView, MessageBridge, NodeActivation, NodeTransform,
    ParticleEmitter, PhysicsWorld, RigidBodyHandle,
};
use crate::interaction::{InteractionParts, TargetInteraction};
use crate::ragdoll::{RagdollInterruptController, RagdollParts};
use crate::sequence::{SequenceOrchestrator, SequenceParts};

/// 角色宿主对象清单
#[derive(Default, Clone)]
pub struct CharacterRig {
    /// 角色根节点（整体显示/隐藏）
    pub root: Option<Rc<dyn NodeActivation>>,
    /// 出现/消失效果写入的节点
    pub transform: Option<Rc<dyn NodeTransform>>,
    pub animator: Option<Rc<dyn AnimatorDriver>>,
    pub appear_particles: Option<Rc<dyn ParticleEmitter>>,
    pub disappear_particles: Option<Rc<dyn ParticleEmitter>>,
    pub appear_sound: Option<Rc<dyn AudioCue>>,
    pub pop_sfx: Option<Rc<dyn AudioCue>>,
    pub disappear_sfx: Option<Rc<dyn AudioCue>>,
    pub ragdoll_sfx: Option<Rc<dyn AudioCue>>,
    pub bodies: Vec<Rc<dyn RigidBodyHandle>>,
    pub physics: Option<Rc<dyn PhysicsWorld>>,
    pub button: Option<Rc<dyn ButtonView>>,
    pub bridge: Option<Rc<dyn MessageBridge>>,
}

impl CharacterRig {
    /// 组装出场序列
    pub fn sequence(&self, config: &StageConfig) -> SequenceOrchestrator {
        // 消失效果先挂接，记录的基准位置不受出现效果起始偏移影响
        let mut disappear = EffectPlayer::new(
            EffectKind::Disappear,
            config.disappear.motion(),
            config.disappear.delay,
        );
        if let Some(transform) = &self.transform {
            disappear = disappear.with_transform(transform.clone());
        }
        if let Some(particles) = &self.disappear_particles {
            disappear = disappear.with_particles(particles.clone());
        }
        if let Some(sfx) = &self.disappear_sfx {
            disappear = disappear.with_audio(sfx.clone());
        }

        let mut appear = EffectPlayer::new(EffectKind::Appear, config.appear.motion(), 0.0);
        if let Some(transform) = &self.transform {
            appear = appear.with_transform(transform.clone());
        }
        if let Some(sound) = &self.appear_sound {
            appear = appear.with_audio(sound.clone());
        }

        let mut appear_burst = EffectPlayer::new(
            EffectKind::Appear,
            EffectMotion::still(),
            config.appear.burst_delay,
        );
        if let Some(particles) = &self.appear_particles {
            appear_burst = appear_burst.with_particles(particles.clone());
        }

        SequenceOrchestrator::new(
            config.sequence.clone(),
            SequenceParts {
                appear,
                appear_burst,
                disappear,
                animator: self.animator.clone(),
                pop_sfx: self.pop_sfx.clone(),
            },
        )
    }

    /// 组装布娃娃控制器
    pub fn ragdoll(&self, config: &StageConfig) -> RagdollInterruptController {
        RagdollInterruptController::new(
            config.ragdoll.clone(),
            RagdollParts {
                bodies: self.bodies.clone(),
                animator: self.animator.clone(),
                physics: self.physics.clone(),
                character: self.root.clone(),
                sfx: self.ragdoll_sfx.clone(),
            },
        )
    }

    /// 组装完整的交互协调器
    pub fn interaction(&self, config: &StageConfig) -> TargetInteraction {
        TargetInteraction::new(
            config.interaction.clone(),
            self.sequence(config),
            self.ragdoll(config),
            InteractionParts {
                character: self.root.clone(),
                button: self.button.clone(),
                bridge: self.bridge.clone(),
            },
        )
    }
}
