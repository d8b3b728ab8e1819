//! # Interaction 模块
//!
//! 识别目标上的交互协调：追踪状态、播放按钮、对外消息。
//!
//! ## 点击路由
//!
//! - 未追踪：忽略
//! - 序列进行中或布娃娃激活中：按“停止”处理，激活布娃娃
//! - 其他：开始序列
//!
//! 序列完成后角色再保持可见一小段时间（让消失反馈播完），然后隐藏。
//! 这段保持会被新的开始、布娃娃或丢失追踪取消。

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::InteractionConfig;
use crate::delay::DelayedAction;
use crate::host::{ButtonView, MessageBridge, NodeActivation};
use crate::message::{TargetEvent, TargetMessage};
use crate::ragdoll::{RagdollEvent, RagdollInterruptController};
use crate::sequence::{ListenerId, SequenceOrchestrator};

/// 目标追踪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    Tracked,
    /// 目标离开视野，但位置仍被推算
    ExtendedTracked,
    Limited,
    NoPose,
}

impl TrackingStatus {
    pub fn is_tracked(self) -> bool {
        matches!(self, Self::Tracked | Self::ExtendedTracked)
    }
}

/// 交互使用的宿主对象
#[derive(Default)]
pub struct InteractionParts {
    pub character: Option<Rc<dyn NodeActivation>>,
    pub button: Option<Rc<dyn ButtonView>>,
    pub bridge: Option<Rc<dyn MessageBridge>>,
}

/// 识别目标交互协调器
pub struct TargetInteraction {
    config: InteractionConfig,
    sequence: SequenceOrchestrator,
    ragdoll: RagdollInterruptController,
    character: Option<Rc<dyn NodeActivation>>,
    button: Option<Rc<dyn ButtonView>>,
    bridge: Option<Rc<dyn MessageBridge>>,
    tracked: bool,
    /// 本次追踪是否已发送过识别消息
    recognized_sent: bool,
    /// 序列完成标记（由完成监听者写入）
    finished: Rc<Cell<bool>>,
    listener: ListenerId,
    finish_hold: DelayedAction<()>,
}

impl std::fmt::Debug for TargetInteraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetInteraction")
            .field("tracked", &self.tracked)
            .field("recognized_sent", &self.recognized_sent)
            .field("sequence", &self.sequence.state())
            .field("ragdoll", &self.ragdoll.state())
            .field("finish_hold", &self.finish_hold)
            .finish()
    }
}

impl TargetInteraction {
    /// 创建协调器
    ///
    /// 按钮初始隐藏，文字为播放。
    pub fn new(
        config: InteractionConfig,
        mut sequence: SequenceOrchestrator,
        ragdoll: RagdollInterruptController,
        parts: InteractionParts,
    ) -> Self {
        if parts.button.is_none() {
            warn!("没有播放按钮，只能通过代码触发");
        }

        let finished = Rc::new(Cell::new(false));
        let flag = finished.clone();
        let listener = sequence.add_finished_listener(move |_| flag.set(true));

        let interaction = Self {
            config,
            sequence,
            ragdoll,
            character: parts.character,
            button: parts.button,
            bridge: parts.bridge,
            tracked: false,
            recognized_sent: false,
            finished,
            listener,
            finish_hold: DelayedAction::new(),
        };

        if let Some(button) = &interaction.button {
            button.set_visible(false);
        }
        interaction.set_label(&interaction.config.play_label);
        interaction
    }

    /// 追踪状态变化
    pub fn on_target_status(&mut self, status: TrackingStatus) {
        self.tracked = status.is_tracked();
        debug!(status = ?status, tracked = self.tracked, "目标追踪状态变化");

        if self.tracked {
            self.show_button_if_tracked();
            if self.config.send_on_recognized && !self.recognized_sent {
                self.send(TargetEvent::Recognized);
                self.recognized_sent = true;
            }
        } else {
            self.reset_character();
            self.show_button_if_tracked();
            self.recognized_sent = false;
        }
    }

    /// 按钮点击
    pub fn on_button_clicked(&mut self) {
        if !self.tracked {
            debug!("目标未追踪，忽略点击");
            return;
        }

        if self.ragdoll.is_active() || self.sequence.is_playing() {
            self.start_ragdoll();
        } else {
            self.start_sequence();
        }
    }

    /// 每帧推进
    pub fn tick(&mut self, dt: f32) {
        if self.finish_hold.tick(dt).is_some() {
            self.complete_finish_hold();
        }

        // 保持阶段从下一帧开始计时
        self.sequence.tick(dt);
        if self.finished.replace(false) {
            self.on_sequence_finished();
        }

        if let Some(RagdollEvent::Restored) = self.ragdoll.tick(dt, &mut self.sequence) {
            self.show_button_if_tracked();
        }
    }

    // ========== 查询 ==========

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// 是否处于序列完成后的保持阶段
    pub fn is_holding(&self) -> bool {
        self.finish_hold.is_pending()
    }

    pub fn sequence(&self) -> &SequenceOrchestrator {
        &self.sequence
    }

    pub fn ragdoll(&self) -> &RagdollInterruptController {
        &self.ragdoll
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    // ========== 内部 ==========

    fn start_sequence(&mut self) {
        info!("开始播放");
        self.finish_hold.cancel();
        self.finished.set(false);
        self.ragdoll.cancel();

        if let Some(character) = &self.character {
            character.set_active(true);
        }
        self.sequence.stop();
        self.sequence.start();

        self.set_label(&self.config.stop_label);
        if self.config.send_on_listen_click {
            self.send(TargetEvent::Listen);
        }
    }

    fn start_ragdoll(&mut self) {
        if self.ragdoll.is_active() {
            debug!("布娃娃进行中，忽略点击");
            return;
        }

        self.finish_hold.cancel();
        self.finished.set(false);
        self.set_label(&self.config.play_label);
        self.ragdoll.activate(&mut self.sequence);
        if let Some(button) = &self.button {
            button.set_visible(false);
        }
    }

    fn on_sequence_finished(&mut self) {
        debug!(hold = self.config.sequence_disappear_fx_duration, "序列完成，保持角色可见");
        if self
            .finish_hold
            .schedule(self.config.sequence_disappear_fx_duration, ())
            .is_some()
        {
            self.complete_finish_hold();
        }
    }

    fn complete_finish_hold(&mut self) {
        if let Some(character) = &self.character {
            character.set_active(false);
        }
        self.set_label(&self.config.play_label);
        self.show_button_if_tracked();
    }

    /// 丢失追踪时的完整重置
    fn reset_character(&mut self) {
        self.finish_hold.cancel();
        self.finished.set(false);
        self.ragdoll.cancel();
        self.sequence.stop();

        if let Some(character) = &self.character {
            character.set_active(false);
        }
        self.set_label(&self.config.play_label);
    }

    fn show_button_if_tracked(&self) {
        if let Some(button) = &self.button {
            button.set_visible(self.tracked);
        }
    }

    fn set_label(&self, label: &str) {
        if let Some(button) = &self.button {
            button.set_label(label);
        }
    }

    fn send(&self, event: TargetEvent) {
        let Some(bridge) = &self.bridge else {
            debug!(event = ?event, "没有消息桥，跳过发送");
            return;
        };

        let message = TargetMessage::new(self.config.target_id, &self.config.target_name, event);
        match message.to_payload() {
            Ok(payload) => {
                debug!(payload = %payload, "发送目标消息");
                bridge.send(&payload);
            }
            Err(e) => warn!(error = %e, "目标消息编码失败"),
        }
    }
}

impl Drop for TargetInteraction {
    fn drop(&mut self) {
        self.sequence.remove_finished_listener(self.listener);
        self.ragdoll.restore_gravity();
    }
}
