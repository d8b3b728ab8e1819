//! # Sequence 模块
//!
//! 角色出场序列的状态机：出现 → 等待动画 → 消失。
//!
//! ## 状态转换
//!
//! ```text
//! Idle ──start()──► Appearing ──► WaitingAnimation ──(等待结束)──► Disappearing ──► Idle
//!   ▲                                   │
//!   └────────────── stop() ─────────────┘（任意状态）
//! ```
//!
//! 出现效果和消失效果都在各自的计时器上运行，编排器不等待它们结束：
//! 动画等待一结束，序列即视为完成，立即回到 `Idle` 并通知监听者。

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::anim_wait::{AnimationWaiter, WaitOutcome, WaitPoll, report_wait_error};
use crate::config::SequenceConfig;
use crate::effect::EffectPlayer;
use crate::error::WaitError;
use crate::host::{AnimatorDriver, AudioCue};

/// 序列状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    #[default]
    Idle,
    Appearing,
    WaitingAnimation,
    Disappearing,
}

/// 序列完成通知
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFinished {
    /// 动画等待的结果；等待无法开始时为错误
    pub animation: Result<WaitOutcome, WaitError>,
}

/// 完成监听者标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type FinishedListener = Box<dyn FnMut(&SequenceFinished)>;

/// 序列使用的效果与协作者
pub struct SequenceParts {
    /// 出现效果（缩放/位移 + 出现音效）
    pub appear: EffectPlayer,
    /// 出现时延迟播放的粒子
    pub appear_burst: EffectPlayer,
    /// 消失效果（缩放/位移 + 粒子 + 音效）
    pub disappear: EffectPlayer,
    pub animator: Option<Rc<dyn AnimatorDriver>>,
    /// 出现时的“啵”音效，布娃娃消失时也会用到
    pub pop_sfx: Option<Rc<dyn AudioCue>>,
}

/// 序列编排器
pub struct SequenceOrchestrator {
    config: SequenceConfig,
    appear: EffectPlayer,
    appear_burst: EffectPlayer,
    disappear: EffectPlayer,
    animator: Option<Rc<dyn AnimatorDriver>>,
    pop_sfx: Option<Rc<dyn AudioCue>>,
    waiter: AnimationWaiter,
    state: SequenceState,
    listeners: Vec<(ListenerId, FinishedListener)>,
    next_listener_id: u64,
}

impl std::fmt::Debug for SequenceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceOrchestrator")
            .field("state", &self.state)
            .field("waiter", &self.waiter)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SequenceOrchestrator {
    pub fn new(config: SequenceConfig, parts: SequenceParts) -> Self {
        if parts.animator.is_none() {
            warn!("序列没有动画驱动，动画等待将被跳过");
        }

        Self {
            config,
            appear: parts.appear,
            appear_burst: parts.appear_burst,
            disappear: parts.disappear,
            animator: parts.animator,
            pop_sfx: parts.pop_sfx,
            waiter: AnimationWaiter::new(),
            state: SequenceState::Idle,
            listeners: Vec::new(),
            next_listener_id: 1,
        }
    }

    // ========== 监听者 ==========

    /// 注册完成监听者
    pub fn add_finished_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SequenceFinished) + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// 注销完成监听者
    pub fn remove_finished_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========== 序列控制 ==========

    /// 开始序列
    ///
    /// 非 `Idle` 时不做任何事并返回 `false`。
    pub fn start(&mut self) -> bool {
        if self.state != SequenceState::Idle {
            debug!(state = ?self.state, "序列正在进行，忽略 start");
            return false;
        }

        info!(state = %self.config.state_name, "开始角色序列");
        self.transition(SequenceState::Appearing);

        self.appear.play_immediate();
        self.appear_burst.play_with_delay();
        if let Some(pop) = &self.pop_sfx {
            pop.play();
        }

        // 倒计时模式：消失效果从现在开始按自己的延迟计时
        if !self.config.disappear_after_animation {
            self.disappear.play_with_delay();
        }

        self.transition(SequenceState::WaitingAnimation);
        let result = self.waiter.wait_for_state(
            self.animator.as_ref(),
            &self.config.state_name,
            self.config.cross_fade_duration,
            self.config.max_animation_wait_seconds,
        );
        if let Err(err) = result {
            report_wait_error(&err);
            self.finish(Err(err));
        }

        true
    }

    /// 中止序列并硬重置
    ///
    /// 任何状态下都可调用，重复调用结果相同。不会通知完成监听者。
    pub fn stop(&mut self) {
        if self.state != SequenceState::Idle {
            info!(state = ?self.state, "中止角色序列");
        }

        self.waiter.cancel();
        self.appear_burst.stop();

        // 两个效果可能写同一个节点，出现效果最后写，节点停在隐藏姿态
        self.disappear.reset_to_start();
        self.appear.reset_to_start();

        self.appear_burst.stop_feedback();
        self.disappear.stop_feedback();
        self.stop_audio();

        self.state = SequenceState::Idle;
    }

    /// 每帧推进
    pub fn tick(&mut self, dt: f32) {
        self.appear.tick(dt);
        self.appear_burst.tick(dt);
        self.disappear.tick(dt);

        if self.state == SequenceState::WaitingAnimation
            && let WaitPoll::Done(outcome) = self.waiter.poll(dt)
        {
            self.finish(Ok(outcome));
        }
    }

    /// 停止出现音效
    pub fn stop_audio(&mut self) {
        self.appear.stop_feedback();
        if let Some(pop) = &self.pop_sfx {
            pop.stop();
        }
    }

    /// 布娃娃隐藏时的消失反馈（只有粒子和音效，没有缩放）
    pub fn play_ragdoll_disappear_fx(&mut self) {
        self.disappear.burst();
        if let Some(pop) = &self.pop_sfx {
            pop.play();
        }
    }

    // ========== 查询 ==========

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != SequenceState::Idle
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn appear(&self) -> &EffectPlayer {
        &self.appear
    }

    pub fn appear_burst(&self) -> &EffectPlayer {
        &self.appear_burst
    }

    pub fn disappear(&self) -> &EffectPlayer {
        &self.disappear
    }

    pub fn waiter(&self) -> &AnimationWaiter {
        &self.waiter
    }

    // ========== 内部 ==========

    fn finish(&mut self, animation: Result<WaitOutcome, WaitError>) {
        if self.config.disappear_after_animation {
            self.disappear.play_immediate();
        }
        self.transition(SequenceState::Disappearing);
        self.transition(SequenceState::Idle);

        let finished = SequenceFinished { animation };
        info!(result = ?finished.animation, "角色序列完成");
        for (_, listener) in &mut self.listeners {
            listener(&finished);
        }
    }

    fn transition(&mut self, to: SequenceState) {
        debug!(from = ?self.state, to = ?to, "序列状态切换");
        self.state = to;
    }
}
