//! # Animation Wait 模块
//!
//! 请求宿主动画驱动切换到指定状态，并在每帧轮询直到该状态播放完一轮。
//!
//! ## 两阶段等待
//!
//! ```text
//! Entering ──(当前状态 == 目标)──► Playing ──(进度 >= 1)──► Completed
//!    │                               │
//!    └──(超时，继续下一阶段)──────────┘──(超时)──► TimedOut
//! ```
//!
//! 两个阶段各自计时，共用同一个超时上限。超时是软失败：不报错，只是提前结束。

use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::error::WaitError;
use crate::host::AnimatorDriver;

/// 等待阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// 等待当前状态切换到目标
    Entering,
    /// 等待目标状态播放完一轮
    Playing,
}

/// 等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 目标状态已播放完一轮
    Completed,
    /// 超时（`phase` 为最后超时的阶段）
    TimedOut { phase: WaitPhase },
}

/// 单次轮询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPoll {
    /// 仍在等待
    Pending,
    /// 等待结束
    Done(WaitOutcome),
}

#[derive(Clone)]
struct ActiveWait {
    animator: Rc<dyn AnimatorDriver>,
    state: String,
    timeout: f32,
    phase: WaitPhase,
    /// 当前阶段已等待时间
    phase_elapsed: f32,
    /// 入场阶段是否超时
    entry_timed_out: bool,
}

/// 动画等待器
///
/// 同一时间只等待一个状态，新的等待会替换旧的。
#[derive(Default)]
pub struct AnimationWaiter {
    active: Option<ActiveWait>,
    /// 本次等待累计挂起时间
    elapsed: f32,
}

impl std::fmt::Debug for AnimationWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationWaiter")
            .field("state", &self.active.as_ref().map(|w| w.state.as_str()))
            .field("phase", &self.active.as_ref().map(|w| w.phase))
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl AnimationWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始等待目标状态
    ///
    /// 校验通过后立即请求过渡，之后由 [`poll`](Self::poll) 每帧推进。
    /// 校验失败时立即返回错误，不进入等待。
    pub fn wait_for_state(
        &mut self,
        animator: Option<&Rc<dyn AnimatorDriver>>,
        state: &str,
        crossfade: f32,
        timeout: f32,
    ) -> Result<(), WaitError> {
        self.active = None;
        self.elapsed = 0.0;

        let animator = animator.ok_or(WaitError::MissingAnimator)?;
        if state.is_empty() {
            return Err(WaitError::EmptyStateName);
        }
        if !animator.has_state(state) {
            return Err(WaitError::UnknownState {
                state: state.to_string(),
            });
        }

        debug!(state = %state, crossfade = crossfade, "播放动画状态");
        animator.cross_fade(state, crossfade.max(0.0));

        self.active = Some(ActiveWait {
            animator: animator.clone(),
            state: state.to_string(),
            timeout: timeout.max(0.0),
            phase: WaitPhase::Entering,
            phase_elapsed: 0.0,
            entry_timed_out: false,
        });
        Ok(())
    }

    /// 每帧轮询
    ///
    /// 先检查条件，未满足再累计本帧时间。没有进行中的等待时返回 `Pending`。
    pub fn poll(&mut self, dt: f32) -> WaitPoll {
        let Some(wait) = self.active.as_mut() else {
            return WaitPoll::Pending;
        };
        let dt = dt.max(0.0);

        loop {
            let info = wait.animator.current_state();
            let in_target = info.state == wait.state;

            match wait.phase {
                WaitPhase::Entering => {
                    if in_target {
                        wait.phase = WaitPhase::Playing;
                        wait.phase_elapsed = 0.0;
                        continue;
                    }
                    if wait.phase_elapsed >= wait.timeout {
                        warn!(state = %wait.state, "等待进入动画状态超时");
                        wait.entry_timed_out = true;
                        wait.phase = WaitPhase::Playing;
                        wait.phase_elapsed = 0.0;
                        continue;
                    }
                }
                WaitPhase::Playing => {
                    if in_target && info.normalized_time >= 1.0 {
                        debug!(state = %wait.state, elapsed = self.elapsed, "动画状态播放完成");
                        self.active = None;
                        return WaitPoll::Done(WaitOutcome::Completed);
                    }
                    if wait.phase_elapsed >= wait.timeout {
                        warn!(
                            state = %wait.state,
                            entry_timed_out = wait.entry_timed_out,
                            "等待动画状态播放完成超时"
                        );
                        self.active = None;
                        return WaitPoll::Done(WaitOutcome::TimedOut {
                            phase: WaitPhase::Playing,
                        });
                    }
                }
            }

            wait.phase_elapsed += dt;
            self.elapsed += dt;
            return WaitPoll::Pending;
        }
    }

    /// 取消等待（不产生结果）
    pub fn cancel(&mut self) {
        if let Some(wait) = self.active.take() {
            debug!(state = %wait.state, "取消动画等待");
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.active.is_some()
    }

    /// 当前阶段
    pub fn phase(&self) -> Option<WaitPhase> {
        self.active.as_ref().map(|w| w.phase)
    }

    /// 本次等待累计挂起时间
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

/// 记录等待失败（缺少协作者时降级为无操作）
pub(crate) fn report_wait_error(err: &WaitError) {
    match err {
        WaitError::MissingAnimator => warn!(error = %err, "跳过动画等待"),
        _ => error!(error = %err, "动画等待失败"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimAnimator;

    fn animator_with(states: &[(&str, f32)]) -> Rc<SimAnimator> {
        let animator = SimAnimator::new("idle");
        for (name, length) in states {
            animator.add_state(name, *length);
        }
        animator
    }

    #[test]
    fn test_missing_animator() {
        let mut waiter = AnimationWaiter::new();
        let result = waiter.wait_for_state(None, "wave", 0.15, 10.0);
        assert_eq!(result, Err(WaitError::MissingAnimator));
        assert!(!waiter.is_waiting());
    }

    #[test]
    fn test_unknown_state_returns_immediately() {
        let animator: Rc<dyn AnimatorDriver> = animator_with(&[("wave", 1.0)]);
        let mut waiter = AnimationWaiter::new();

        let result = waiter.wait_for_state(Some(&animator), "dance", 0.15, 10.0);
        assert_eq!(
            result,
            Err(WaitError::UnknownState {
                state: "dance".to_string()
            })
        );
        assert!(!waiter.is_waiting());
        assert_eq!(waiter.elapsed(), 0.0);
    }

    #[test]
    fn test_empty_state_name() {
        let animator: Rc<dyn AnimatorDriver> = animator_with(&[("wave", 1.0)]);
        let mut waiter = AnimationWaiter::new();
        let result = waiter.wait_for_state(Some(&animator), "", 0.15, 10.0);
        assert_eq!(result, Err(WaitError::EmptyStateName));
    }

    #[test]
    fn test_completes_after_one_cycle() {
        let sim = animator_with(&[("wave", 1.0)]);
        let animator: Rc<dyn AnimatorDriver> = sim.clone();
        let mut waiter = AnimationWaiter::new();
        waiter.wait_for_state(Some(&animator), "wave", 0.0, 10.0).unwrap();
        assert_eq!(waiter.phase(), Some(WaitPhase::Entering));

        let mut polls = 0;
        let outcome = loop {
            sim.advance(0.25);
            polls += 1;
            if let WaitPoll::Done(outcome) = waiter.poll(0.25) {
                break outcome;
            }
        };
        assert_eq!(outcome, WaitOutcome::Completed);
        assert_eq!(polls, 4);
        assert!(!waiter.is_waiting());
    }

    #[test]
    fn test_never_entering_state_times_out() {
        let sim = animator_with(&[("wave", 1.0)]);
        // 驱动卡住，始终停在原状态
        sim.set_stalled(true);
        let animator: Rc<dyn AnimatorDriver> = sim.clone();

        let mut waiter = AnimationWaiter::new();
        waiter.wait_for_state(Some(&animator), "wave", 0.1, 1.0).unwrap();

        let mut outcome = None;
        for _ in 0..100 {
            if let WaitPoll::Done(o) = waiter.poll(0.25) {
                outcome = Some(o);
                break;
            }
        }
        assert_eq!(
            outcome,
            Some(WaitOutcome::TimedOut {
                phase: WaitPhase::Playing
            })
        );
        // 两个阶段各自等满超时
        assert_eq!(waiter.elapsed(), 2.0);
    }

    #[test]
    fn test_cancel_stops_waiting() {
        let sim = animator_with(&[("wave", 1.0)]);
        let animator: Rc<dyn AnimatorDriver> = sim.clone();
        let mut waiter = AnimationWaiter::new();
        waiter.wait_for_state(Some(&animator), "wave", 0.0, 10.0).unwrap();

        waiter.cancel();
        assert!(!waiter.is_waiting());
        assert_eq!(waiter.poll(5.0), WaitPoll::Pending);
    }
}
