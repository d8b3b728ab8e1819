//! # Delay 模块
//!
//! 单槽位的延迟动作：倒计时结束后把动作交还给持有者执行一次。
//!
//! 动作以值的形式保存（枚举、闭包都可以），`tick` 返回 `Some(action)`
//! 的那一刻就是触发时刻，持有者负责执行。这样触发逻辑不需要借用持有者。
//!
//! 累计时间用 `f64` 记录，并按延迟的相对容差判断到点，
//! 逐帧累加 `dt` 的舍入误差不会让触发晚一帧。

/// 到点判断的相对容差
const FIRE_TOLERANCE: f64 = 1e-5;

/// 延迟动作
///
/// 同一时间最多只有一个待触发的动作，新的 `schedule` 会覆盖旧的。
#[derive(Debug, Clone)]
pub struct DelayedAction<A> {
    pending: Option<Pending<A>>,
}

#[derive(Debug, Clone)]
struct Pending<A> {
    delay: f64,
    elapsed: f64,
    action: A,
}

impl<A> Pending<A> {
    fn is_due(&self) -> bool {
        self.elapsed >= self.delay * (1.0 - FIRE_TOLERANCE)
    }
}

impl<A> Default for DelayedAction<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DelayedAction<A> {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// 安排动作
    ///
    /// 先取消之前未触发的动作。`delay <= 0` 时不进入倒计时，
    /// 直接返回 `Some(action)`，调用方应立即执行。
    #[must_use = "delay <= 0 时动作会被直接返回，需要立即执行"]
    pub fn schedule(&mut self, delay: f32, action: A) -> Option<A> {
        self.pending = None;
        if delay.is_nan() || delay <= 0.0 {
            return Some(action);
        }
        self.pending = Some(Pending {
            delay: f64::from(delay),
            elapsed: 0.0,
            action,
        });
        None
    }

    /// 推进倒计时，到点时返回动作（只返回一次）
    pub fn tick(&mut self, dt: f32) -> Option<A> {
        self.tick_with_overshoot(dt).map(|(action, _)| action)
    }

    /// 同 [`tick`](Self::tick)，另外返回本帧超过到点时刻的时间
    ///
    /// 接续下一段倒计时的持有者应从新延迟中扣掉这部分，链条总长才不会逐段变长。
    pub fn tick_with_overshoot(&mut self, dt: f32) -> Option<(A, f32)> {
        let pending = self.pending.as_mut()?;
        pending.elapsed += f64::from(dt.max(0.0));
        if !pending.is_due() {
            return None;
        }
        let pending = self.pending.take()?;
        let overshoot = (pending.elapsed - pending.delay).max(0.0) as f32;
        Some((pending.action, overshoot))
    }

    /// 取消待触发的动作，不会触发
    ///
    /// # 返回
    /// 是否确实取消了一个动作
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 剩余倒计时（没有待触发动作时为 `None`）
    pub fn remaining(&self) -> Option<f32> {
        self.pending
            .as_ref()
            .map(|p| (p.delay - p.elapsed).max(0.0) as f32)
    }
}
