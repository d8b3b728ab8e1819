//! # Tween 模块
//!
//! 可重置的时间驱动补间。
//!
//! 核心设计：补间只关注值随时间的变化，不关心值被写到哪里。
//! 由持有者在每次 `advance` 之后读取 [`Tween::value`] 并应用。

use crate::easing::EasingFunction;
use crate::math::Lerp;

/// 补间参数（纯配置，不含可变状态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSpec<T> {
    /// 起始值
    pub from: T,
    /// 目标值
    pub to: T,
    /// 时长（秒），`<= 0` 视为瞬时
    pub duration: f32,
    /// 缓动曲线
    pub easing: EasingFunction,
}

impl<T: Lerp> TweenSpec<T> {
    /// 创建补间参数（默认平滑缓入缓出）
    pub fn new(from: T, to: T, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            easing: EasingFunction::default(),
        }
    }

    /// 设置缓动曲线
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 是否为瞬时补间
    pub fn is_instant(&self) -> bool {
        // NaN 也按瞬时处理
        self.duration.is_nan() || self.duration <= 0.0
    }

    /// 按已过时间求值
    pub fn sample(&self, elapsed: f32) -> T {
        if self.is_instant() {
            return self.to;
        }
        let fraction = (elapsed / self.duration).clamp(0.0, 1.0);
        self.from.lerp_to(self.to, self.easing.apply(fraction))
    }
}

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 尚未开始
    #[default]
    Idle,
    /// 正在推进
    Running,
    /// 已到达目标值
    Completed,
    /// 被取消，值停在取消时的位置
    Cancelled,
}

/// 补间实例
#[derive(Debug, Clone)]
pub struct Tween<T> {
    spec: TweenSpec<T>,
    elapsed: f32,
    current: T,
    state: TweenState,
}

impl<T: Lerp> Tween<T> {
    /// 创建未启动的补间，当前值为 `spec.from`
    pub fn new(spec: TweenSpec<T>) -> Self {
        Self {
            current: spec.from,
            spec,
            elapsed: 0.0,
            state: TweenState::Idle,
        }
    }

    /// 以新参数开始补间
    ///
    /// 已过时间归零；瞬时补间直接落到目标值。
    pub fn start(&mut self, spec: TweenSpec<T>) {
        self.spec = spec;
        self.restart();
    }

    /// 以当前参数重新开始
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
        if self.spec.is_instant() {
            self.current = self.spec.to;
            self.state = TweenState::Completed;
        } else {
            self.current = self.spec.from;
            self.state = TweenState::Running;
        }
    }

    /// 推进补间
    ///
    /// # 返回
    /// - `true`: 仍在进行中
    /// - `false`: 已结束（或本来就没有在运行）
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.state != TweenState::Running {
            return false;
        }

        self.elapsed += dt.max(0.0);
        if self.spec.is_instant() || self.elapsed >= self.spec.duration {
            self.current = self.spec.to;
            self.state = TweenState::Completed;
            return false;
        }

        self.current = self.spec.sample(self.elapsed);
        true
    }

    /// 回到起始值并丢弃进度
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.current = self.spec.from;
        self.state = TweenState::Idle;
    }

    /// 直接落到目标值
    pub fn finish(&mut self) {
        self.elapsed = self.spec.duration.max(0.0);
        self.current = self.spec.to;
        self.state = TweenState::Completed;
    }

    /// 停止推进，保留当前值
    pub fn cancel(&mut self) {
        if self.state == TweenState::Running {
            self.state = TweenState::Cancelled;
        }
    }

    /// 当前值
    pub fn value(&self) -> T {
        self.current
    }

    pub fn spec(&self) -> &TweenSpec<T> {
        &self.spec
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TweenState::Running
    }
}
