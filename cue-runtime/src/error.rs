//! # Error 模块
//!
//! 定义 cue-runtime 中使用的错误类型。
//!
//! 核心流程没有致命错误：等待失败只会让当前步骤提前结束，序列仍然会走完。

use thiserror::Error;

/// 动画等待错误
///
/// 由 [`AnimationWaiter::wait_for_state`](crate::AnimationWaiter::wait_for_state)
/// 立即返回，调用方不会被挂起。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// 没有动画驱动
    #[error("动画驱动不存在")]
    MissingAnimator,

    /// 状态名为空
    #[error("动画状态名为空")]
    EmptyStateName,

    /// 动画驱动中不存在该状态
    #[error("动画驱动中不存在状态 '{state}'")]
    UnknownState { state: String },
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

/// cue-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CueError {
    /// 动画等待错误
    #[error("动画等待错误: {0}")]
    Wait(#[from] WaitError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 消息编码失败
    #[error("消息编码失败: {0}")]
    Message(String),
}

impl From<serde_json::Error> for CueError {
    fn from(e: serde_json::Error) -> Self {
        Self::Message(e.to_string())
    }
}

/// Result 类型别名
pub type CueResult<T> = Result<T, CueError>;
