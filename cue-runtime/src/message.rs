//! # Message 模块
//!
//! 发给外部消息桥的目标事件。
//!
//! 线上格式是扁平的 JSON 对象，字段顺序固定：
//!
//! ```text
//! {"id":1,"name":"nurofen","eventType":"recognized"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CueResult;

/// 目标事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetEvent {
    /// 识别到目标（每次追踪只发一次）
    Recognized,
    /// 用户点击播放
    Listen,
}

/// 目标消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMessage {
    pub id: i32,
    pub name: String,
    #[serde(rename = "eventType")]
    pub event_type: TargetEvent,
}

impl TargetMessage {
    pub fn new(id: i32, name: impl Into<String>, event_type: TargetEvent) -> Self {
        Self {
            id,
            name: name.into(),
            event_type,
        }
    }

    /// 编码为线上格式
    pub fn to_payload(&self) -> CueResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 从线上格式解码
    pub fn from_payload(payload: &str) -> CueResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}
