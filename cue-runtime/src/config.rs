//! # Config 模块
//!
//! 舞台配置，集中管理所有可调参数。
//!
//! 所有字段都有默认值，配置文件只需写出要覆盖的部分。
//!
//! ## 消失时机
//!
//! `sequence.disappear_after_animation` 与 `disappear.delay` 同时存在：
//! - `true`：动画等待结束后立即消失，`disappear.delay` 被忽略
//! - `false`：`start()` 时开始按 `disappear.delay` 倒计时，与动画等待无关

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::easing::EasingFunction;
use crate::effect::EffectMotion;
use crate::error::ConfigError;

/// 舞台配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub appear: AppearConfig,

    #[serde(default)]
    pub disappear: DisappearConfig,

    #[serde(default)]
    pub sequence: SequenceConfig,

    #[serde(default)]
    pub ragdoll: RagdollConfig,

    #[serde(default)]
    pub interaction: InteractionConfig,
}

/// 出现效果配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearConfig {
    /// 隐藏时的缩放
    #[serde(default = "default_small_scale")]
    pub small_scale: Vec3,

    /// 正常缩放
    #[serde(default = "default_normal_scale")]
    pub normal_scale: Vec3,

    #[serde(default = "default_scale_duration")]
    pub scale_duration: f32,

    /// 出生位置（相对基准位置）
    #[serde(default)]
    pub start_offset: Vec3,

    /// 最终位置（相对基准位置，通常为 0）
    #[serde(default)]
    pub end_offset: Vec3,

    #[serde(default = "default_move_duration")]
    pub move_duration: f32,

    #[serde(default)]
    pub easing: EasingFunction,

    /// 出现粒子相对 `start()` 的延迟（秒）
    #[serde(default = "default_burst_delay")]
    pub burst_delay: f32,
}

/// 消失效果配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisappearConfig {
    /// 倒计时模式下相对 `start()` 的延迟（秒）
    #[serde(default = "default_disappear_delay")]
    pub delay: f32,

    #[serde(default = "default_normal_scale")]
    pub from_scale: Vec3,

    #[serde(default = "default_small_scale")]
    pub to_scale: Vec3,

    #[serde(default = "default_scale_duration")]
    pub scale_duration: f32,

    #[serde(default)]
    pub from_offset: Vec3,

    /// 消失终点（例如向下沉）
    #[serde(default)]
    pub to_offset: Vec3,

    #[serde(default = "default_move_duration")]
    pub move_duration: f32,

    #[serde(default)]
    pub easing: EasingFunction,
}

/// 序列配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// 要播放的动画状态名
    #[serde(default = "default_state_name")]
    pub state_name: String,

    /// 过渡混合时长（秒）
    #[serde(default = "default_cross_fade_duration")]
    pub cross_fade_duration: f32,

    /// 每个等待阶段的超时上限（秒）
    #[serde(default = "default_max_animation_wait_seconds")]
    pub max_animation_wait_seconds: f32,

    /// 动画结束后再消失（忽略 `disappear.delay`）
    #[serde(default = "default_true")]
    pub disappear_after_animation: bool,
}

/// 布娃娃配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagdollConfig {
    /// 激活后多久隐藏角色（秒）
    #[serde(default = "default_ragdoll_hide_delay")]
    pub hide_delay: f32,

    /// 激活期间的重力
    #[serde(default = "default_ragdoll_gravity")]
    pub gravity: Vec3,

    /// 按钮隐藏时长（秒），与 `hide_delay` 取较大值
    #[serde(default = "default_button_hide_seconds")]
    pub button_hide_seconds: f32,

    /// 消失反馈播放后保持角色可见的时长（秒）
    #[serde(default = "default_fx_hold")]
    pub disappear_fx_duration: f32,

    /// 布娃娃音效音量 (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

/// 交互配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "default_play_label")]
    pub play_label: String,

    #[serde(default = "default_stop_label")]
    pub stop_label: String,

    /// 对外消息中的目标 ID
    #[serde(default = "default_target_id")]
    pub target_id: i32,

    /// 对外消息中的目标名
    #[serde(default = "default_state_name")]
    pub target_name: String,

    #[serde(default = "default_true")]
    pub send_on_recognized: bool,

    #[serde(default = "default_true")]
    pub send_on_listen_click: bool,

    /// 序列完成后保持角色可见的时长（秒）
    #[serde(default = "default_fx_hold")]
    pub sequence_disappear_fx_duration: f32,
}

// 默认值函数
fn default_small_scale() -> Vec3 {
    Vec3::splat(0.01)
}

fn default_normal_scale() -> Vec3 {
    Vec3::ONE
}

fn default_scale_duration() -> f32 {
    0.3
}

fn default_move_duration() -> f32 {
    0.4
}

fn default_burst_delay() -> f32 {
    0.2
}

fn default_disappear_delay() -> f32 {
    2.0
}

fn default_state_name() -> String {
    "nurofen".to_string()
}

fn default_cross_fade_duration() -> f32 {
    0.15
}

fn default_max_animation_wait_seconds() -> f32 {
    10.0
}

fn default_true() -> bool {
    true
}

fn default_ragdoll_hide_delay() -> f32 {
    3.0
}

fn default_ragdoll_gravity() -> Vec3 {
    // 角色绕 X 轴旋转了 90 度
    Vec3::new(0.0, 0.0, -9.81)
}

fn default_button_hide_seconds() -> f32 {
    3.0
}

fn default_fx_hold() -> f32 {
    0.5
}

fn default_volume() -> f32 {
    1.0
}

fn default_play_label() -> String {
    "Luister!".to_string()
}

fn default_stop_label() -> String {
    "Stop!".to_string()
}

fn default_target_id() -> i32 {
    1
}

impl Default for AppearConfig {
    fn default() -> Self {
        Self {
            small_scale: default_small_scale(),
            normal_scale: default_normal_scale(),
            scale_duration: default_scale_duration(),
            start_offset: Vec3::ZERO,
            end_offset: Vec3::ZERO,
            move_duration: default_move_duration(),
            easing: EasingFunction::default(),
            burst_delay: default_burst_delay(),
        }
    }
}

impl Default for DisappearConfig {
    fn default() -> Self {
        Self {
            delay: default_disappear_delay(),
            from_scale: default_normal_scale(),
            to_scale: default_small_scale(),
            scale_duration: default_scale_duration(),
            from_offset: Vec3::ZERO,
            to_offset: Vec3::ZERO,
            move_duration: default_move_duration(),
            easing: EasingFunction::default(),
        }
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            state_name: default_state_name(),
            cross_fade_duration: default_cross_fade_duration(),
            max_animation_wait_seconds: default_max_animation_wait_seconds(),
            disappear_after_animation: true,
        }
    }
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            hide_delay: default_ragdoll_hide_delay(),
            gravity: default_ragdoll_gravity(),
            button_hide_seconds: default_button_hide_seconds(),
            disappear_fx_duration: default_fx_hold(),
            volume: default_volume(),
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            play_label: default_play_label(),
            stop_label: default_stop_label(),
            target_id: default_target_id(),
            target_name: default_state_name(),
            send_on_recognized: true,
            send_on_listen_click: true,
            sequence_disappear_fx_duration: default_fx_hold(),
        }
    }
}

impl AppearConfig {
    /// 出现效果的运动参数
    pub fn motion(&self) -> EffectMotion {
        EffectMotion {
            from_scale: self.small_scale,
            to_scale: self.normal_scale,
            scale_duration: self.scale_duration,
            from_offset: self.start_offset,
            to_offset: self.end_offset,
            move_duration: self.move_duration,
            easing: self.easing,
        }
    }
}

impl DisappearConfig {
    /// 消失效果的运动参数
    pub fn motion(&self) -> EffectMotion {
        EffectMotion {
            from_scale: self.from_scale,
            to_scale: self.to_scale,
            scale_duration: self.scale_duration,
            from_offset: self.from_offset,
            to_offset: self.to_offset,
            move_duration: self.move_duration,
            easing: self.easing,
        }
    }
}

impl RagdollConfig {
    /// 激活后到隐藏角色的等待时长
    pub fn hide_wait(&self) -> f32 {
        self.hide_delay.max(self.button_hide_seconds)
    }
}

impl StageConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!(path = ?path, "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 读取并解析配置文件，失败时返回错误
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&content)
    }

    /// 从 JSON 文本解析
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    ///
    /// 负时长不算错误（按瞬时处理），这里只检查会让行为失去意义的值。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sequence.state_name.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "必须配置 sequence.state_name（动画状态名）".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ragdoll.volume) {
            return Err(ConfigError::ValidationFailed(
                "布娃娃音量必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if !self.ragdoll.gravity.is_finite() {
            return Err(ConfigError::ValidationFailed(
                "布娃娃重力必须是有限值".to_string(),
            ));
        }

        if self.interaction.play_label.is_empty() || self.interaction.stop_label.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "按钮文字不能为空".to_string(),
            ));
        }

        if self.sequence.max_animation_wait_seconds.is_nan() {
            return Err(ConfigError::ValidationFailed(
                "动画等待超时不能为 NaN".to_string(),
            ));
        }

        Ok(())
    }
}
