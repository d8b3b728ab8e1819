//! # Easing 模块
//!
//! 缓动曲线。输入进度会被限制在 `[0, 1]`，输出按曲线原样返回，不做限制，
//! 所以带回弹的曲线可以超出端点。

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动曲线
///
/// 内置曲线都满足 `0 -> 0`、`1 -> 1`。`Custom` 由调用方提供，
/// 不要求单调，求值时只限制输入。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 平滑缓入缓出（两端切线为 0 的 Hermite 曲线）
    #[default]
    SmoothStep,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 回弹缓出（末段会略微超出目标值）
    EaseOutBack,
    /// 自定义曲线（仅代码中使用，不参与序列化）
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// `t` 为时间进度，先被限制到 `[0, 1]`。
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => t * (2.0 - t),
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
            Self::EaseInOutSine => (1.0 - (PI * t).cos()) / 2.0,
            Self::EaseOutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let u = t - 1.0;
                1.0 + C3 * u * u * u + C1 * u * u
            }
            Self::Custom(curve) => curve(t),
        }
    }
}

impl PartialEq for EasingFunction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // 函数指针无法可靠比较，自定义曲线一律视为不同
            (Self::Custom(_), _) | (_, Self::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED: [EasingFunction; 9] = [
        EasingFunction::Linear,
        EasingFunction::SmoothStep,
        EasingFunction::EaseInQuad,
        EasingFunction::EaseOutQuad,
        EasingFunction::EaseInCubic,
        EasingFunction::EaseOutCubic,
        EasingFunction::EaseInOutCubic,
        EasingFunction::EaseInOutSine,
        EasingFunction::EaseOutBack,
    ];

    #[test]
    fn test_endpoints() {
        for easing in NAMED {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_smooth_step_midpoint() {
        assert!((EasingFunction::SmoothStep.apply(0.5) - 0.5).abs() < 1e-6);
        // 两端平缓
        assert!(EasingFunction::SmoothStep.apply(0.1) < 0.1);
    }

    #[test]
    fn test_input_is_clamped() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
        assert_eq!(easing.apply(f32::NAN), 0.0);
    }

    #[test]
    fn test_custom_curve_output_not_clamped() {
        fn overshoot(t: f32) -> f32 {
            t * 2.0
        }
        let easing = EasingFunction::Custom(overshoot);
        assert_eq!(easing.apply(0.75), 1.5);
        // 输入仍然被限制
        assert_eq!(easing.apply(3.0), 2.0);
    }

    #[test]
    fn test_back_overshoots() {
        let peak = (1..100)
            .map(|i| EasingFunction::EaseOutBack.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&EasingFunction::EaseOutCubic).unwrap();
        assert_eq!(json, "\"ease_out_cubic\"");
        let parsed: EasingFunction = serde_json::from_str("\"smooth_step\"").unwrap();
        assert_eq!(parsed, EasingFunction::SmoothStep);
    }
}
