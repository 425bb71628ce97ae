//! 控制轴与控制值
//!
//! 调用方使用归一化速率（`[-1.0, 1.0]`），线协议使用整数控制值（`[-100, 100]`）。
//! 转换规则：先钳位，再缩放取整：`round(100 * clamp(rate, -1, 1))`。

use crate::error::ProtocolError;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ControlValue
// ============================================================================

/// 线协议上的整数控制值，范围 `[-100, 100]`
///
/// # 示例
///
/// ```rust
/// use robolink_protocol::ControlValue;
///
/// assert_eq!(ControlValue::from_rate(0.25).get(), 25);
/// assert_eq!(ControlValue::from_rate(1.5).get(), 100);
/// assert_eq!(ControlValue::from_rate(-5.0).get(), -100);
/// assert_eq!(ControlValue::from_rate(0.003).get(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ControlValue(i8);

impl ControlValue {
    /// 最小控制值
    pub const MIN: ControlValue = ControlValue(-100);
    /// 最大控制值
    pub const MAX: ControlValue = ControlValue(100);
    /// 零（停止）
    pub const ZERO: ControlValue = ControlValue(0);

    /// 从归一化速率转换
    ///
    /// 超出 `[-1.0, 1.0]` 的速率被静默钳位，不视为错误；NaN 视为 0。
    pub fn from_rate(rate: f64) -> Self {
        if rate.is_nan() {
            return Self::ZERO;
        }
        let clamped = rate.clamp(-1.0, 1.0);
        // 钳位后 |100 * clamped| <= 100，转换不会溢出 i8
        ControlValue((100.0 * clamped).round() as i8)
    }

    /// 从原始整数创建，超出 `[-100, 100]` 返回 `None`
    pub fn new(raw: i32) -> Option<Self> {
        if (Self::MIN.0 as i32..=Self::MAX.0 as i32).contains(&raw) {
            Some(ControlValue(raw as i8))
        } else {
            None
        }
    }

    /// 从原始 i8 创建并钳位到 `[-100, 100]`
    pub fn saturating(raw: i8) -> Self {
        ControlValue(raw.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// 原始整数值
    pub fn get(self) -> i8 {
        self.0
    }

    /// 转换回归一化速率
    pub fn as_rate(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// 以 `limit` 为上限对称钳位（`limit` 取绝对值）
    pub fn limited(self, limit: ControlValue) -> Self {
        let limit = limit.0.unsigned_abs().min(100) as i8;
        ControlValue(self.0.clamp(-limit, limit))
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ControlValue {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i32>()
            .ok()
            .and_then(ControlValue::new)
            .ok_or_else(|| ProtocolError::InvalidControlValue(s.to_string()))
    }
}

impl From<ControlValue> for i8 {
    fn from(value: ControlValue) -> Self {
        value.0
    }
}

// ============================================================================
// Axis
// ============================================================================

/// 控制轴
///
/// 客户端按配置的轴顺序序列化控制命令；默认顺序为
/// `[ChassisForward, GimbalYaw]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Axis {
    /// 底盘前进（负值后退）
    #[cfg_attr(feature = "serde", serde(rename = "chassis_fwd"))]
    ChassisForward = 0,
    /// 底盘横移（正值向右）
    ChassisStrafe = 1,
    /// 底盘偏航
    ChassisYaw = 2,
    /// 云台偏航（底盘跟随云台时底盘也会转向）
    GimbalYaw = 3,
    /// 云台俯仰
    GimbalPitch = 4,
}

impl Axis {
    /// 已知轴的数量
    pub const COUNT: usize = 5;

    /// 所有已知轴（按索引顺序）
    pub const ALL: [Axis; Axis::COUNT] = [
        Axis::ChassisForward,
        Axis::ChassisStrafe,
        Axis::ChassisYaw,
        Axis::GimbalYaw,
        Axis::GimbalPitch,
    ];

    /// 默认线序：底盘前进、云台偏航
    pub const DEFAULT_ORDER: [Axis; 2] = [Axis::ChassisForward, Axis::GimbalYaw];

    /// 轴索引（用于状态数组）
    pub fn index(self) -> usize {
        self as usize
    }

    /// 配置文件/命令行中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            Axis::ChassisForward => "chassis_fwd",
            Axis::ChassisStrafe => "chassis_strafe",
            Axis::ChassisYaw => "chassis_yaw",
            Axis::GimbalYaw => "gimbal_yaw",
            Axis::GimbalPitch => "gimbal_pitch",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chassis_fwd" | "chassis_forward" | "fwd" => Ok(Axis::ChassisForward),
            "chassis_strafe" | "strafe" => Ok(Axis::ChassisStrafe),
            "chassis_yaw" => Ok(Axis::ChassisYaw),
            "gimbal_yaw" | "yaw" => Ok(Axis::GimbalYaw),
            "gimbal_pitch" | "pitch" => Ok(Axis::GimbalPitch),
            other => Err(ProtocolError::UnknownAxis(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rate_clamps_before_scaling() {
        assert_eq!(ControlValue::from_rate(1.5).get(), 100);
        assert_eq!(ControlValue::from_rate(2.0).get(), 100);
        assert_eq!(ControlValue::from_rate(-5.0).get(), -100);
        assert_eq!(ControlValue::from_rate(f64::INFINITY).get(), 100);
        assert_eq!(ControlValue::from_rate(f64::NEG_INFINITY).get(), -100);
    }

    #[test]
    fn test_from_rate_rounds() {
        assert_eq!(ControlValue::from_rate(0.003).get(), 0);
        assert_eq!(ControlValue::from_rate(0.5).get(), 50);
        assert_eq!(ControlValue::from_rate(-0.1).get(), -10);
        assert_eq!(ControlValue::from_rate(0.256).get(), 26);
        assert_eq!(ControlValue::from_rate(-0.254).get(), -25);
    }

    #[test]
    fn test_from_rate_nan_is_zero() {
        assert_eq!(ControlValue::from_rate(f64::NAN), ControlValue::ZERO);
    }

    #[test]
    fn test_new_range_check() {
        assert_eq!(ControlValue::new(100), Some(ControlValue::MAX));
        assert_eq!(ControlValue::new(-100), Some(ControlValue::MIN));
        assert!(ControlValue::new(101).is_none());
        assert!(ControlValue::new(-101).is_none());
    }

    #[test]
    fn test_saturating_and_limited() {
        assert_eq!(ControlValue::saturating(127), ControlValue::MAX);
        assert_eq!(ControlValue::saturating(-128), ControlValue::MIN);

        let cap = ControlValue::new(30).unwrap();
        assert_eq!(ControlValue::new(80).unwrap().limited(cap).get(), 30);
        assert_eq!(ControlValue::new(-80).unwrap().limited(cap).get(), -30);
        assert_eq!(ControlValue::new(12).unwrap().limited(cap).get(), 12);
        // 负上限按绝对值处理
        let neg_cap = ControlValue::new(-30).unwrap();
        assert_eq!(ControlValue::new(80).unwrap().limited(neg_cap).get(), 30);
    }

    #[test]
    fn test_parse_control_value() {
        assert_eq!("25".parse::<ControlValue>().unwrap().get(), 25);
        assert_eq!("-100".parse::<ControlValue>().unwrap().get(), -100);
        assert!("101".parse::<ControlValue>().is_err());
        assert!("abc".parse::<ControlValue>().is_err());
        assert!("2.5".parse::<ControlValue>().is_err());
    }

    #[test]
    fn test_axis_index_matches_all() {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
        }
    }

    #[test]
    fn test_axis_parse_names() {
        for axis in Axis::ALL {
            assert_eq!(axis.name().parse::<Axis>().unwrap(), axis);
        }
        assert_eq!("yaw".parse::<Axis>().unwrap(), Axis::GimbalYaw);
        assert_eq!(" FWD ".parse::<Axis>().unwrap(), Axis::ChassisForward);
        assert!("roll".parse::<Axis>().is_err());
    }
}
