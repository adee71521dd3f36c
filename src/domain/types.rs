// ==========================================
// 箱型排产优化系统 - 领域类型定义
// ==========================================
// 职责: 机台/箱型/日/班次/时段 标识与枚举
// 红线: 每个班次恰好 2 个时段
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 机台标识
pub type MachineId = String;

/// 箱型标识
pub type BoxTypeId = String;

/// 计划日（有序整数）
pub type Day = u32;

/// 班次序号（从 1 开始）
pub type ShiftNo = u32;

// ==========================================
// 时段 (Segment)
// ==========================================
// 红线: 固定两段，枚举本身即保证基数为 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Segment {
    First,  // 时段 1
    Second, // 时段 2
}

impl Segment {
    /// 全部时段（按先后顺序）
    pub const ALL: [Segment; 2] = [Segment::First, Segment::Second];

    /// 时段编号（1 或 2）
    pub fn index(self) -> u8 {
        match self {
            Segment::First => 1,
            Segment::Second => 2,
        }
    }

    /// 从编号构造，仅接受 1 / 2
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Segment::First),
            2 => Some(Segment::Second),
            _ => None,
        }
    }
}

impl From<Segment> for u8 {
    fn from(segment: Segment) -> Self {
        segment.index()
    }
}

impl TryFrom<u8> for Segment {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Segment::from_index(value).ok_or_else(|| format!("非法时段编号: {}（仅支持 1/2）", value))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// ==========================================
// 重复记录处理策略 (Duplicate Policy)
// ==========================================
// 用途: 同一 (机台, 箱型) 出现多条产能记录时的取值口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DupPolicy {
    First, // 保留首条
    Last,  // 保留末条
    Min,   // 取最小值
    Max,   // 取最大值
    Mean,  // 取平均值
}

impl DupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DupPolicy::First => "first",
            DupPolicy::Last => "last",
            DupPolicy::Min => "min",
            DupPolicy::Max => "max",
            DupPolicy::Mean => "mean",
        }
    }
}

impl Default for DupPolicy {
    fn default() -> Self {
        DupPolicy::Last
    }
}

impl fmt::Display for DupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(DupPolicy::First),
            "last" => Ok(DupPolicy::Last),
            "min" => Ok(DupPolicy::Min),
            "max" => Ok(DupPolicy::Max),
            "mean" => Ok(DupPolicy::Mean),
            other => Err(format!(
                "未知重复处理策略: {}（可选: last, first, min, max, mean）",
                other
            )),
        }
    }
}
