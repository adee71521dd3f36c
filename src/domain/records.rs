// ==========================================
// 箱型排产优化系统 - 原始记录领域模型
// ==========================================
// 职责: 五类上游记录流 + 需求记录的类型化表示
// 红线: 原始记录保留"可能缺失"的数值，默认值口径统一由参数派生层决定
// ==========================================

use crate::domain::types::{BoxTypeId, Day, MachineId, ShiftNo};
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftCountRecord - 每日班次数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftCountRecord {
    pub day: Day,                  // 计划日
    pub shift_count: Option<i64>,  // 班次数（缺失/非数值 → None）
}

// ==========================================
// AvailabilityRecord - 机台日可用性
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub machine: MachineId,          // 机台
    pub day: Option<Day>,            // 计划日（非数值 → None，整行忽略）
    pub availability: Option<f64>,   // 可用标志（仅 0/1 有效）
}

// ==========================================
// ProductivityRecord - 机台 × 箱型 产能
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityRecord {
    pub machine: MachineId,          // 机台
    pub box_type: BoxTypeId,         // 箱型
    pub productivity: Option<f64>,   // 产能（箱/小时，缺失 → 0）
}

// ==========================================
// SetupRecord - 换型时间
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupRecord {
    pub machine: MachineId,          // 机台
    pub from_box_type: BoxTypeId,    // 当前箱型
    pub to_box_type: BoxTypeId,      // 目标箱型
    pub hours: Option<f64>,          // 换型小时数
}

// ==========================================
// ShiftDurationRecord - 班次时长
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftDurationRecord {
    pub day: Option<Day>,            // 计划日
    pub shift: Option<ShiftNo>,      // 班次
    pub hours: Option<f64>,          // 时长（小时）
}

// ==========================================
// DemandRecord - 需求（外部提供）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub day: Day,                    // 计划日
    pub box_type: BoxTypeId,         // 箱型
    pub units: Option<f64>,          // 需求箱数
}

// ==========================================
// RawRecordSet - 一次排产的全部原始输入
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecordSet {
    pub shift_counts: Vec<ShiftCountRecord>,
    pub availability: Vec<AvailabilityRecord>,
    pub productivity: Vec<ProductivityRecord>,
    pub setup: Vec<SetupRecord>,
    pub shift_durations: Vec<ShiftDurationRecord>,
}

impl RawRecordSet {
    /// 记录总数（日志用）
    pub fn total_records(&self) -> usize {
        self.shift_counts.len()
            + self.availability.len()
            + self.productivity.len()
            + self.setup.len()
            + self.shift_durations.len()
    }
}
