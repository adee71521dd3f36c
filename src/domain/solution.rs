// ==========================================
// 箱型排产优化系统 - 求解结果领域模型
// ==========================================
// 职责: 面向报表/可视化的结构化输出
// 对齐: 分配明细 / 换型事件 / 需求满足 / 机台利用率 / 汇总
// ==========================================

use crate::domain::types::{BoxTypeId, Day, MachineId, Segment, ShiftNo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// AssignmentRow - 有效分配 (x = 1)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub machine: MachineId,
    pub box_type: BoxTypeId,
    pub day: Day,
    pub shift: ShiftNo,
    pub segment: Segment,
    pub hours: f64, // 生产小时
    pub units: f64, // 产出箱数 = hours × 产能
}

// ==========================================
// SetupEvent - 换型事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupEvent {
    pub machine: MachineId,
    pub day: Day,
    pub shift: ShiftNo,
    pub setup_hours: f64,
}

// ==========================================
// DemandFulfillment - 需求满足情况
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandFulfillment {
    pub box_type: BoxTypeId,
    pub day: Day,
    pub demanded: f64,
    pub produced: f64,
    pub difference: f64,      // produced - demanded
    pub fulfillment_pct: f64, // demanded = 0 时为 100
}

impl DemandFulfillment {
    /// 是否满足需求
    ///
    /// difference 已取整到 0.01，取整后不为负即视为满足
    pub fn is_met(&self) -> bool {
        self.difference > -0.005
    }
}

// ==========================================
// MachineUtilization - 机台日利用率
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineUtilization {
    pub machine: MachineId,
    pub day: Day,
    pub production_hours: f64,
    pub setup_hours: f64,
    pub total_hours: f64,
}

// ==========================================
// SolutionSummary - 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSummary {
    pub objective: f64,              // 目标值 (∑T)
    pub total_production_hours: f64, // ∑y
    pub total_setup_hours: f64,      // ∑T
}

// ==========================================
// PlanReport - 单次运行报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: SolutionSummary,
    pub assignment_count: usize,
    pub setup_event_count: usize,
    pub assignments: Vec<AssignmentRow>,
    pub setup_events: Vec<SetupEvent>,
    pub demand: Vec<DemandFulfillment>,
    pub utilization: Vec<MachineUtilization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_snapshot: Option<serde_json::Value>,
}

impl PlanReport {
    /// 未满足的需求条目
    pub fn unmet_demand(&self) -> Vec<&DemandFulfillment> {
        self.demand.iter().filter(|d| !d.is_met()).collect()
    }

    /// 文本摘要（命令行输出用）
    pub fn summary_text(&self) -> String {
        format!(
            "目标值(∑换型): {:.2} h | 生产: {:.2} h | 换型: {:.2} h | 分配: {} | 换型事件: {} | 需求条目: {}",
            self.summary.objective,
            self.summary.total_production_hours,
            self.summary.total_setup_hours,
            self.assignment_count,
            self.setup_event_count,
            self.demand.len()
        )
    }
}
