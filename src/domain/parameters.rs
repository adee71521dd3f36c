// ==========================================
// 箱型排产优化系统 - 规范集合与参数
// ==========================================
// 职责: 参数派生层输出、模型构建层输入
// 红线: 所有参数表均为"全量表"，下游查找不依赖默认值
// ==========================================

use crate::domain::types::{BoxTypeId, Day, MachineId, Segment, ShiftNo};
use std::collections::BTreeMap;

/// (机台, 日) → 0/1
pub type AvailabilityMap = BTreeMap<(MachineId, Day), u8>;

/// (机台, 箱型) → 箱/小时
pub type ProductivityMap = BTreeMap<(MachineId, BoxTypeId), f64>;

/// (机台, 箱型) → 是否兼容
pub type CompatibilityMap = BTreeMap<(MachineId, BoxTypeId), bool>;

/// (机台, 当前箱型, 目标箱型) → 换型小时数
pub type SetupMap = BTreeMap<(MachineId, BoxTypeId, BoxTypeId), f64>;

/// (日, 班次) → 班次时长（小时）
pub type ShiftDurationMap = BTreeMap<(Day, ShiftNo), f64>;

/// 日 → 班次序号列表 [1..k]
pub type ShiftsPerDay = BTreeMap<Day, Vec<ShiftNo>>;

/// (日, 箱型) → 需求箱数（统一键序: 日在前）
pub type DemandMap = BTreeMap<(Day, BoxTypeId), f64>;

/// (日, 班次, 时段) → 时段长度（小时）
pub type SegmentLengthMap = BTreeMap<(Day, ShiftNo, Segment), f64>;

// ==========================================
// PlanningSets - 规范集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningSets {
    pub machines: Vec<MachineId>,     // M（有序、去重）
    pub box_types: Vec<BoxTypeId>,    // B（有序、去重）
    pub days: Vec<Day>,               // D（有序）
    pub shifts_per_day: ShiftsPerDay, // 每日班次（各日班次数可不同）
}

impl PlanningSets {
    /// 时段集合（固定两段）
    pub fn segments(&self) -> [Segment; 2] {
        Segment::ALL
    }

    /// 指定日的班次列表（未声明的日返回空）
    pub fn shifts_of(&self, day: Day) -> &[ShiftNo] {
        self.shifts_per_day
            .get(&day)
            .map(|shifts| shifts.as_slice())
            .unwrap_or(&[])
    }

    /// 全部 (日, 班次) 组合，按 D 顺序
    pub fn day_shifts(&self) -> Vec<(Day, ShiftNo)> {
        self.days
            .iter()
            .flat_map(|&day| self.shifts_of(day).iter().map(move |&shift| (day, shift)))
            .collect()
    }
}

// ==========================================
// PlanningParameters - 全量参数快照
// ==========================================
// 用途: 单次优化运行独占一份，不跨运行共享
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningParameters {
    pub sets: PlanningSets,
    pub availability: AvailabilityMap,     // 全量于 M×D
    pub productivity: ProductivityMap,     // 全量于 M×B
    pub compatibility: CompatibilityMap,   // 全量于 M×B
    pub setup: SetupMap,                   // 稀疏，缺失即"无换型定义"
    pub shift_duration: ShiftDurationMap,  // 覆盖 shifts_per_day 引用的全部 (d,t)
}

impl PlanningParameters {
    /// 产能查询（全量表，缺失视为 0）
    pub fn productivity_of(&self, machine: &str, box_type: &str) -> f64 {
        self.productivity
            .get(&(machine.to_string(), box_type.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    /// 兼容性查询
    pub fn is_compatible(&self, machine: &str, box_type: &str) -> bool {
        self.compatibility
            .get(&(machine.to_string(), box_type.to_string()))
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_shifts_follow_per_day_counts() {
        let mut shifts_per_day = ShiftsPerDay::new();
        shifts_per_day.insert(1, vec![1, 2]);
        shifts_per_day.insert(2, vec![1]);
        let sets = PlanningSets {
            machines: vec!["M1".to_string()],
            box_types: vec!["A".to_string()],
            days: vec![1, 2],
            shifts_per_day,
        };

        assert_eq!(sets.day_shifts(), vec![(1, 1), (1, 2), (2, 1)]);
        assert!(sets.shifts_of(9).is_empty());
        assert_eq!(sets.segments().len(), 2);
    }
}
