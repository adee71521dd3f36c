// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================
#![allow(dead_code)]

use box_shift_planner::domain::records::{
    AvailabilityRecord, ProductivityRecord, RawRecordSet, SetupRecord, ShiftCountRecord,
    ShiftDurationRecord,
};
use box_shift_planner::domain::{DemandMap, PlanningOptions, PlanningParameters};
use box_shift_planner::logging;
use box_shift_planner::engine::{
    BuiltModel, GoodLpSolver, MilpSolver, ModelBuilder, ParameterDeriver, PlanOutcome,
    PlanningOrchestrator, SolveOutcome,
};

// ==========================================
// ScenarioBuilder - 原始记录 + 需求
// ==========================================
#[derive(Default)]
pub struct ScenarioBuilder {
    raw: RawRecordSet,
    demand: DemandMap,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计划日及当日班次数
    pub fn day(mut self, day: u32, shift_count: i64) -> Self {
        self.raw.shift_counts.push(ShiftCountRecord {
            day,
            shift_count: Some(shift_count),
        });
        self
    }

    pub fn shift_hours(mut self, day: u32, shift: u32, hours: f64) -> Self {
        self.raw.shift_durations.push(ShiftDurationRecord {
            day: Some(day),
            shift: Some(shift),
            hours: Some(hours),
        });
        self
    }

    pub fn available(mut self, machine: &str, day: u32, flag: f64) -> Self {
        self.raw.availability.push(AvailabilityRecord {
            machine: machine.to_string(),
            day: Some(day),
            availability: Some(flag),
        });
        self
    }

    pub fn productivity(mut self, machine: &str, box_type: &str, rate: f64) -> Self {
        self.raw.productivity.push(ProductivityRecord {
            machine: machine.to_string(),
            box_type: box_type.to_string(),
            productivity: Some(rate),
        });
        self
    }

    pub fn setup(mut self, machine: &str, from: &str, to: &str, hours: f64) -> Self {
        self.raw.setup.push(SetupRecord {
            machine: machine.to_string(),
            from_box_type: from.to_string(),
            to_box_type: to.to_string(),
            hours: Some(hours),
        });
        self
    }

    pub fn demand(mut self, day: u32, box_type: &str, units: f64) -> Self {
        self.demand.insert((day, box_type.to_string()), units);
        self
    }

    pub fn build(self) -> (RawRecordSet, DemandMap) {
        (self.raw, self.demand)
    }
}

/// 1 机台 × 2 箱型 × 1 日 × 1 班（8h），产能均为 10 箱/h
pub fn single_machine_base() -> ScenarioBuilder {
    ScenarioBuilder::new()
        .day(1, 1)
        .shift_hours(1, 1, 8.0)
        .available("M1", 1, 1.0)
        .productivity("M1", "A", 10.0)
        .productivity("M1", "B", 10.0)
}

// ==========================================
// 求解辅助
// ==========================================

pub fn test_options() -> PlanningOptions {
    let mut options = PlanningOptions::default();
    options.solver.time_limit_seconds = 30;
    options
}

/// 完整流程（派生 → 建模 → 求解 → 提取）
pub fn run_plan(raw: &RawRecordSet, demand: &DemandMap) -> PlanOutcome {
    logging::init_test();
    PlanningOrchestrator::new(GoodLpSolver::new())
        .run(raw, demand, &test_options())
        .expect("排产流程不应报错")
}

/// 派生 + 建模 + 求解，返回中间产物用于性质校验
pub fn derive_build_solve(
    raw: &RawRecordSet,
    demand: &DemandMap,
) -> (PlanningParameters, BuiltModel, SolveOutcome) {
    logging::init_test();
    let options = test_options();
    let params = ParameterDeriver::new()
        .derive_parameters(raw, &options.derivation)
        .expect("参数派生失败");
    let built = ModelBuilder::new()
        .build(&params, demand, &options.model)
        .expect("模型构建失败");
    let outcome = GoodLpSolver::new()
        .solve(&built.model, &options.solver)
        .expect("求解器异常");
    (params, built, outcome)
}
