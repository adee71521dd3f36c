// ==========================================
// 箱型排产优化系统 - 求解结果提取引擎
// ==========================================
// 职责: 变量取值 → 分配明细 / 换型事件 / 需求满足 / 利用率 / 汇总
// 阈值: x > 0.5 视为分配；T > 0.01 视为换型事件
// 红线: 不重新求解；变量缺失时跳过，不报错
// ==========================================

use crate::domain::parameters::{DemandMap, PlanningParameters};
use crate::domain::solution::{
    AssignmentRow, DemandFulfillment, MachineUtilization, PlanReport, SetupEvent, SolutionSummary,
};
use crate::domain::types::{BoxTypeId, Day, MachineId};
use crate::engine::model_builder::BuiltModel;
use crate::engine::solver::SolvedValues;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use uuid::Uuid;

const ASSIGN_THRESHOLD: f64 = 0.5;
const SETUP_THRESHOLD: f64 = 0.01;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ==========================================
// SolutionExtractor - 结果提取引擎（无状态）
// ==========================================
pub struct SolutionExtractor;

impl Default for SolutionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 有效分配（x > 0.5），产出箱数 = 生产小时 × 产能
    pub fn extract_assignments(
        &self,
        built: &BuiltModel,
        params: &PlanningParameters,
        values: &SolvedValues,
    ) -> Vec<AssignmentRow> {
        let mut rows = Vec::new();
        for (key, &x) in &built.vars.assign {
            let Some(x_val) = values.value(x) else {
                continue;
            };
            if x_val <= ASSIGN_THRESHOLD {
                continue;
            }
            let hours = built
                .vars
                .hours
                .get(key)
                .and_then(|&y| values.value(y))
                .unwrap_or(0.0);
            let (machine, box_type, day, shift, segment) = key;
            let rate = params.productivity_of(machine, box_type);
            rows.push(AssignmentRow {
                machine: machine.clone(),
                box_type: box_type.clone(),
                day: *day,
                shift: *shift,
                segment: *segment,
                hours: round2(hours),
                units: round2(hours * rate),
            });
        }
        rows
    }

    /// 换型事件（T > 0.01）
    pub fn extract_setup_events(&self, built: &BuiltModel, values: &SolvedValues) -> Vec<SetupEvent> {
        built
            .vars
            .setup_time
            .iter()
            .filter_map(|((machine, day, shift), &t)| {
                let hours = values.value(t)?;
                (hours > SETUP_THRESHOLD).then(|| SetupEvent {
                    machine: machine.clone(),
                    day: *day,
                    shift: *shift,
                    setup_hours: round2(hours),
                })
            })
            .collect()
    }

    /// 需求满足情况（全量 B×D，需求为 0 时满足率 100%）
    pub fn extract_demand_fulfillment(
        &self,
        built: &BuiltModel,
        params: &PlanningParameters,
        values: &SolvedValues,
        demand: &DemandMap,
    ) -> Vec<DemandFulfillment> {
        let mut produced: BTreeMap<(Day, BoxTypeId), f64> = BTreeMap::new();
        for ((machine, box_type, day, _, _), &y) in &built.vars.hours {
            let Some(hours) = values.value(y) else {
                continue;
            };
            *produced.entry((*day, box_type.clone())).or_insert(0.0) +=
                hours * params.productivity_of(machine, box_type);
        }

        let mut rows = Vec::new();
        for box_type in &params.sets.box_types {
            for &day in &params.sets.days {
                let key = (day, box_type.clone());
                let demanded = demand.get(&key).copied().unwrap_or(0.0);
                let made = produced.get(&key).copied().unwrap_or(0.0);
                let pct = if demanded > 0.0 {
                    made / demanded * 100.0
                } else {
                    100.0
                };
                rows.push(DemandFulfillment {
                    box_type: box_type.clone(),
                    day,
                    demanded: round2(demanded),
                    produced: round2(made),
                    difference: round2(made - demanded),
                    fulfillment_pct: round1(pct),
                });
            }
        }
        rows
    }

    /// 机台日利用率（全量 M×D）
    pub fn extract_utilization(
        &self,
        built: &BuiltModel,
        params: &PlanningParameters,
        values: &SolvedValues,
    ) -> Vec<MachineUtilization> {
        let mut production: BTreeMap<(MachineId, Day), f64> = BTreeMap::new();
        for ((machine, _, day, _, _), &y) in &built.vars.hours {
            if let Some(hours) = values.value(y) {
                *production.entry((machine.clone(), *day)).or_insert(0.0) += hours;
            }
        }
        let mut setup: BTreeMap<(MachineId, Day), f64> = BTreeMap::new();
        for ((machine, day, _), &t) in &built.vars.setup_time {
            if let Some(hours) = values.value(t) {
                *setup.entry((machine.clone(), *day)).or_insert(0.0) += hours;
            }
        }

        let mut rows = Vec::new();
        for machine in &params.sets.machines {
            for &day in &params.sets.days {
                let key = (machine.clone(), day);
                let production_hours = production.get(&key).copied().unwrap_or(0.0);
                let setup_hours = setup.get(&key).copied().unwrap_or(0.0);
                rows.push(MachineUtilization {
                    machine: machine.clone(),
                    day,
                    production_hours: round2(production_hours),
                    setup_hours: round2(setup_hours),
                    total_hours: round2(production_hours + setup_hours),
                });
            }
        }
        rows
    }

    /// 汇总: 目标值 / 总生产小时 / 总换型小时
    pub fn summarize(&self, built: &BuiltModel, values: &SolvedValues) -> SolutionSummary {
        let total_production: f64 = built
            .vars
            .hours
            .values()
            .filter_map(|&y| values.value(y))
            .sum();
        let total_setup: f64 = built
            .vars
            .setup_time
            .values()
            .filter_map(|&t| values.value(t))
            .sum();

        SolutionSummary {
            objective: round2(values.objective),
            total_production_hours: round2(total_production),
            total_setup_hours: round2(total_setup),
        }
    }

    /// 组装完整报告
    #[instrument(skip_all)]
    pub fn build_report(
        &self,
        built: &BuiltModel,
        params: &PlanningParameters,
        values: &SolvedValues,
        demand: &DemandMap,
        config_snapshot: Option<serde_json::Value>,
    ) -> PlanReport {
        let assignments = self.extract_assignments(built, params, values);
        let setup_events = self.extract_setup_events(built, values);
        let demand_rows = self.extract_demand_fulfillment(built, params, values, demand);
        let utilization = self.extract_utilization(built, params, values);
        let summary = self.summarize(built, values);

        debug!(
            assignments = assignments.len(),
            setup_events = setup_events.len(),
            "结果提取完成"
        );

        PlanReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            summary,
            assignment_count: assignments.len(),
            setup_event_count: setup_events.len(),
            assignments,
            setup_events,
            demand: demand_rows,
            utilization,
            config_snapshot,
        }
    }
}
