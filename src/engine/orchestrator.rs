// ==========================================
// 箱型排产优化系统 - 引擎编排器
// ==========================================
// 用途: 协调单次排产实例的执行顺序
// 流程: 参数派生 → 模型构建 → 求解 → 结果提取
// 说明: 不可行/无界作为 PlanOutcome 正常返回
// 红线: 有需求的日必须有班次计划；求解取值必须覆盖全部变量
// ==========================================

use crate::domain::options::PlanningOptions;
use crate::domain::parameters::{DemandMap, PlanningParameters};
use crate::domain::records::RawRecordSet;
use crate::domain::solution::PlanReport;
use crate::domain::types::Day;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::model_builder::ModelBuilder;
use crate::engine::parameter_deriver::ParameterDeriver;
use crate::engine::solution_extractor::SolutionExtractor;
use crate::engine::solver::{validate_solver_options, MilpSolver, SolveOutcome, SolverError};
use tracing::{debug, info, warn};

// ==========================================
// PlanOutcome - 单次排产结果
// ==========================================
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Planned(Box<PlanReport>),
    Infeasible,
    Unbounded,
}

impl PlanOutcome {
    pub fn report(&self) -> Option<&PlanReport> {
        match self {
            PlanOutcome::Planned(report) => Some(&**report),
            _ => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, PlanOutcome::Infeasible)
    }
}

// ==========================================
// PlanningOrchestrator - 引擎编排器
// ==========================================
pub struct PlanningOrchestrator<S>
where
    S: MilpSolver,
{
    solver: S,
    deriver: ParameterDeriver,
    builder: ModelBuilder,
    extractor: SolutionExtractor,
    config_snapshot: Option<serde_json::Value>,
}

impl<S> PlanningOrchestrator<S>
where
    S: MilpSolver,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - solver: MILP 求解器后端
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            deriver: ParameterDeriver::new(),
            builder: ModelBuilder::new(),
            extractor: SolutionExtractor::new(),
            config_snapshot: None,
        }
    }

    /// 附带配置快照（写入报告元数据）
    pub fn with_config_snapshot(mut self, snapshot: serde_json::Value) -> Self {
        self.config_snapshot = Some(snapshot);
        self
    }

    /// 从原始记录执行完整流程
    ///
    /// # 参数
    /// - raw: 五类原始记录
    /// - demand: (日, 箱型) → 需求箱数
    /// - options: 派生/建模/求解选项
    pub fn run(
        &self,
        raw: &RawRecordSet,
        demand: &DemandMap,
        options: &PlanningOptions,
    ) -> EngineResult<PlanOutcome> {
        info!(
            total_records = raw.total_records(),
            demand_entries = demand.len(),
            solver = self.solver.name(),
            "开始执行排产流程"
        );

        // ==========================================
        // 步骤1: 参数派生
        // ==========================================
        debug!("步骤1: 执行参数派生");
        for issue in self.deriver.check_consistency(raw) {
            warn!(issue = %issue, "数据一致性告警");
        }
        // 有需求的日必须出现在班次计划中
        self.deriver
            .derive_shifts_per_day_for(&raw.shift_counts, &demanded_days(demand))?;
        let params = self.deriver.derive_parameters(raw, &options.derivation)?;

        self.run_with_parameters(&params, demand, options)
    }

    /// 从已派生参数执行建模 → 求解 → 提取
    pub fn run_with_parameters(
        &self,
        params: &PlanningParameters,
        demand: &DemandMap,
        options: &PlanningOptions,
    ) -> EngineResult<PlanOutcome> {
        validate_solver_options(&options.solver)?;

        if let Some(day) = demanded_days(demand)
            .into_iter()
            .find(|day| !params.sets.days.contains(day))
        {
            return Err(EngineError::MissingSchedule { day });
        }

        let unknown: Vec<_> = demand
            .keys()
            .filter(|(_, box_type)| !params.sets.box_types.contains(box_type))
            .collect();
        if !unknown.is_empty() {
            warn!(count = unknown.len(), keys = ?unknown, "需求箱型不在产能数据中，已忽略");
        }

        // ==========================================
        // 步骤2: 模型构建
        // ==========================================
        debug!("步骤2: 构建约束模型");
        let built = self.builder.build(params, demand, &options.model)?;
        let stats = built.stats();
        info!(
            assign_vars = stats.assign_vars,
            hours_vars = stats.hours_vars,
            setup_vars = stats.setup_vars,
            sequence_vars = stats.sequence_vars,
            constraints = stats.constraints,
            "模型规模"
        );

        // ==========================================
        // 步骤3: 求解
        // ==========================================
        debug!(
            time_limit_seconds = options.solver.time_limit_seconds,
            optimality_gap = options.solver.optimality_gap,
            "步骤3: 调用求解器"
        );
        let values = match self.solver.solve(&built.model, &options.solver)? {
            SolveOutcome::Solved(values) => values,
            SolveOutcome::Infeasible => {
                warn!("模型不可行，无排产结果");
                return Ok(PlanOutcome::Infeasible);
            }
            SolveOutcome::Unbounded => {
                warn!("模型无界，无排产结果");
                return Ok(PlanOutcome::Unbounded);
            }
        };

        if values.values.len() != built.model.num_variables() {
            return Err(SolverError::MalformedResult {
                expected: built.model.num_variables(),
                actual: values.values.len(),
            }
            .into());
        }

        // ==========================================
        // 步骤4: 结果提取
        // ==========================================
        debug!("步骤4: 提取求解结果");
        let report = self.extractor.build_report(
            &built,
            params,
            &values,
            demand,
            self.config_snapshot.clone(),
        );

        info!(
            run_id = %report.run_id,
            objective = report.summary.objective,
            assignments = report.assignment_count,
            setup_events = report.setup_event_count,
            "排产流程完成"
        );
        Ok(PlanOutcome::Planned(Box::new(report)))
    }
}

/// 需求量为正的日（有序去重）
fn demanded_days(demand: &DemandMap) -> Vec<Day> {
    let mut days: Vec<Day> = demand
        .iter()
        .filter(|(_, units)| **units > 0.0)
        .map(|((day, _), _)| *day)
        .collect();
    days.sort_unstable();
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constraint_model::ConstraintModel;
    use crate::engine::error::EngineError;
    use crate::engine::solver::{SolvedValues, SolverError};
    use crate::domain::options::SolverOptions;
    use crate::domain::records::{ProductivityRecord, ShiftCountRecord};

    /// 固定返回结果的求解器桩
    struct FixedSolver(Result<SolveOutcome, SolverError>);

    impl MilpSolver for FixedSolver {
        fn solve(&self, _model: &ConstraintModel, _options: &SolverOptions) -> Result<SolveOutcome, SolverError> {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn raw() -> RawRecordSet {
        RawRecordSet {
            shift_counts: vec![ShiftCountRecord {
                day: 1,
                shift_count: Some(1),
            }],
            productivity: vec![ProductivityRecord {
                machine: "M1".to_string(),
                box_type: "A".to_string(),
                productivity: Some(10.0),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_infeasible_is_normal_outcome() {
        let orchestrator = PlanningOrchestrator::new(FixedSolver(Ok(SolveOutcome::Infeasible)));
        let outcome = orchestrator
            .run(&raw(), &DemandMap::new(), &PlanningOptions::default())
            .unwrap();
        assert!(outcome.is_infeasible());
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_solver_failure_is_fatal() {
        let orchestrator =
            PlanningOrchestrator::new(FixedSolver(Err(SolverError::TimedOut { seconds: 1 })));
        let err = orchestrator
            .run(&raw(), &DemandMap::new(), &PlanningOptions::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Solver(SolverError::TimedOut { seconds: 1 })));
    }

    #[test]
    fn test_short_value_vector_is_rejected() {
        crate::logging::init_test();
        let solved = SolvedValues {
            values: Vec::new(),
            objective: 0.0,
        };
        let orchestrator = PlanningOrchestrator::new(FixedSolver(Ok(SolveOutcome::Solved(solved))));
        let mut demand = DemandMap::new();
        demand.insert((1, "A".to_string()), 20.0);

        let err = orchestrator
            .run(&raw(), &demand, &PlanningOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Solver(SolverError::MalformedResult { actual: 0, expected }) if expected > 0
        ));
    }

    #[test]
    fn test_demand_on_unscheduled_day_fails_fast() {
        crate::logging::init_test();
        let orchestrator = PlanningOrchestrator::new(FixedSolver(Ok(SolveOutcome::Infeasible)));
        let mut demand = DemandMap::new();
        demand.insert((5, "A".to_string()), 50.0);

        let err = orchestrator
            .run(&raw(), &demand, &PlanningOptions::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingSchedule { day: 5 }));

        // 已派生参数入口同样校验
        let params = ParameterDeriver::new()
            .derive_parameters(&raw(), &Default::default())
            .unwrap();
        let err = orchestrator
            .run_with_parameters(&params, &demand, &PlanningOptions::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingSchedule { day: 5 }));
    }

    #[test]
    fn test_zero_demand_on_unscheduled_day_is_ignored() {
        let orchestrator = PlanningOrchestrator::new(FixedSolver(Ok(SolveOutcome::Infeasible)));
        let mut demand = DemandMap::new();
        demand.insert((5, "A".to_string()), 0.0);

        let outcome = orchestrator
            .run(&raw(), &demand, &PlanningOptions::default())
            .unwrap();
        assert!(outcome.is_infeasible());
    }

    #[test]
    fn test_full_value_vector_yields_report() {
        let params = ParameterDeriver::new()
            .derive_parameters(&raw(), &Default::default())
            .unwrap();
        let built = ModelBuilder::new()
            .build(&params, &DemandMap::new(), &Default::default())
            .unwrap();
        let solved = SolvedValues {
            values: vec![0.0; built.model.num_variables()],
            objective: 0.0,
        };
        let orchestrator = PlanningOrchestrator::new(FixedSolver(Ok(SolveOutcome::Solved(solved))))
            .with_config_snapshot(serde_json::json!({"dup_policy": "last"}));

        let outcome = orchestrator
            .run(&raw(), &DemandMap::new(), &PlanningOptions::default())
            .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.assignment_count, 0);
        assert!(report.config_snapshot.is_some());
    }

    #[test]
    fn test_invalid_solver_options_fail_before_solving() {
        let orchestrator = PlanningOrchestrator::new(FixedSolver(Ok(SolveOutcome::Infeasible)));
        let mut options = PlanningOptions::default();
        options.solver.time_limit_seconds = 0;
        let err = orchestrator
            .run(&raw(), &DemandMap::new(), &options)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSolverOptions(_)));
    }
}
