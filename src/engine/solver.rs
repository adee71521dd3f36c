// ==========================================
// 箱型排产优化系统 - 求解器适配层
// ==========================================
// 职责: ConstraintModel → MILP 后端 → 变量取值
// 契约: 不可行/无界为正常结果；超时/后端异常为致命错误
// 后端: good_lp + microlp（纯 Rust，分支定界求精确最优）
// ==========================================

use crate::domain::options::SolverOptions;
use crate::engine::constraint_model::{ConstraintModel, ConstraintSense, LinearExpr, VarId, VarKind};
use crate::engine::error::{EngineError, EngineResult};
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// 求解器致命错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("求解器后端错误: {0}")]
    Backend(String),

    #[error("求解超时: 时限 {seconds} 秒内未得到结果")]
    TimedOut { seconds: u64 },

    #[error("求解结果变量数不匹配: 期望 {expected}, 实际 {actual}")]
    MalformedResult { expected: usize, actual: usize },

    #[error("求解线程异常退出")]
    WorkerDisconnected,
}

/// 求解得到的变量取值（下标与 ConstraintModel 变量表一致）
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedValues {
    pub values: Vec<f64>,
    pub objective: f64,
}

impl SolvedValues {
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }
}

/// 求解结果
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(SolvedValues),
    Infeasible,
    Unbounded,
}

/// 校验求解参数
pub fn validate_solver_options(options: &SolverOptions) -> EngineResult<()> {
    if options.time_limit_seconds == 0 {
        return Err(EngineError::InvalidSolverOptions(
            "time_limit_seconds 必须大于 0".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&options.optimality_gap) {
        return Err(EngineError::InvalidSolverOptions(format!(
            "optimality_gap 必须位于 [0, 1)，实际 {}",
            options.optimality_gap
        )));
    }
    Ok(())
}

// ==========================================
// MilpSolver Trait
// ==========================================
pub trait MilpSolver {
    /// 求解最小化模型
    fn solve(&self, model: &ConstraintModel, options: &SolverOptions) -> Result<SolveOutcome, SolverError>;

    /// 后端名称（日志用）
    fn name(&self) -> &str;
}

// ==========================================
// GoodLpSolver - good_lp 默认后端
// ==========================================
/// good_lp + microlp 求解器
///
/// 后端在独立线程中运行，调用方按 `time_limit_seconds` 等待。
/// 超时后返回 `SolverError::TimedOut`，但 microlp 不支持中断，
/// 后台线程会继续求解直到自然结束，其结果被丢弃。
/// 批量运行大量场景时，超时实例会持续占用 CPU，应控制并发数或调小模型规模。
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MilpSolver for GoodLpSolver {
    #[instrument(skip_all, fields(
        model = model.name(),
        vars = model.num_variables(),
        constraints = model.num_constraints()
    ))]
    fn solve(&self, model: &ConstraintModel, options: &SolverOptions) -> Result<SolveOutcome, SolverError> {
        let started = Instant::now();
        let (tx, rx) = mpsc::channel();
        let owned = model.clone();

        // 后端在独立线程运行，主线程按时限等待
        thread::spawn(move || {
            let _ = tx.send(solve_with_good_lp(&owned));
        });

        let outcome = match rx.recv_timeout(Duration::from_secs(options.time_limit_seconds)) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(seconds = options.time_limit_seconds, "求解超时，放弃后端线程");
                return Err(SolverError::TimedOut {
                    seconds: options.time_limit_seconds,
                });
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(SolverError::WorkerDisconnected),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            SolveOutcome::Solved(solved) => {
                info!(objective = solved.objective, elapsed_ms, "求解完成");
            }
            SolveOutcome::Infeasible => info!(elapsed_ms, "模型不可行"),
            SolveOutcome::Unbounded => info!(elapsed_ms, "模型无界"),
        }
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "good_lp/microlp"
    }
}

/// 将抽象模型翻译为 good_lp 问题并求解
fn solve_with_good_lp(model: &ConstraintModel) -> Result<SolveOutcome, SolverError> {
    let mut problem = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|def| {
            let mut var_def = variable().name(def.name.clone());
            var_def = match def.kind {
                VarKind::Binary => var_def.binary(),
                VarKind::Continuous => var_def.min(def.lower),
            };
            if let (VarKind::Continuous, Some(upper)) = (def.kind, def.upper) {
                var_def = var_def.max(upper);
            }
            problem.add(var_def)
        })
        .collect();

    let to_expression = |expr: &LinearExpr| {
        let mut out = Expression::from(0.0);
        for &(var, coef) in expr.terms() {
            out += coef * handles[var.index()];
        }
        out
    };

    let mut lp = problem
        .minimise(to_expression(model.objective()))
        .using(default_solver);

    for c in model.constraints() {
        let lhs = to_expression(&c.expr);
        let rhs = c.rhs;
        lp = match c.sense {
            ConstraintSense::LessEq => lp.with(constraint!(lhs <= rhs)),
            ConstraintSense::GreaterEq => lp.with(constraint!(lhs >= rhs)),
            ConstraintSense::Equal => lp.with(constraint!(lhs == rhs)),
        };
    }
    debug!(constraints = model.num_constraints(), "约束已装载");

    match lp.solve() {
        Ok(solution) => {
            let values: Vec<f64> = handles.iter().map(|&v| solution.value(v)).collect();
            let objective = model.objective().evaluate(&values);
            Ok(SolveOutcome::Solved(SolvedValues { values, objective }))
        }
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Ok(SolveOutcome::Unbounded),
        Err(other) => Err(SolverError::Backend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_solver_options() {
        assert!(validate_solver_options(&SolverOptions::default()).is_ok());

        let zero_time = SolverOptions {
            time_limit_seconds: 0,
            ..SolverOptions::default()
        };
        assert!(matches!(
            validate_solver_options(&zero_time),
            Err(EngineError::InvalidSolverOptions(_))
        ));

        for gap in [-0.1, 1.0, 1.5, f64::NAN] {
            let bad_gap = SolverOptions {
                optimality_gap: gap,
                ..SolverOptions::default()
            };
            assert!(
                matches!(validate_solver_options(&bad_gap), Err(EngineError::InvalidSolverOptions(_))),
                "gap={} 应被拒绝",
                gap
            );
        }

        let edge_gap = SolverOptions {
            optimality_gap: 0.0,
            ..SolverOptions::default()
        };
        assert!(validate_solver_options(&edge_gap).is_ok());
    }

    #[test]
    fn test_solves_small_mixed_integer_model() {
        // min y  s.t. y ≥ 2.5x, x = 1, y ≥ 0
        let mut model = ConstraintModel::new("small");
        let x = model.add_binary("x");
        let y = model.add_continuous("y", 0.0, None);
        model.add_constraint(
            "link",
            LinearExpr::new().term(y, 1.0).term(x, -2.5),
            ConstraintSense::GreaterEq,
            0.0,
        );
        model.add_constraint("fix", LinearExpr::new().term(x, 1.0), ConstraintSense::Equal, 1.0);
        model.minimize(LinearExpr::new().term(y, 1.0));

        let outcome = GoodLpSolver::new().solve(&model, &SolverOptions::default()).unwrap();
        let SolveOutcome::Solved(solved) = outcome else {
            panic!("应得到最优解");
        };
        assert!((solved.objective - 2.5).abs() < 1e-6);
        assert!((solved.value(x).unwrap() - 1.0).abs() < 1e-6);
        assert!(model.violations(&solved.values, 1e-6).is_empty());
    }

    #[test]
    fn test_reports_infeasible_as_outcome() {
        let mut model = ConstraintModel::new("infeasible");
        let y = model.add_continuous("y", 0.0, Some(1.0));
        model.add_constraint("need", LinearExpr::new().term(y, 1.0), ConstraintSense::GreaterEq, 5.0);
        model.minimize(LinearExpr::new().term(y, 1.0));

        let outcome = GoodLpSolver::new().solve(&model, &SolverOptions::default()).unwrap();
        assert_eq!(outcome, SolveOutcome::Infeasible);
    }

    #[test]
    fn test_solved_values_lookup() {
        let mut model = ConstraintModel::new("lookup");
        let a = model.add_binary("a");
        let solved = SolvedValues {
            values: vec![1.0],
            objective: 0.0,
        };
        assert_eq!(solved.value(a), Some(1.0));
    }
}
