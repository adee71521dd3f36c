// ==========================================
// 箱型排产优化系统 - 引擎层
// ==========================================
// 职责: 参数派生 / 模型构建 / 求解适配 / 结果提取
// 红线: 引擎纯计算，不做文件 I/O；不可行属于正常结果
// ==========================================

pub mod constraint_model;
pub mod error;
pub mod model_builder;
pub mod orchestrator;
pub mod parameter_deriver;
pub mod segment_length;
pub mod solution_extractor;
pub mod solver;

// 重导出核心引擎
pub use constraint_model::{
    ConstraintModel, ConstraintSense, LinearConstraint, LinearExpr, VarId, VarKind, VariableDef,
};
pub use error::{EngineError, EngineResult};
pub use model_builder::{
    is_sequence_pair_eligible, BuiltModel, ModelBuilder, ModelStats, VariableIndex,
};
pub use orchestrator::{PlanOutcome, PlanningOrchestrator};
pub use parameter_deriver::{ParameterDeriver, ProductivityDerivation};
pub use segment_length::{parse_segment_length_spec, resolve_segment_lengths};
pub use solution_extractor::SolutionExtractor;
pub use solver::{
    validate_solver_options, GoodLpSolver, MilpSolver, SolveOutcome, SolvedValues, SolverError,
};
