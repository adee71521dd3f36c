// ==========================================
// 箱型排产优化系统 - 核心库
// ==========================================
// 问题: 机台 × 箱型 × 日 × 班次 × 时段 的分配
// 目标: 满足需求前提下最小化总换型时间 (MILP)
// 流程: CSV 导入 → 参数派生 → 模型构建 → 求解 → 结果提取
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录、参数、选项与结果
pub mod domain;

// 引擎层 - 派生 / 建模 / 求解 / 提取
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BoxTypeId, Day, DupPolicy, MachineId, Segment, ShiftNo};

// 领域实体
pub use domain::{
    DemandMap, ModelOptions, PlanReport, PlanningOptions, PlanningParameters, RawRecordSet,
    SegmentLengthSpec, SolverOptions,
};

// 引擎
pub use engine::{
    EngineError, GoodLpSolver, MilpSolver, ModelBuilder, ParameterDeriver, PlanOutcome,
    PlanningOrchestrator, SolutionExtractor,
};

// 配置
pub use config::ConfigManager;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "箱型排产优化系统";
