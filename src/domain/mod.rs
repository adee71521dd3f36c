// ==========================================
// 箱型排产优化系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、参数表与运行选项
// 红线: 不含派生逻辑,不含模型构建逻辑
// ==========================================

pub mod options;
pub mod parameters;
pub mod records;
pub mod solution;
pub mod types;

// 重导出核心类型
pub use options::{
    DerivationOptions, ModelOptions, PlanningOptions, SegmentLengthSpec, SolverOptions,
    DEFAULT_SHIFT_HOURS,
};
pub use parameters::{
    AvailabilityMap, CompatibilityMap, DemandMap, PlanningParameters, PlanningSets,
    ProductivityMap, SegmentLengthMap, SetupMap, ShiftDurationMap, ShiftsPerDay,
};
pub use records::{
    AvailabilityRecord, DemandRecord, ProductivityRecord, RawRecordSet, SetupRecord,
    ShiftCountRecord, ShiftDurationRecord,
};
pub use solution::{
    AssignmentRow, DemandFulfillment, MachineUtilization, PlanReport, SetupEvent,
    SolutionSummary,
};
pub use types::{BoxTypeId, Day, DupPolicy, MachineId, Segment, ShiftNo};
