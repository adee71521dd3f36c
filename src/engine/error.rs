// ==========================================
// 箱型排产优化系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 数据形态错误 / 调用契约违反 / 求解器致命错误
// 说明: 不可行/无界属于正常结果，不在此处建模
// ==========================================

use crate::domain::types::{Day, MachineId, ShiftNo};
use crate::engine::solver::SolverError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 数据形态错误（构建任何变量之前失败）=====
    #[error("班次计划缺失: day={day}")]
    MissingSchedule { day: Day },

    #[error("无效的重复处理策略: {0}")]
    InvalidPolicy(String),

    #[error("无效的时段长度口径: {0}")]
    InvalidSegmentLengthSpec(String),

    // ===== 调用契约违反 =====
    #[error("可用性表未全量覆盖: machine={machine}, day={day}")]
    MissingAvailabilityKey { machine: MachineId, day: Day },

    #[error("班次时长缺失: day={day}, shift={shift}")]
    MissingShiftDuration { day: Day, shift: ShiftNo },

    #[error("无效的求解器参数: {0}")]
    InvalidSolverOptions(String),

    // ===== 求解器致命错误 =====
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
