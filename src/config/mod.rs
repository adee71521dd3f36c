// ==========================================
// 箱型排产优化系统 - 配置层
// ==========================================
// 职责: 运行配置管理，缺失项回落默认值
// 存储: JSON 对象文件（扁平 key → value）
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager, ConfigResult};
