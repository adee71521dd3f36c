// ==========================================
// 箱型排产优化系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照
// 存储: 扁平 key → value（JSON 对象文件）
// 口径: 缺失键回落默认值；存在但无法解析 → ConfigError::InvalidValue
//       重复处理策略 / 时段长度走引擎层解析，错误以 ConfigError::Engine 透出
// ==========================================

use crate::domain::options::{
    DerivationOptions, ModelOptions, PlanningOptions, SegmentLengthSpec, SolverOptions,
    DEFAULT_SHIFT_HOURS,
};
use crate::domain::types::DupPolicy;
use crate::engine::{parse_segment_length_spec, EngineError, ParameterDeriver};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    ReadError(String),

    #[error("配置文件格式错误: {0}")]
    ParseError(String),

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: HashMap<String, String>,
}

impl ConfigManager {
    /// 空配置（全部取默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 配置文件加载
    ///
    /// # 参数
    /// - path: 配置文件路径（顶层必须为对象）
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// 从 JSON 文本加载
    ///
    /// 字符串值原样保存，其余值保存其 JSON 文本（segment_length 等结构化配置）
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let root: Value =
            serde_json::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let Value::Object(map) = root else {
            return Err(ConfigError::ParseError("顶层必须为 JSON 对象".to_string()));
        };

        let values: HashMap<String, String> = map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();

        debug!(keys = values.len(), "配置加载完成");
        Ok(Self { values })
    }

    /// 覆写单个配置项
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// 读取原始配置值
    pub fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn parse_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                message: e.to_string(),
            }),
        }
    }

    // ===== 参数派生配置 =====

    /// 未知策略名 → ConfigError::Engine(InvalidPolicy)
    pub fn get_dup_policy(&self) -> ConfigResult<DupPolicy> {
        match self.get_config_value(config_keys::DUP_POLICY) {
            None => Ok(DupPolicy::Last),
            Some(raw) => Ok(ParameterDeriver::new().parse_dup_policy(raw.trim())?),
        }
    }

    pub fn get_zero_is_incompatible(&self) -> ConfigResult<bool> {
        self.parse_or_default(config_keys::ZERO_IS_INCOMPATIBLE, true)
    }

    pub fn get_min_productivity(&self) -> ConfigResult<f64> {
        self.parse_or_default(config_keys::MIN_PRODUCTIVITY, 0.0)
    }

    pub fn get_default_shift_hours(&self) -> ConfigResult<f64> {
        self.parse_or_default(config_keys::DEFAULT_SHIFT_HOURS, DEFAULT_SHIFT_HOURS)
    }

    // ===== 模型构建配置 =====

    pub fn get_enforce_compatibility(&self) -> ConfigResult<bool> {
        self.parse_or_default(config_keys::ENFORCE_COMPATIBILITY, true)
    }

    pub fn get_restrict_sequence_pairs(&self) -> ConfigResult<bool> {
        self.parse_or_default(config_keys::RESTRICT_SEQUENCE_PAIRS, true)
    }

    /// 时段长度口径（JSON 编码；缺失 → None 规则）
    ///
    /// JSON 语法错误 → InvalidValue；形态或取值非法 → Engine(InvalidSegmentLengthSpec)
    pub fn get_segment_length(&self) -> ConfigResult<SegmentLengthSpec> {
        let Some(raw) = self.get_config_value(config_keys::SEGMENT_LENGTH) else {
            return Ok(SegmentLengthSpec::None);
        };
        let value: Value = serde_json::from_str(raw).map_err(|e| ConfigError::InvalidValue {
            key: config_keys::SEGMENT_LENGTH.to_string(),
            value: raw.to_string(),
            message: e.to_string(),
        })?;
        Ok(parse_segment_length_spec(&value)?)
    }

    // ===== 求解器配置 =====

    pub fn get_time_limit_seconds(&self) -> ConfigResult<u64> {
        self.parse_or_default(config_keys::TIME_LIMIT_SECONDS, 60)
    }

    pub fn get_optimality_gap(&self) -> ConfigResult<f64> {
        self.parse_or_default(config_keys::OPTIMALITY_GAP, 0.01)
    }

    /// 汇总为一次排产运行的完整选项
    pub fn planning_options(&self) -> ConfigResult<PlanningOptions> {
        Ok(PlanningOptions {
            derivation: DerivationOptions {
                dup_policy: self.get_dup_policy()?,
                zero_is_incompatible: self.get_zero_is_incompatible()?,
                min_productivity: self.get_min_productivity()?,
                default_shift_hours: self.get_default_shift_hours()?,
            },
            model: ModelOptions {
                enforce_compatibility: self.get_enforce_compatibility()?,
                segment_length: self.get_segment_length()?,
                restrict_sequence_pairs_by_compatibility: self.get_restrict_sequence_pairs()?,
            },
            solver: SolverOptions {
                time_limit_seconds: self.get_time_limit_seconds()?,
                optimality_gap: self.get_optimality_gap()?,
            },
        })
    }

    /// 获取所有配置的快照（键有序，写入报告元数据）
    pub fn get_config_snapshot(&self) -> Value {
        let ordered: std::collections::BTreeMap<&String, &String> = self.values.iter().collect();
        json!(ordered)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 参数派生
    pub const DUP_POLICY: &str = "dup_policy";
    pub const ZERO_IS_INCOMPATIBLE: &str = "zero_is_incompatible";
    pub const MIN_PRODUCTIVITY: &str = "min_productivity";
    pub const DEFAULT_SHIFT_HOURS: &str = "default_shift_hours";

    // 模型构建
    pub const ENFORCE_COMPATIBILITY: &str = "enforce_compatibility";
    pub const RESTRICT_SEQUENCE_PAIRS: &str = "restrict_sequence_pairs_by_compatibility";
    pub const SEGMENT_LENGTH: &str = "segment_length"; // JSON

    // 求解器
    pub const TIME_LIMIT_SECONDS: &str = "time_limit_seconds";
    pub const OPTIMALITY_GAP: &str = "optimality_gap";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Segment;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_empty() {
        let config = ConfigManager::new();
        let options = config.planning_options().unwrap();
        assert_eq!(options, PlanningOptions::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dup_policy": "max", "zero_is_incompatible": false, "time_limit_seconds": 5,
                "segment_length": {{"1": 5.0, "2": 3.0}}, "optimality_gap": null}}"#
        )
        .unwrap();

        let config = ConfigManager::from_file(file.path()).unwrap();
        let options = config.planning_options().unwrap();
        assert_eq!(options.derivation.dup_policy, DupPolicy::Max);
        assert!(!options.derivation.zero_is_incompatible);
        assert_eq!(options.solver.time_limit_seconds, 5);
        assert_eq!(options.solver.optimality_gap, 0.01);
        match options.model.segment_length {
            SegmentLengthSpec::PerSegment(map) => assert_eq!(map.get(&Segment::Second), Some(&3.0)),
            other => panic!("unexpected segment length: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values_reported() {
        let mut config = ConfigManager::new();
        config.set(config_keys::SEGMENT_LENGTH, "\"half\"");
        assert!(matches!(
            config.get_segment_length(),
            Err(ConfigError::Engine(EngineError::InvalidSegmentLengthSpec(_)))
        ));

        config.set(config_keys::SEGMENT_LENGTH, "{\"1\": -4.0}");
        assert!(matches!(
            config.get_segment_length(),
            Err(ConfigError::Engine(EngineError::InvalidSegmentLengthSpec(_)))
        ));

        config.set(config_keys::SEGMENT_LENGTH, "{1: 4.0");
        assert!(matches!(
            config.get_segment_length(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "segment_length"
        ));

        config.set(config_keys::SEGMENT_LENGTH, "4.0");
        config.set(config_keys::TIME_LIMIT_SECONDS, "-3");
        assert!(matches!(
            config.planning_options(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "time_limit_seconds"
        ));
    }

    #[test]
    fn test_unknown_dup_policy_in_file_is_invalid_policy() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"dup_policy": "median"}}"#).unwrap();

        let config = ConfigManager::from_file(file.path()).unwrap();
        let err = config.planning_options().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Engine(EngineError::InvalidPolicy(ref name)) if name == "median"
        ));

        let mut config = ConfigManager::new();
        config.set(config_keys::DUP_POLICY, " MAX ");
        assert_eq!(config.get_dup_policy().unwrap(), DupPolicy::Max);
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(matches!(
            ConfigManager::from_json_str("[1, 2]"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_snapshot() {
        let mut config = ConfigManager::new();
        config.set("dup_policy", "min");
        let snapshot = config.get_config_snapshot();
        assert_eq!(snapshot["dup_policy"], "min");
    }
}
