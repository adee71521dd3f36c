// ==========================================
// 箱型排产优化系统 - 运行选项
// ==========================================
// 职责: 参数派生选项 / 模型构建选项 / 求解器控制参数
// ==========================================

use crate::domain::types::{Day, DupPolicy, Segment, ShiftNo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 班次时长缺失时的默认值（小时）
pub const DEFAULT_SHIFT_HOURS: f64 = 8.0;

// ==========================================
// DerivationOptions - 参数派生选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationOptions {
    pub dup_policy: DupPolicy,        // 重复 (机台, 箱型) 的取值口径
    pub zero_is_incompatible: bool,   // 产能为 0 视为不兼容
    pub min_productivity: f64,        // (0, min) 区间的产能抬升至 min
    pub default_shift_hours: f64,     // 班次时长缺失时的默认值
}

impl Default for DerivationOptions {
    fn default() -> Self {
        Self {
            dup_policy: DupPolicy::Last,
            zero_is_incompatible: true,
            min_productivity: 0.0,
            default_shift_hours: DEFAULT_SHIFT_HOURS,
        }
    }
}

// ==========================================
// SegmentLengthSpec - 时段长度口径
// ==========================================
// 五种形态，在模型构建入口一次性分派
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SegmentLengthSpec {
    /// 班次时长 / 2
    #[default]
    None,
    /// 所有 (d,t,s) 统一取值
    Scalar(f64),
    /// 按时段广播到全部 (d,t)
    PerSegment(BTreeMap<Segment, f64>),
    /// 按班次平分到两个时段
    PerShift(BTreeMap<(Day, ShiftNo), f64>),
    /// 逐 (d,t,s) 指定
    PerSegmentPerShift(BTreeMap<(Day, ShiftNo, Segment), f64>),
}

impl SegmentLengthSpec {
    /// 从 JSON 值识别形态
    ///
    /// # 规则
    /// - null → None
    /// - 数值 → Scalar
    /// - 对象，键形如 "1"/"2" → PerSegment
    /// - 对象，键形如 "d,t" → PerShift
    /// - 对象，键形如 "d,t,s" → PerSegmentPerShift
    /// - 其他（字符串、数组、空对象、混合键、非数值取值）→ Err
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(SegmentLengthSpec::None),
            Value::Number(n) => n
                .as_f64()
                .map(SegmentLengthSpec::Scalar)
                .ok_or_else(|| format!("时段长度数值无法解析: {}", n)),
            Value::Object(entries) => {
                if entries.is_empty() {
                    return Err("时段长度映射为空，无法识别形态".to_string());
                }

                let mut parsed: Vec<(Vec<u32>, f64)> = Vec::with_capacity(entries.len());
                for (key, raw) in entries {
                    let hours = raw
                        .as_f64()
                        .ok_or_else(|| format!("时段长度取值必须为数值: key={}, value={}", key, raw))?;
                    let parts = key
                        .split(',')
                        .map(|p| p.trim().parse::<u32>())
                        .collect::<Result<Vec<u32>, _>>()
                        .map_err(|_| format!("时段长度键格式错误: {}", key))?;
                    parsed.push((parts, hours));
                }

                let arity = parsed[0].0.len();
                if parsed.iter().any(|(parts, _)| parts.len() != arity) {
                    return Err("时段长度映射的键形态不一致".to_string());
                }

                match arity {
                    1 => {
                        let mut map = BTreeMap::new();
                        for (parts, hours) in parsed {
                            map.insert(to_segment(parts[0])?, hours);
                        }
                        Ok(SegmentLengthSpec::PerSegment(map))
                    }
                    2 => Ok(SegmentLengthSpec::PerShift(
                        parsed
                            .into_iter()
                            .map(|(parts, hours)| ((parts[0], parts[1]), hours))
                            .collect(),
                    )),
                    3 => {
                        let mut map = BTreeMap::new();
                        for (parts, hours) in parsed {
                            map.insert((parts[0], parts[1], to_segment(parts[2])?), hours);
                        }
                        Ok(SegmentLengthSpec::PerSegmentPerShift(map))
                    }
                    other => Err(format!("时段长度键包含 {} 个分量，仅支持 1/2/3", other)),
                }
            }
            other => Err(format!("不支持的时段长度形态: {}", other)),
        }
    }
}

fn to_segment(index: u32) -> Result<Segment, String> {
    u8::try_from(index)
        .ok()
        .and_then(Segment::from_index)
        .ok_or_else(|| format!("非法时段编号: {}（仅支持 1/2）", index))
}

// ==========================================
// ModelOptions - 模型构建选项
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    pub enforce_compatibility: bool,                    // 不兼容 (机台, 箱型) 强制 x=0
    pub segment_length: SegmentLengthSpec,              // 时段长度口径
    pub restrict_sequence_pairs_by_compatibility: bool, // 仅为兼容箱型对创建 w
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            enforce_compatibility: true,
            segment_length: SegmentLengthSpec::None,
            restrict_sequence_pairs_by_compatibility: true,
        }
    }
}

// ==========================================
// SolverOptions - 求解器控制参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub time_limit_seconds: u64, // 求解时限（秒，> 0）
    pub optimality_gap: f64,     // 相对最优间隙 [0, 1)
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit_seconds: 60,
            optimality_gap: 0.01,
        }
    }
}

// ==========================================
// PlanningOptions - 单次排产运行的完整选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanningOptions {
    pub derivation: DerivationOptions,
    pub model: ModelOptions,
    pub solver: SolverOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalar_and_null() {
        assert_eq!(SegmentLengthSpec::from_json(&Value::Null).unwrap(), SegmentLengthSpec::None);
        assert_eq!(
            SegmentLengthSpec::from_json(&json!(3.5)).unwrap(),
            SegmentLengthSpec::Scalar(3.5)
        );
    }

    #[test]
    fn test_from_json_map_shapes() {
        let per_segment = SegmentLengthSpec::from_json(&json!({"1": 5.0, "2": 3.0})).unwrap();
        match per_segment {
            SegmentLengthSpec::PerSegment(map) => {
                assert_eq!(map.get(&Segment::First), Some(&5.0));
                assert_eq!(map.get(&Segment::Second), Some(&3.0));
            }
            other => panic!("期望 PerSegment, 实际 {:?}", other),
        }

        let per_shift = SegmentLengthSpec::from_json(&json!({"1,1": 10.0, "2, 1": 6.0})).unwrap();
        match per_shift {
            SegmentLengthSpec::PerShift(map) => {
                assert_eq!(map.get(&(1, 1)), Some(&10.0));
                assert_eq!(map.get(&(2, 1)), Some(&6.0));
            }
            other => panic!("期望 PerShift, 实际 {:?}", other),
        }

        let full = SegmentLengthSpec::from_json(&json!({"1,1,2": 2.5})).unwrap();
        match full {
            SegmentLengthSpec::PerSegmentPerShift(map) => {
                assert_eq!(map.get(&(1, 1, Segment::Second)), Some(&2.5));
            }
            other => panic!("期望 PerSegmentPerShift, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        assert!(SegmentLengthSpec::from_json(&json!("4h")).is_err());
        assert!(SegmentLengthSpec::from_json(&json!([4.0, 4.0])).is_err());
        assert!(SegmentLengthSpec::from_json(&json!({})).is_err());
        assert!(SegmentLengthSpec::from_json(&json!({"3": 4.0})).is_err());
        assert!(SegmentLengthSpec::from_json(&json!({"1": 4.0, "1,1": 4.0})).is_err());
        assert!(SegmentLengthSpec::from_json(&json!({"1": "four"})).is_err());
        assert!(SegmentLengthSpec::from_json(&json!({"1,2,3,4": 1.0})).is_err());
    }
}
