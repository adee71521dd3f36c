// ==========================================
// 箱型排产优化系统 - 时段长度解析
// ==========================================
// 职责: SegmentLengthSpec → (d,t,s) 全量时段长度表
// 规则:
// - None               → 班次时长 / 2
// - Scalar(v)          → v
// - PerSegment         → 按时段广播，缺失时段回落 None 规则
// - PerShift           → 班次值平分两段，未覆盖班次回落 None 规则
// - PerSegmentPerShift → 直接取值，缺失条目回落 None 规则
// ==========================================

use crate::domain::options::SegmentLengthSpec;
use crate::domain::parameters::{SegmentLengthMap, ShiftDurationMap, ShiftsPerDay};
use crate::domain::types::{Day, Segment, ShiftNo};
use crate::engine::error::{EngineError, EngineResult};
use serde_json::Value;

/// 从 JSON 值解析时段长度口径（形态错误或取值非法 → InvalidSegmentLengthSpec）
pub fn parse_segment_length_spec(value: &Value) -> EngineResult<SegmentLengthSpec> {
    let rule = SegmentLengthSpec::from_json(value).map_err(EngineError::InvalidSegmentLengthSpec)?;
    validate(&rule)?;
    Ok(rule)
}

/// 解析全部 (d,t,s) 的时段长度
///
/// # 参数
/// - rule: 时段长度口径
/// - shifts_per_day: 每日班次
/// - shift_duration: 已补齐的班次时长
///
/// # 错误
/// - 取值为负或非有限数 → InvalidSegmentLengthSpec
/// - 被引用的 (d,t) 缺少班次时长 → MissingShiftDuration
pub fn resolve_segment_lengths(
    rule: &SegmentLengthSpec,
    shifts_per_day: &ShiftsPerDay,
    shift_duration: &ShiftDurationMap,
) -> EngineResult<SegmentLengthMap> {
    validate(rule)?;

    let mut lengths = SegmentLengthMap::new();
    for (&day, shifts) in shifts_per_day {
        for &shift in shifts {
            let duration = shift_duration
                .get(&(day, shift))
                .copied()
                .ok_or(EngineError::MissingShiftDuration { day, shift })?;
            let half = duration / Segment::ALL.len() as f64;

            for segment in Segment::ALL {
                let hours = resolve_one(rule, day, shift, segment).unwrap_or(half);
                lengths.insert((day, shift, segment), hours);
            }
        }
    }

    Ok(lengths)
}

/// 单个 (d,t,s) 的显式取值；None 表示回落到"班次时长 / 2"
fn resolve_one(rule: &SegmentLengthSpec, day: Day, shift: ShiftNo, segment: Segment) -> Option<f64> {
    match rule {
        SegmentLengthSpec::None => None,
        SegmentLengthSpec::Scalar(v) => Some(*v),
        SegmentLengthSpec::PerSegment(map) => map.get(&segment).copied(),
        SegmentLengthSpec::PerShift(map) => map
            .get(&(day, shift))
            .map(|hours| hours / Segment::ALL.len() as f64),
        SegmentLengthSpec::PerSegmentPerShift(map) => map.get(&(day, shift, segment)).copied(),
    }
}

fn validate(rule: &SegmentLengthSpec) -> EngineResult<()> {
    let values: Vec<f64> = match rule {
        SegmentLengthSpec::None => Vec::new(),
        SegmentLengthSpec::Scalar(v) => vec![*v],
        SegmentLengthSpec::PerSegment(map) => map.values().copied().collect(),
        SegmentLengthSpec::PerShift(map) => map.values().copied().collect(),
        SegmentLengthSpec::PerSegmentPerShift(map) => map.values().copied().collect(),
    };

    match values.into_iter().find(|v| !v.is_finite() || *v < 0.0) {
        Some(bad) => Err(EngineError::InvalidSegmentLengthSpec(format!(
            "时段长度必须为非负有限数，实际 {}",
            bad
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn fixture() -> (ShiftsPerDay, ShiftDurationMap) {
        let mut shifts = ShiftsPerDay::new();
        shifts.insert(1, vec![1, 2]);
        shifts.insert(2, vec![1]);

        let mut durations = ShiftDurationMap::new();
        durations.insert((1, 1), 8.0);
        durations.insert((1, 2), 6.0);
        durations.insert((2, 1), 10.0);
        (shifts, durations)
    }

    #[test]
    fn test_none_halves_shift_duration() {
        let (shifts, durations) = fixture();
        let lengths = resolve_segment_lengths(&SegmentLengthSpec::None, &shifts, &durations).unwrap();

        assert_eq!(lengths.len(), 6);
        assert_eq!(lengths[&(1, 1, Segment::First)], 4.0);
        assert_eq!(lengths[&(1, 2, Segment::Second)], 3.0);
        assert_eq!(lengths[&(2, 1, Segment::First)], 5.0);
    }

    #[test]
    fn test_scalar_applies_everywhere() {
        let (shifts, durations) = fixture();
        let lengths =
            resolve_segment_lengths(&SegmentLengthSpec::Scalar(2.5), &shifts, &durations).unwrap();
        assert!(lengths.values().all(|&v| v == 2.5));
    }

    #[test]
    fn test_per_segment_broadcasts_and_falls_back() {
        let (shifts, durations) = fixture();
        let mut map = BTreeMap::new();
        map.insert(Segment::First, 5.0);
        let lengths =
            resolve_segment_lengths(&SegmentLengthSpec::PerSegment(map), &shifts, &durations).unwrap();

        assert_eq!(lengths[&(1, 1, Segment::First)], 5.0);
        assert_eq!(lengths[&(2, 1, Segment::First)], 5.0);
        // 未给出的时段回落到班次时长 / 2
        assert_eq!(lengths[&(1, 2, Segment::Second)], 3.0);
    }

    #[test]
    fn test_per_shift_splits_evenly() {
        let (shifts, durations) = fixture();
        let mut map = BTreeMap::new();
        map.insert((1, 1), 12.0);
        let lengths =
            resolve_segment_lengths(&SegmentLengthSpec::PerShift(map), &shifts, &durations).unwrap();

        assert_eq!(lengths[&(1, 1, Segment::First)], 6.0);
        assert_eq!(lengths[&(1, 1, Segment::Second)], 6.0);
        assert_eq!(lengths[&(2, 1, Segment::Second)], 5.0);
    }

    #[test]
    fn test_per_segment_per_shift_direct_with_fallback() {
        let (shifts, durations) = fixture();
        let mut map = BTreeMap::new();
        map.insert((1, 2, Segment::First), 1.0);
        let lengths = resolve_segment_lengths(
            &SegmentLengthSpec::PerSegmentPerShift(map),
            &shifts,
            &durations,
        )
        .unwrap();

        assert_eq!(lengths[&(1, 2, Segment::First)], 1.0);
        assert_eq!(lengths[&(1, 2, Segment::Second)], 3.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let (shifts, durations) = fixture();
        let err = resolve_segment_lengths(&SegmentLengthSpec::Scalar(-1.0), &shifts, &durations)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSegmentLengthSpec(_)));

        let err = resolve_segment_lengths(&SegmentLengthSpec::Scalar(f64::NAN), &shifts, &durations)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSegmentLengthSpec(_)));

        let err = parse_segment_length_spec(&json!("half")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSegmentLengthSpec(_)));

        let err = parse_segment_length_spec(&json!({"1": -2.0, "2": 3.0})).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSegmentLengthSpec(_)));
    }

    #[test]
    fn test_missing_duration_is_contract_violation() {
        let (shifts, mut durations) = fixture();
        durations.remove(&(2, 1));
        let err = resolve_segment_lengths(&SegmentLengthSpec::None, &shifts, &durations).unwrap_err();
        assert!(matches!(err, EngineError::MissingShiftDuration { day: 2, shift: 1 }));
    }
}
