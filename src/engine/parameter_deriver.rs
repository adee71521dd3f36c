// ==========================================
// 箱型排产优化系统 - 参数派生引擎
// ==========================================
// 职责: 原始记录 → 规范集合 + 全量参数表
// 红线: 默认值口径只在本模块定义，模型构建层不做任何补默认
// ==========================================
// 默认值口径:
// - 可用性: M×D 全量，缺失或非 0/1 → 0
// - 产能: M×B 全量，缺失 → 0（不兼容）
// - 换型: 观测机台 × 观测箱型的同型切换补 0，其余缺失不补
// - 班次时长: 被班次计划引用但缺失的 (d,t) → 默认 8 小时
// ==========================================

use crate::domain::options::DerivationOptions;
use crate::domain::parameters::{
    AvailabilityMap, CompatibilityMap, PlanningParameters, PlanningSets, ProductivityMap,
    SetupMap, ShiftDurationMap, ShiftsPerDay,
};
use crate::domain::records::{
    AvailabilityRecord, ProductivityRecord, RawRecordSet, SetupRecord, ShiftCountRecord,
    ShiftDurationRecord,
};
use crate::domain::types::{BoxTypeId, Day, DupPolicy, MachineId};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// 产能派生结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProductivityDerivation {
    pub productivity: ProductivityMap,
    pub compatibility: CompatibilityMap,
    pub machines: Vec<MachineId>,
    pub box_types: Vec<BoxTypeId>,
}

// ==========================================
// ParameterDeriver - 参数派生引擎
// ==========================================
// 无状态，全部方法为输入的纯函数
pub struct ParameterDeriver;

impl Default for ParameterDeriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterDeriver {
    pub fn new() -> Self {
        Self
    }

    /// 解析重复处理策略名称
    pub fn parse_dup_policy(&self, name: &str) -> EngineResult<DupPolicy> {
        name.parse::<DupPolicy>()
            .map_err(|_| EngineError::InvalidPolicy(name.to_string()))
    }

    /// 派生每日班次列表
    ///
    /// # 规则
    /// - 日 → [1..k]，k 为该日声明的班次数
    /// - k ≤ 0 → 空列表（该日存在但无班次）
    /// - 同一日重复出现 → 以末条为准
    /// - 班次数缺失 → MissingSchedule
    pub fn derive_shifts_per_day(&self, records: &[ShiftCountRecord]) -> EngineResult<ShiftsPerDay> {
        let mut shifts_per_day = ShiftsPerDay::new();
        for record in records {
            let count = record
                .shift_count
                .ok_or(EngineError::MissingSchedule { day: record.day })?;
            let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
            shifts_per_day.insert(record.day, (1..=count).collect());
        }
        Ok(shifts_per_day)
    }

    /// 派生每日班次列表，并校验指定的每一日都有记录
    pub fn derive_shifts_per_day_for(
        &self,
        records: &[ShiftCountRecord],
        days: &[Day],
    ) -> EngineResult<ShiftsPerDay> {
        let shifts_per_day = self.derive_shifts_per_day(records)?;
        if let Some(&day) = days.iter().find(|day| !shifts_per_day.contains_key(day)) {
            return Err(EngineError::MissingSchedule { day });
        }
        Ok(shifts_per_day)
    }

    /// 派生可用性全量表
    ///
    /// # 规则
    /// - 先以 M×D 全 0 打底
    /// - 仅覆写 m∈M 且 d∈D 的记录
    /// - 非数值或不是干净的 0/1 → 0
    pub fn derive_availability(
        &self,
        records: &[AvailabilityRecord],
        machines: &[MachineId],
        days: &[Day],
    ) -> AvailabilityMap {
        let mut availability: AvailabilityMap = machines
            .iter()
            .flat_map(|m| days.iter().map(move |&d| ((m.clone(), d), 0u8)))
            .collect();

        for record in records {
            let Some(day) = record.day else {
                continue;
            };
            let key = (record.machine.trim().to_string(), day);
            if let Some(slot) = availability.get_mut(&key) {
                *slot = match record.availability {
                    Some(v) if v == 1.0 => 1,
                    _ => 0,
                };
            }
        }

        availability
    }

    /// 派生换型时间表
    ///
    /// # 规则
    /// - 以换型数据源自身观测到的机台/箱型为域
    /// - 同型切换 (b→b) 未显式给出时补 0
    /// - 其余缺失三元组不补（模型构建层跳过）
    /// - 换型小时数非数值的行忽略
    pub fn derive_setup(&self, records: &[SetupRecord]) -> SetupMap {
        let mut setup = SetupMap::new();
        let mut machines = BTreeSet::new();
        let mut box_types = BTreeSet::new();

        for record in records {
            let machine = record.machine.trim().to_string();
            let from = record.from_box_type.trim().to_string();
            let to = record.to_box_type.trim().to_string();

            machines.insert(machine.clone());
            box_types.insert(from.clone());
            box_types.insert(to.clone());

            match record.hours {
                Some(hours) if hours.is_finite() => {
                    setup.insert((machine, from, to), hours.max(0.0));
                }
                _ => debug!(machine = %machine, from = %from, to = %to, "换型小时数无效，忽略该行"),
            }
        }

        for machine in &machines {
            for box_type in &box_types {
                setup
                    .entry((machine.clone(), box_type.clone(), box_type.clone()))
                    .or_insert(0.0);
            }
        }

        setup
    }

    /// 派生班次时长
    ///
    /// # 规则
    /// - 日/班次/时长任一缺失 → 丢弃
    /// - 时长 ≤ 0 → 丢弃
    /// - 同一 (d,t) 保留末条
    pub fn derive_shift_duration(&self, records: &[ShiftDurationRecord]) -> ShiftDurationMap {
        let mut durations = ShiftDurationMap::new();
        for record in records {
            if let (Some(day), Some(shift), Some(hours)) = (record.day, record.shift, record.hours) {
                if hours.is_finite() && hours > 0.0 {
                    durations.insert((day, shift), hours);
                }
            }
        }
        durations
    }

    /// 补齐班次时长：班次计划引用的每个 (d,t) 都有取值
    pub fn fill_shift_durations(
        &self,
        durations: &ShiftDurationMap,
        shifts_per_day: &ShiftsPerDay,
        default_hours: f64,
    ) -> ShiftDurationMap {
        let mut filled = durations.clone();
        for (&day, shifts) in shifts_per_day {
            for &shift in shifts {
                filled.entry((day, shift)).or_insert(default_hours);
            }
        }
        filled
    }

    /// 派生产能与兼容性
    ///
    /// # 规则
    /// 1. 产能非数值 → 0
    /// 2. 重复 (m,b) 按 dup_policy 归并
    /// 3. 负值截为 0；(0, min_productivity) 抬升至 min_productivity
    /// 4. zero_is_incompatible 时兼容 ⇔ 产能 > 0，否则一律兼容
    /// 5. M×B 全量补齐，缺失产能 → 0
    #[instrument(skip(self, records), fields(records = records.len(), policy = %dup_policy))]
    pub fn derive_productivity_and_compatibility(
        &self,
        records: &[ProductivityRecord],
        dup_policy: DupPolicy,
        zero_is_incompatible: bool,
        min_productivity: f64,
    ) -> ProductivityDerivation {
        // (m,b) → 出现顺序下的全部取值
        let mut grouped: BTreeMap<(MachineId, BoxTypeId), Vec<f64>> = BTreeMap::new();
        for record in records {
            let value = record.productivity.filter(|v| v.is_finite()).unwrap_or(0.0);
            grouped
                .entry((record.machine.trim().to_string(), record.box_type.trim().to_string()))
                .or_default()
                .push(value);
        }

        let machines: Vec<MachineId> = grouped
            .keys()
            .map(|(m, _)| m.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let box_types: Vec<BoxTypeId> = grouped
            .keys()
            .map(|(_, b)| b.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut productivity = ProductivityMap::new();
        let mut compatibility = CompatibilityMap::new();

        for (key, values) in grouped {
            let mut rate = resolve_duplicates(&values, dup_policy).max(0.0);
            if rate > 0.0 && rate < min_productivity {
                rate = min_productivity;
            }
            compatibility.insert(key.clone(), !zero_is_incompatible || rate > 0.0);
            productivity.insert(key, rate);
        }

        for machine in &machines {
            for box_type in &box_types {
                let key = (machine.clone(), box_type.clone());
                productivity.entry(key.clone()).or_insert(0.0);
                compatibility.entry(key).or_insert(!zero_is_incompatible);
            }
        }

        ProductivityDerivation {
            productivity,
            compatibility,
            machines,
            box_types,
        }
    }

    /// 一次性派生全部集合与参数
    ///
    /// # 顺序
    /// 1. 产能 → M, B
    /// 2. 班次计划 → D（班次数据源中的日，有序）
    /// 3. 可用性（M×D 全量）
    /// 4. 换型
    /// 5. 班次时长 + 补齐
    #[instrument(skip(self, raw, options), fields(total_records = raw.total_records()))]
    pub fn derive_parameters(
        &self,
        raw: &RawRecordSet,
        options: &DerivationOptions,
    ) -> EngineResult<PlanningParameters> {
        let prod = self.derive_productivity_and_compatibility(
            &raw.productivity,
            options.dup_policy,
            options.zero_is_incompatible,
            options.min_productivity,
        );

        let shifts_per_day = self.derive_shifts_per_day(&raw.shift_counts)?;
        let days: Vec<Day> = shifts_per_day.keys().copied().collect();

        let availability = self.derive_availability(&raw.availability, &prod.machines, &days);
        let setup = self.derive_setup(&raw.setup);
        let durations = self.derive_shift_duration(&raw.shift_durations);
        let shift_duration =
            self.fill_shift_durations(&durations, &shifts_per_day, options.default_shift_hours);

        debug!(
            machines = prod.machines.len(),
            box_types = prod.box_types.len(),
            days = days.len(),
            setup_entries = setup.len(),
            "参数派生完成"
        );

        Ok(PlanningParameters {
            sets: PlanningSets {
                machines: prod.machines,
                box_types: prod.box_types,
                days,
                shifts_per_day,
            },
            availability,
            productivity: prod.productivity,
            compatibility: prod.compatibility,
            setup,
            shift_duration,
        })
    }

    /// 跨数据源一致性检查（仅告警，不阻断）
    pub fn check_consistency(&self, raw: &RawRecordSet) -> Vec<String> {
        let availability_machines: BTreeSet<String> = raw
            .availability
            .iter()
            .map(|r| r.machine.trim().to_string())
            .collect();
        let productivity_machines: BTreeSet<String> = raw
            .productivity
            .iter()
            .map(|r| r.machine.trim().to_string())
            .collect();

        let mut warnings = Vec::new();

        let only_availability: Vec<&String> = availability_machines
            .difference(&productivity_machines)
            .collect();
        if !only_availability.is_empty() {
            warnings.push(format!(
                "机台在可用性中出现但缺少产能记录: {:?}",
                only_availability
            ));
        }

        let only_productivity: Vec<&String> = productivity_machines
            .difference(&availability_machines)
            .collect();
        if !only_productivity.is_empty() {
            warnings.push(format!(
                "机台有产能记录但缺少可用性记录（将视为全程不可用）: {:?}",
                only_productivity
            ));
        }

        for message in &warnings {
            warn!("{}", message);
        }
        warnings
    }
}

/// 按策略归并重复取值（values 至少一个元素，按出现顺序）
fn resolve_duplicates(values: &[f64], policy: DupPolicy) -> f64 {
    match policy {
        DupPolicy::First => values.first().copied().unwrap_or(0.0),
        DupPolicy::Last => values.last().copied().unwrap_or(0.0),
        DupPolicy::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        DupPolicy::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        DupPolicy::Mean => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
    }
}
