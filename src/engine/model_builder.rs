// ==========================================
// 箱型排产优化系统 - 约束模型构建引擎
// ==========================================
// 职责: 集合 + 参数 + 需求 + 选项 → 抽象约束模型
// 红线: 不补默认值（可用性/班次时长缺失即调用契约违反）
// ==========================================
// 变量:
// - x(m,b,d,t,s) ∈ {0,1}  分配指示
// - y(m,b,d,t,s) ≥ 0      生产小时
// - T(m,d,t)     ≥ 0      换型小时
// - w(m,b1,b2,d,t) ∈ [0,1] 时段 1 做 b1 且时段 2 做 b2（仅合格箱型对）
// 约束:
// - 需求 / 产能 / 关联 / 单时段单箱型 / 时段顺序 / 换型线性化 / 兼容性
// 目标:
// - min ∑T
// ==========================================

use crate::domain::options::ModelOptions;
use crate::domain::parameters::{
    CompatibilityMap, DemandMap, PlanningParameters, SegmentLengthMap, SetupMap,
};
use crate::domain::types::{BoxTypeId, Day, MachineId, Segment, ShiftNo};
use crate::engine::constraint_model::{ConstraintModel, ConstraintSense, LinearExpr, VarId};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::segment_length::resolve_segment_lengths;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// 同型切换视为"无成本"的阈值
const ZERO_SETUP_EPS: f64 = 1e-9;

/// (机台, 箱型, 日, 班次, 时段)
pub type SlotKey = (MachineId, BoxTypeId, Day, ShiftNo, Segment);

/// (机台, 日, 班次)
pub type ShiftKey = (MachineId, Day, ShiftNo);

/// (机台, 前箱型, 后箱型, 日, 班次)
pub type PairKey = (MachineId, BoxTypeId, BoxTypeId, Day, ShiftNo);

// ==========================================
// VariableIndex - 变量分组索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct VariableIndex {
    pub assign: BTreeMap<SlotKey, VarId>,      // x
    pub hours: BTreeMap<SlotKey, VarId>,       // y
    pub setup_time: BTreeMap<ShiftKey, VarId>, // T
    pub sequence: BTreeMap<PairKey, VarId>,    // w
}

/// 模型规模统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelStats {
    pub assign_vars: usize,
    pub hours_vars: usize,
    pub setup_vars: usize,
    pub sequence_vars: usize,
    pub constraints: usize,
}

/// 构建结果：模型 + 变量索引 + 已解析的时段长度
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: ConstraintModel,
    pub vars: VariableIndex,
    pub segment_lengths: SegmentLengthMap,
}

impl BuiltModel {
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            assign_vars: self.vars.assign.len(),
            hours_vars: self.vars.hours.len(),
            setup_vars: self.vars.setup_time.len(),
            sequence_vars: self.vars.sequence.len(),
            constraints: self.model.num_constraints(),
        }
    }
}

/// 箱型对 w 变量的合格判定（变量创建与约束生成共用）
///
/// # 规则
/// 1. 换型表中存在 (m,b1,b2)
/// 2. 非"同型且零成本"
/// 3. restrict_by_compatibility 时 b1、b2 均与 m 兼容
pub fn is_sequence_pair_eligible(
    setup: &SetupMap,
    compatibility: &CompatibilityMap,
    restrict_by_compatibility: bool,
    machine: &str,
    from: &str,
    to: &str,
) -> bool {
    let Some(&cost) = setup.get(&(machine.to_string(), from.to_string(), to.to_string())) else {
        return false;
    };
    if from == to && cost <= ZERO_SETUP_EPS {
        return false;
    }
    if restrict_by_compatibility {
        let compatible = |b: &str| {
            compatibility
                .get(&(machine.to_string(), b.to_string()))
                .copied()
                .unwrap_or(false)
        };
        return compatible(from) && compatible(to);
    }
    true
}

// ==========================================
// ModelBuilder - 模型构建引擎
// ==========================================
pub struct ModelBuilder;

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建单个排产实例的完整模型
    ///
    /// # 参数
    /// - params: 全量参数快照
    /// - demand: (日, 箱型) → 需求箱数，缺失视为 0
    /// - options: 模型构建选项
    ///
    /// # 错误
    /// - MissingAvailabilityKey: 可用性未覆盖 M×D
    /// - MissingShiftDuration: 班次时长未覆盖 shifts_per_day
    /// - InvalidSegmentLengthSpec: 时段长度口径非法
    #[instrument(skip_all, fields(
        machines = params.sets.machines.len(),
        box_types = params.sets.box_types.len(),
        days = params.sets.days.len()
    ))]
    pub fn build(
        &self,
        params: &PlanningParameters,
        demand: &DemandMap,
        options: &ModelOptions,
    ) -> EngineResult<BuiltModel> {
        let sets = &params.sets;

        // 0. 调用契约校验（先于任何变量创建）
        for machine in &sets.machines {
            for &day in &sets.days {
                if !params.availability.contains_key(&(machine.clone(), day)) {
                    return Err(EngineError::MissingAvailabilityKey {
                        machine: machine.clone(),
                        day,
                    });
                }
            }
        }
        let segment_lengths = resolve_segment_lengths(
            &options.segment_length,
            &sets.shifts_per_day,
            &params.shift_duration,
        )?;

        let mut model = ConstraintModel::new("box_shift_setup");
        let mut vars = VariableIndex::default();
        let day_shifts = sets.day_shifts();

        // 1. 变量 x / y / T（按每日实际班次展开）
        for machine in &sets.machines {
            for &(day, shift) in &day_shifts {
                for box_type in &sets.box_types {
                    for segment in Segment::ALL {
                        let key = (machine.clone(), box_type.clone(), day, shift, segment);
                        let suffix = format!("{},{},{},{},{}", machine, box_type, day, shift, segment);
                        vars.assign.insert(key.clone(), model.add_binary(format!("x[{}]", suffix)));
                        vars.hours.insert(
                            key,
                            model.add_continuous(format!("y[{}]", suffix), 0.0, None),
                        );
                    }
                }
                vars.setup_time.insert(
                    (machine.clone(), day, shift),
                    model.add_continuous(format!("T[{},{},{}]", machine, day, shift), 0.0, None),
                );
            }
        }

        // 2. 变量 w（仅合格箱型对）
        let eligible_pairs = self.eligible_sequence_pairs(params, options);
        for (machine, from, to) in &eligible_pairs {
            for &(day, shift) in &day_shifts {
                let id = model.add_continuous(
                    format!("w[{},{},{},{},{}]", machine, from, to, day, shift),
                    0.0,
                    Some(1.0),
                );
                vars.sequence
                    .insert((machine.clone(), from.clone(), to.clone(), day, shift), id);
            }
        }

        // 3. 需求: ∑_{m,t,s} prod(m,b)·y ≥ demand(d,b)
        for &day in &sets.days {
            for box_type in &sets.box_types {
                let required = demand
                    .get(&(day, box_type.clone()))
                    .copied()
                    .unwrap_or(0.0);
                let mut expr = LinearExpr::new();
                for machine in &sets.machines {
                    let rate = params.productivity_of(machine, box_type);
                    for &shift in sets.shifts_of(day) {
                        for segment in Segment::ALL {
                            let key = (machine.clone(), box_type.clone(), day, shift, segment);
                            if let Some(&y) = vars.hours.get(&key) {
                                expr.add_term(y, rate);
                            }
                        }
                    }
                }
                model.add_constraint(
                    format!("demand[{},{}]", day, box_type),
                    expr,
                    ConstraintSense::GreaterEq,
                    required,
                );
            }
        }

        // 4. 产能: ∑_{b,s} y + T ≤ 班次时长 × 可用性
        for machine in &sets.machines {
            for &(day, shift) in &day_shifts {
                let available = params
                    .availability
                    .get(&(machine.clone(), day))
                    .copied()
                    .unwrap_or(0);
                let duration = params
                    .shift_duration
                    .get(&(day, shift))
                    .copied()
                    .ok_or(EngineError::MissingShiftDuration { day, shift })?;

                let mut expr = LinearExpr::new();
                for box_type in &sets.box_types {
                    for segment in Segment::ALL {
                        if let Some(&y) = vars
                            .hours
                            .get(&(machine.clone(), box_type.clone(), day, shift, segment))
                        {
                            expr.add_term(y, 1.0);
                        }
                    }
                }
                if let Some(&t) = vars.setup_time.get(&(machine.clone(), day, shift)) {
                    expr.add_term(t, 1.0);
                }
                model.add_constraint(
                    format!("capacity[{},{},{}]", machine, day, shift),
                    expr,
                    ConstraintSense::LessEq,
                    duration * f64::from(available),
                );
            }
        }

        // 5. 关联: y − len(d,t,s)·x ≤ 0
        for (key, &x) in &vars.assign {
            let (machine, box_type, day, shift, segment) = key;
            let Some(&y) = vars.hours.get(key) else {
                continue;
            };
            let length = segment_lengths
                .get(&(*day, *shift, *segment))
                .copied()
                .ok_or(EngineError::MissingShiftDuration { day: *day, shift: *shift })?;
            model.add_constraint(
                format!("link[{},{},{},{},{}]", machine, box_type, day, shift, segment),
                LinearExpr::new().term(y, 1.0).term(x, -length),
                ConstraintSense::LessEq,
                0.0,
            );
        }

        // 6. 单时段单箱型: ∑_b x ≤ 可用性（不可用机台不得持有任何分配）
        // 7. 时段顺序: ∑_b x(·,2) − ∑_b x(·,1) ≤ 0
        for machine in &sets.machines {
            for &(day, shift) in &day_shifts {
                let available = params
                    .availability
                    .get(&(machine.clone(), day))
                    .copied()
                    .unwrap_or(0);

                let segment_sum = |segment: Segment, coef: f64, expr: &mut LinearExpr| {
                    for box_type in &sets.box_types {
                        if let Some(&x) = vars
                            .assign
                            .get(&(machine.clone(), box_type.clone(), day, shift, segment))
                        {
                            expr.add_term(x, coef);
                        }
                    }
                };

                for segment in Segment::ALL {
                    let mut expr = LinearExpr::new();
                    segment_sum(segment, 1.0, &mut expr);
                    model.add_constraint(
                        format!("one_type[{},{},{},{}]", machine, day, shift, segment),
                        expr,
                        ConstraintSense::LessEq,
                        f64::from(available),
                    );
                }

                let mut order = LinearExpr::new();
                segment_sum(Segment::Second, 1.0, &mut order);
                segment_sum(Segment::First, -1.0, &mut order);
                model.add_constraint(
                    format!("order[{},{},{}]", machine, day, shift),
                    order,
                    ConstraintSense::LessEq,
                    0.0,
                );
            }
        }

        // 8. 换型线性化（McCormick）
        //    w ≤ x(b1,1); w ≤ x(b2,2); w ≥ x(b1,1) + x(b2,2) − 1
        //    T ≥ ∑ setup·w
        let mut setup_terms: BTreeMap<ShiftKey, LinearExpr> = BTreeMap::new();
        for ((machine, from, to, day, shift), &w) in &vars.sequence {
            let first = vars
                .assign
                .get(&(machine.clone(), from.clone(), *day, *shift, Segment::First))
                .copied();
            let second = vars
                .assign
                .get(&(machine.clone(), to.clone(), *day, *shift, Segment::Second))
                .copied();
            let (Some(x1), Some(x2)) = (first, second) else {
                continue;
            };
            let tag = format!("{},{},{},{},{}", machine, from, to, day, shift);

            model.add_constraint(
                format!("w_le_s1[{}]", tag),
                LinearExpr::new().term(w, 1.0).term(x1, -1.0),
                ConstraintSense::LessEq,
                0.0,
            );
            model.add_constraint(
                format!("w_le_s2[{}]", tag),
                LinearExpr::new().term(w, 1.0).term(x2, -1.0),
                ConstraintSense::LessEq,
                0.0,
            );
            model.add_constraint(
                format!("w_ge_and[{}]", tag),
                LinearExpr::new().term(w, 1.0).term(x1, -1.0).term(x2, -1.0),
                ConstraintSense::GreaterEq,
                -1.0,
            );

            let cost = params
                .setup
                .get(&(machine.clone(), from.clone(), to.clone()))
                .copied()
                .unwrap_or(0.0);
            setup_terms
                .entry((machine.clone(), *day, *shift))
                .or_default()
                .add_term(w, -cost);
        }

        for (key, mut expr) in setup_terms {
            let Some(&t) = vars.setup_time.get(&key) else {
                continue;
            };
            let (machine, day, shift) = key;
            expr.add_term(t, 1.0);
            model.add_constraint(
                format!("setup_def[{},{},{}]", machine, day, shift),
                expr,
                ConstraintSense::GreaterEq,
                0.0,
            );
        }

        // 9. 兼容性（可选）: 不兼容 (m,b) 的 x 恒为 0
        if options.enforce_compatibility {
            for (key, &x) in &vars.assign {
                let (machine, box_type, day, shift, segment) = key;
                if !params.is_compatible(machine, box_type) {
                    model.add_constraint(
                        format!("compat[{},{},{},{},{}]", machine, box_type, day, shift, segment),
                        LinearExpr::new().term(x, 1.0),
                        ConstraintSense::Equal,
                        0.0,
                    );
                }
            }
        }

        // 10. 目标: min ∑T
        let mut objective = LinearExpr::new();
        for &t in vars.setup_time.values() {
            objective.add_term(t, 1.0);
        }
        model.minimize(objective);

        let built = BuiltModel {
            model,
            vars,
            segment_lengths,
        };
        let stats = built.stats();
        debug!(
            assign_vars = stats.assign_vars,
            hours_vars = stats.hours_vars,
            setup_vars = stats.setup_vars,
            sequence_vars = stats.sequence_vars,
            constraints = stats.constraints,
            "模型构建完成"
        );
        Ok(built)
    }

    /// 全部合格 (m,b1,b2) 组合（与日/班次无关）
    pub fn eligible_sequence_pairs(
        &self,
        params: &PlanningParameters,
        options: &ModelOptions,
    ) -> Vec<(MachineId, BoxTypeId, BoxTypeId)> {
        let sets = &params.sets;
        let mut pairs = Vec::new();
        for machine in &sets.machines {
            for from in &sets.box_types {
                for to in &sets.box_types {
                    if is_sequence_pair_eligible(
                        &params.setup,
                        &params.compatibility,
                        options.restrict_sequence_pairs_by_compatibility,
                        machine,
                        from,
                        to,
                    ) {
                        pairs.push((machine.clone(), from.clone(), to.clone()));
                    }
                }
            }
        }
        pairs
    }
}
