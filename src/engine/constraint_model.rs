// ==========================================
// 箱型排产优化系统 - 抽象约束模型
// ==========================================
// 职责: 与具体求解器无关的线性模型表示
// 内容: 变量（类型 + 上下界）、具名线性约束、最小化目标
// ==========================================

use std::fmt;

/// 变量句柄（模型内变量表下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: Option<f64>, // None 表示无上界
}

// ==========================================
// LinearExpr - 线性表达式 ∑ coef·var
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式追加一项
    pub fn term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// 按变量取值求表达式值；越界下标按 0 处理
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintSense::LessEq => write!(f, "<="),
            ConstraintSense::GreaterEq => write!(f, ">="),
            ConstraintSense::Equal => write!(f, "=="),
        }
    }
}

/// 具名线性约束: expr (sense) rhs
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// 给定取值下是否满足（容差 tol）
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            ConstraintSense::LessEq => lhs <= self.rhs + tol,
            ConstraintSense::GreaterEq => lhs >= self.rhs - tol,
            ConstraintSense::Equal => (lhs - self.rhs).abs() <= tol,
        }
    }
}

// ==========================================
// ConstraintModel - 最小化模型
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintModel {
    name: String,
    variables: Vec<VariableDef>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl ConstraintModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.push_variable(VariableDef {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: Some(1.0),
        })
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: Option<f64>) -> VarId {
        self.push_variable(VariableDef {
            name: name.into(),
            kind: VarKind::Continuous,
            lower,
            upper,
        })
    }

    fn push_variable(&mut self, def: VariableDef) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(def);
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: ConstraintSense,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    /// 设置最小化目标
    pub fn minimize(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// 给定取值下被违反的约束名（含变量上下界与整数性）
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<String> {
        let mut violated = Vec::new();

        for (idx, def) in self.variables.iter().enumerate() {
            let v = values.get(idx).copied().unwrap_or(0.0);
            let out_of_bounds = v < def.lower - tol || def.upper.is_some_and(|u| v > u + tol);
            let fractional = def.kind == VarKind::Binary && (v - v.round()).abs() > tol;
            if out_of_bounds || fractional {
                violated.push(format!("bound[{}]", def.name));
            }
        }

        violated.extend(
            self.constraints
                .iter()
                .filter(|c| !c.is_satisfied(values, tol))
                .map(|c| c.name.clone()),
        );
        violated
    }
}
