// ==========================================
// 箱型排产优化系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 宽松数值解析
// 口径: 非数值一律返回 None，由参数派生层决定默认值
// ==========================================

use crate::domain::types::Day;

pub struct DataCleaner;

impl DataCleaner {
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析浮点数（非数值 / 非有限 → None）
    pub fn parse_number(&self, value: Option<&str>) -> Option<f64> {
        let text = self.normalize_null(value)?;
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// 解析整数，接受 "3" 与 "3.0"；带小数部分 → None
    pub fn parse_integer(&self, value: Option<&str>) -> Option<i64> {
        let number = self.parse_number(value)?;
        if number.fract() != 0.0 || number.abs() > i64::MAX as f64 {
            return None;
        }
        Some(number as i64)
    }

    /// 解析日/班次编号（非负整数）
    pub fn parse_index(&self, value: Option<&str>) -> Option<Day> {
        self.parse_integer(value)
            .and_then(|v| Day::try_from(v).ok())
    }
}
