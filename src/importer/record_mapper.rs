// ==========================================
// 箱型排产优化系统 - 记录映射器实现
// ==========================================
// 职责: 原始表 → 类型化记录
// 列匹配: 先按名称精确匹配（忽略大小写），再按子串匹配
// 红线: 单行数值缺失不报错，保留 None；关键列缺失才报错
// ==========================================

use crate::domain::parameters::DemandMap;
use crate::domain::records::{
    AvailabilityRecord, DemandRecord, ProductivityRecord, SetupRecord, ShiftCountRecord,
    ShiftDurationRecord,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawTable;
use std::collections::HashMap;
use tracing::warn;

pub struct RecordMapper {
    cleaner: DataCleaner,
}

impl Default for RecordMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 定位列名（精确优先，其次子串；均忽略大小写）
    pub fn pick_column(&self, table: &RawTable, file: &str, part: &str) -> ImportResult<String> {
        let wanted = part.to_uppercase();
        table
            .headers
            .iter()
            .find(|h| h.to_uppercase() == wanted)
            .or_else(|| table.headers.iter().find(|h| h.to_uppercase().contains(&wanted)))
            .cloned()
            .ok_or_else(|| ImportError::MissingColumn {
                file: file.to_string(),
                column: part.to_string(),
            })
    }

    fn cell<'a>(&self, row: &'a HashMap<String, String>, column: &str) -> Option<&'a str> {
        row.get(column).map(String::as_str)
    }

    fn text(&self, row: &HashMap<String, String>, column: &str) -> String {
        self.cleaner.clean_text(self.cell(row, column).unwrap_or(""))
    }

    /// Turnos.csv: DIA / CANTIDAD DE TURNOS
    pub fn map_shift_counts(&self, table: &RawTable, file: &str) -> ImportResult<Vec<ShiftCountRecord>> {
        let c_day = self.pick_column(table, file, "DIA")?;
        let c_count = self.pick_column(table, file, "CANTIDAD")?;

        let mut records = Vec::new();
        for (idx, row) in table.rows.iter().enumerate() {
            let Some(day) = self.cleaner.parse_index(self.cell(row, &c_day)) else {
                warn!(file, row = idx + 2, "日编号无法解析，忽略该行");
                continue;
            };
            records.push(ShiftCountRecord {
                day,
                shift_count: self.cleaner.parse_integer(self.cell(row, &c_count)),
            });
        }
        Ok(records)
    }

    /// Disponibilidad_Maquinas.csv: MAQUINA / DIA / DISPONIBILIDAD
    pub fn map_availability(&self, table: &RawTable, file: &str) -> ImportResult<Vec<AvailabilityRecord>> {
        let c_machine = self.pick_column(table, file, "MAQUINA")?;
        let c_day = self.pick_column(table, file, "DIA")?;
        let c_avail = self.pick_column(table, file, "DISPONIBILIDAD")?;

        Ok(table
            .rows
            .iter()
            .map(|row| AvailabilityRecord {
                machine: self.text(row, &c_machine),
                day: self.cleaner.parse_index(self.cell(row, &c_day)),
                availability: self.cleaner.parse_number(self.cell(row, &c_avail)),
            })
            .collect())
    }

    /// Productividad_Maquina_Caja.csv: MAQUINA / TIPO_CAJA / PRODUCTIVIDAD
    pub fn map_productivity(&self, table: &RawTable, file: &str) -> ImportResult<Vec<ProductivityRecord>> {
        let c_machine = self.pick_column(table, file, "MAQUINA")?;
        let c_box = self.pick_column(table, file, "TIPO_CAJA")?;
        let c_prod = self.pick_column(table, file, "PRODUCTIVIDAD")?;

        Ok(table
            .rows
            .iter()
            .map(|row| ProductivityRecord {
                machine: self.text(row, &c_machine),
                box_type: self.text(row, &c_box),
                productivity: self.cleaner.parse_number(self.cell(row, &c_prod)),
            })
            .collect())
    }

    /// Tiempo_de_Setup_por_maquina.csv: MAQUINA / TIPO_CAJA_ACTUAL / TIPO_CAJA_A_CAMBIAR / SETUP
    pub fn map_setup(&self, table: &RawTable, file: &str) -> ImportResult<Vec<SetupRecord>> {
        let c_machine = self.pick_column(table, file, "MAQUINA")?;
        let c_from = self.pick_column(table, file, "TIPO_CAJA_ACTUAL")?;
        let c_to = self.pick_column(table, file, "TIPO_CAJA_A_CAMBIAR")?;
        let c_hours = self.pick_column(table, file, "SETUP")?;

        Ok(table
            .rows
            .iter()
            .map(|row| SetupRecord {
                machine: self.text(row, &c_machine),
                from_box_type: self.text(row, &c_from),
                to_box_type: self.text(row, &c_to),
                hours: self.cleaner.parse_number(self.cell(row, &c_hours)),
            })
            .collect())
    }

    /// Duracion_Turno.csv: DIA / TURNO / HORAS
    pub fn map_shift_durations(&self, table: &RawTable, file: &str) -> ImportResult<Vec<ShiftDurationRecord>> {
        let c_day = self.pick_column(table, file, "DIA")?;
        let c_shift = self.pick_column(table, file, "TURNO")?;
        let c_hours = self.pick_column(table, file, "HORAS")?;

        Ok(table
            .rows
            .iter()
            .map(|row| ShiftDurationRecord {
                day: self.cleaner.parse_index(self.cell(row, &c_day)),
                shift: self.cleaner.parse_index(self.cell(row, &c_shift)),
                hours: self.cleaner.parse_number(self.cell(row, &c_hours)),
            })
            .collect())
    }

    /// Demanda.csv: DIA / TIPO_CAJA / DEMANDA
    pub fn map_demand(&self, table: &RawTable, file: &str) -> ImportResult<Vec<DemandRecord>> {
        let c_day = self.pick_column(table, file, "DIA")?;
        let c_box = self.pick_column(table, file, "TIPO_CAJA")?;
        let c_units = self.pick_column(table, file, "DEMANDA")?;

        let mut records = Vec::new();
        for (idx, row) in table.rows.iter().enumerate() {
            let Some(day) = self.cleaner.parse_index(self.cell(row, &c_day)) else {
                warn!(file, row = idx + 2, "日编号无法解析，忽略该行");
                continue;
            };
            records.push(DemandRecord {
                day,
                box_type: self.text(row, &c_box),
                units: self.cleaner.parse_number(self.cell(row, &c_units)),
            });
        }
        Ok(records)
    }

    /// 需求记录 → (日, 箱型) 需求表；重复键累加，缺失/负值按 0
    pub fn build_demand_map(&self, records: &[DemandRecord]) -> DemandMap {
        let mut demand = DemandMap::new();
        for record in records {
            let units = record.units.unwrap_or(0.0).max(0.0);
            *demand
                .entry((record.day, record.box_type.clone()))
                .or_insert(0.0) += units;
        }
        demand
    }
}
