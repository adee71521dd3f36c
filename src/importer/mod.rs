// ==========================================
// 箱型排产优化系统 - 导入层
// ==========================================
// 职责: CSV 数据目录 / Excel 工作簿 → 原始记录集 + 需求表
// 支持: CSV（UTF-8，容忍 BOM）/ Excel（工作表名对应 CSV 文件名）
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod record_mapper;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawTable};
pub use record_mapper::RecordMapper;

use crate::domain::parameters::DemandMap;
use crate::domain::records::RawRecordSet;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

// ===== 数据目录约定文件名 =====
pub const SHIFT_COUNTS_FILE: &str = "Turnos.csv";
pub const AVAILABILITY_FILE: &str = "Disponibilidad_Maquinas.csv";
pub const PRODUCTIVITY_FILE: &str = "Productividad_Maquina_Caja.csv";
pub const SETUP_FILE: &str = "Tiempo_de_Setup_por_maquina.csv";
pub const SHIFT_DURATION_FILE: &str = "Duracion_Turno.csv";
pub const DEMAND_FILE: &str = "Demanda.csv";

/// 按数据集文件名取原始表
fn map_raw_records<F>(mut table_of: F) -> ImportResult<RawRecordSet>
where
    F: FnMut(&str) -> ImportResult<RawTable>,
{
    let mapper = RecordMapper::new();

    let raw = RawRecordSet {
        shift_counts: mapper.map_shift_counts(&table_of(SHIFT_COUNTS_FILE)?, SHIFT_COUNTS_FILE)?,
        availability: mapper.map_availability(&table_of(AVAILABILITY_FILE)?, AVAILABILITY_FILE)?,
        productivity: mapper.map_productivity(&table_of(PRODUCTIVITY_FILE)?, PRODUCTIVITY_FILE)?,
        setup: mapper.map_setup(&table_of(SETUP_FILE)?, SETUP_FILE)?,
        shift_durations: mapper
            .map_shift_durations(&table_of(SHIFT_DURATION_FILE)?, SHIFT_DURATION_FILE)?,
    };

    info!(
        shift_counts = raw.shift_counts.len(),
        availability = raw.availability.len(),
        productivity = raw.productivity.len(),
        setup = raw.setup.len(),
        shift_durations = raw.shift_durations.len(),
        "原始记录导入完成"
    );
    Ok(raw)
}

/// 读取数据目录下的五类原始记录
#[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
pub fn load_raw_records(dir: impl AsRef<Path>) -> ImportResult<RawRecordSet> {
    let dir = dir.as_ref();
    map_raw_records(|file| CsvParser.parse_to_raw_table(&dir.join(file)))
}

/// 读取需求文件 → (日, 箱型) 需求表
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_demand(path: impl AsRef<Path>) -> ImportResult<DemandMap> {
    let path = path.as_ref();
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| DEMAND_FILE.to_string());

    build_demand(&CsvParser.parse_to_raw_table(path)?, &file)
}

fn build_demand(table: &RawTable, file: &str) -> ImportResult<DemandMap> {
    let mapper = RecordMapper::new();
    let records = mapper.map_demand(table, file)?;
    let demand = mapper.build_demand_map(&records);
    info!(records = records.len(), entries = demand.len(), "需求导入完成");
    Ok(demand)
}

// ==========================================
// Excel 工作簿
// ==========================================

/// 工作表名归一化：小写、去重音、下划线视同空格、压缩空白
///
/// "Productividad Máquina_Caja" 与 "Productividad_Maquina_Caja.csv" 的主干归一后相同
fn sheet_key(name: &str) -> String {
    let folded: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            '_' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 按数据集文件名定位工作表
fn pick_sheet<'a>(tables: &'a BTreeMap<String, RawTable>, file: &str) -> ImportResult<&'a RawTable> {
    let stem = file.trim_end_matches(".csv");
    let wanted = sheet_key(stem);
    tables
        .iter()
        .find(|(name, _)| sheet_key(name) == wanted)
        .map(|(_, table)| table)
        .ok_or_else(|| ImportError::MissingSheet(stem.to_string()))
}

/// 读取 Excel 工作簿中的五类原始记录
///
/// 工作表: Turnos / Disponibilidad Maquinas / Productividad Máquina_Caja /
/// Tiempo de Setup por máquina / Duracion Turno
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_raw_records_from_workbook(path: impl AsRef<Path>) -> ImportResult<RawRecordSet> {
    let tables = ExcelParser.parse_workbook(path.as_ref())?;
    map_raw_records(|file| pick_sheet(&tables, file).cloned())
}

/// 读取 Excel 工作簿中的 Demanda 工作表
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_demand_from_workbook(path: impl AsRef<Path>) -> ImportResult<DemandMap> {
    let tables = ExcelParser.parse_workbook(path.as_ref())?;
    build_demand(pick_sheet(&tables, DEMAND_FILE)?, DEMAND_FILE)
}
