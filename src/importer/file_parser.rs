// ==========================================
// 箱型排产优化系统 - 文件解析器实现
// ==========================================
// 职责: CSV 文件 / Excel 工作簿 → 表头 + 行映射
// 约定: 首行为表头，值一律按字符串读取
// 支持: CSV（UTF-8，容忍 BOM）/ Excel (.xlsx/.xls，每张工作表一张原始表)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

const UTF8_BOM: char = '\u{feff}';

/// 解析后的原始表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    /// 由表头 + 数据行构建（跳过完全空白的行）
    fn from_rows<I>(headers: Vec<String>, data_rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut rows = Vec::new();
        for data_row in data_rows {
            let mut row_map = HashMap::new();
            for (col_idx, value) in data_row.into_iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(row_map);
        }
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 检查文件存在且扩展名在允许列表内
fn check_path(path: &Path, allowed: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !allowed.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_path(file_path, &["csv"])?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头（去除 BOM）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches(UTF8_BOM).trim().to_string())
            .collect();

        let mut data_rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            data_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(RawTable::from_rows(headers, data_rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 读取工作簿中的全部工作表
    ///
    /// # 返回
    /// 工作表名 → 原始表；空工作表（无表头行）跳过
    pub fn parse_workbook(&self, file_path: &Path) -> ImportResult<BTreeMap<String, RawTable>> {
        check_path(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)?;
        let mut tables = BTreeMap::new();

        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            let mut rows = range.rows();
            let Some(header_row) = rows.next() else {
                continue;
            };

            let headers: Vec<String> = header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();
            let data_rows = rows.map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());

            tables.insert(sheet_name, RawTable::from_rows(headers, data_rows));
        }

        if tables.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }
        Ok(tables)
    }
}

impl FileParser for ExcelParser {
    /// 读取第一张工作表
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        self.parse_workbook(file_path)?
            .into_values()
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_parser_valid_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp_file, "\u{feff}DIA, CANTIDAD DE TURNOS\n1,2\n,\n2, 3\n").unwrap();

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();
        assert_eq!(table.headers, vec!["DIA", "CANTIDAD DE TURNOS"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("CANTIDAD DE TURNOS"), Some(&"3".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_table(Path::new("/nonexistent/Turnos.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_rejects_other_extensions() {
        let temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let result = CsvParser.parse_to_raw_table(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_excel_parser_rejects_csv() {
        let temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        let result = ExcelParser.parse_workbook(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ref ext)) if ext == "csv"));
    }

    #[test]
    fn test_excel_parser_file_not_found() {
        let result = ExcelParser.parse_to_raw_table(Path::new("/nonexistent/parametros.xlsx"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_excel_parser_corrupt_workbook() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        write!(temp_file, "DIA,TURNO\n1,1\n").unwrap();

        let result = ExcelParser.parse_workbook(temp_file.path());
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_raw_table_skips_blank_rows() {
        let headers = vec!["DIA".to_string(), "HORAS".to_string()];
        let rows = vec![
            vec!["1".to_string(), " 8 ".to_string()],
            vec![" ".to_string(), String::new()],
            vec!["2".to_string()],
        ];
        let table = RawTable::from_rows(headers, rows);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("HORAS"), Some(&"8".to_string()));
        assert_eq!(table.rows[1].get("HORAS"), None);
    }
}
