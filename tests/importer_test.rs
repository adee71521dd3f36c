// ==========================================
// 导入层集成测试
// ==========================================
// 测试目标: CSV 数据目录 → 原始记录 → 完整排产
// 覆盖范围: 列名容错 / BOM / 缺失文件 / 缺失列 / 需求累加
// ==========================================

use box_shift_planner::config::ConfigManager;
use box_shift_planner::engine::{GoodLpSolver, PlanningOrchestrator};
use box_shift_planner::importer::{
    self, ImportError, AVAILABILITY_FILE, DEMAND_FILE, PRODUCTIVITY_FILE, SETUP_FILE,
    SHIFT_COUNTS_FILE, SHIFT_DURATION_FILE,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// 2 机台 × 2 箱型 × 2 日 的完整数据目录
fn create_data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let p = dir.path();
    write(p, SHIFT_COUNTS_FILE, "\u{feff}DIA,CANTIDAD DE TURNOS\n1,2\n2,1\n");
    write(
        p,
        AVAILABILITY_FILE,
        "Maquina,Dia,Disponibilidad\nM1,1,1\nM1,2,1\nM2,1,1\nM2,2,0\n",
    );
    write(
        p,
        PRODUCTIVITY_FILE,
        "MAQUINA,TIPO_CAJA,PRODUCTIVIDAD_CAJAS_HORA\nM1,A,10\nM1,B,8\nM2,B,12\nM2,A,0\n",
    );
    write(
        p,
        SETUP_FILE,
        "MAQUINA,TIPO_CAJA_ACTUAL,TIPO_CAJA_A_CAMBIAR,SETUP\nM1,A,B,1.0\nM1,B,A,1.5\n",
    );
    write(p, SHIFT_DURATION_FILE, "DIA,TURNO,HORAS\n1,1,8\n1,2,6\n");
    write(
        p,
        DEMAND_FILE,
        "DIA,TIPO_CAJA,DEMANDA\n1,A,30\n1,A,10\n1,B,24\n2,A,20\n",
    );
    dir
}

#[test]
fn test_load_raw_records_from_directory() {
    let dir = create_data_dir();
    let raw = importer::load_raw_records(dir.path()).unwrap();

    assert_eq!(raw.shift_counts.len(), 2);
    assert_eq!(raw.availability.len(), 4);
    assert_eq!(raw.productivity.len(), 4);
    assert_eq!(raw.setup.len(), 2);
    assert_eq!(raw.shift_durations.len(), 2);
    assert_eq!(raw.productivity[2].productivity, Some(12.0));
    assert_eq!(raw.availability[3].availability, Some(0.0));
}

#[test]
fn test_load_demand_sums_duplicate_keys() {
    let dir = create_data_dir();
    let demand = importer::load_demand(dir.path().join(DEMAND_FILE)).unwrap();

    assert_eq!(demand.len(), 3);
    assert_eq!(demand.get(&(1, "A".to_string())), Some(&40.0));
    assert_eq!(demand.get(&(2, "A".to_string())), Some(&20.0));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = create_data_dir();
    fs::remove_file(dir.path().join(SETUP_FILE)).unwrap();

    let err = importer::load_raw_records(dir.path()).unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(ref path) if path.contains(SETUP_FILE)));
}

#[test]
fn test_missing_column_is_reported() {
    let dir = create_data_dir();
    write(dir.path(), SHIFT_DURATION_FILE, "DIA,HORAS\n1,8\n");

    let err = importer::load_raw_records(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        ImportError::MissingColumn { ref file, ref column }
            if file == SHIFT_DURATION_FILE && column == "TURNO"
    ));
}

#[test]
fn test_full_pipeline_from_csv() {
    let dir = create_data_dir();
    let raw = importer::load_raw_records(dir.path()).unwrap();
    let demand = importer::load_demand(dir.path().join(DEMAND_FILE)).unwrap();

    let mut config = ConfigManager::new();
    config.set("time_limit_seconds", "30");
    let options = config.planning_options().unwrap();

    let outcome = PlanningOrchestrator::new(GoodLpSolver::new())
        .with_config_snapshot(config.get_config_snapshot())
        .run(&raw, &demand, &options)
        .unwrap();
    let report = outcome.report().expect("应得到可行解");

    assert!(report.unmet_demand().is_empty());
    // M2 第 2 日不可用
    assert!(report
        .assignments
        .iter()
        .all(|r| !(r.machine == "M2" && r.day == 2)));
    // M2 对 A 产能为 0 → 不兼容
    assert!(report
        .assignments
        .iter()
        .all(|r| !(r.machine == "M2" && r.box_type == "A")));
    // 第 2 日班次时长缺失 → 默认 8h
    assert_eq!(report.utilization.len(), 4);
    assert_eq!(
        report.config_snapshot.as_ref().unwrap()["time_limit_seconds"],
        "30"
    );
}
