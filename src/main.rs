// ==========================================
// 箱型排产优化系统 - 命令行入口
// ==========================================
// 用法:
//   box-shift-planner <data_dir | workbook.xlsx> [--demand <path>] [--config <path>] [--json-log]
// 数据源: 目录 → 约定 CSV 文件；.xlsx/.xls → 工作簿（需求取 Demanda 工作表，除非指定 --demand）
// 输出: stdout 打印 JSON 报告；日志写 stderr
// 退出码: 0 成功 / 1 错误 / 2 不可行或无界
// ==========================================

use anyhow::{bail, Context, Result};
use box_shift_planner::config::ConfigManager;
use box_shift_planner::importer::{self, DEMAND_FILE};
use box_shift_planner::{logging, GoodLpSolver, PlanOutcome, PlanningOrchestrator, APP_NAME, VERSION};
use box_shift_planner::domain::{DemandMap, RawRecordSet};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

struct CliArgs {
    data_path: PathBuf,
    demand: Option<PathBuf>,
    config: Option<PathBuf>,
    json_log: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut data_path = None;
    let mut demand = None;
    let mut config = None;
    let mut json_log = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demand" => demand = Some(PathBuf::from(args.next().context("--demand 缺少路径")?)),
            "--config" => config = Some(PathBuf::from(args.next().context("--config 缺少路径")?)),
            "--json-log" => json_log = true,
            flag if flag.starts_with("--") => bail!("未知参数: {}", flag),
            path => {
                if data_path.is_some() {
                    bail!("只能指定一个数据源");
                }
                data_path = Some(PathBuf::from(path));
            }
        }
    }

    Ok(CliArgs {
        data_path: data_path.context(
            "用法: box-shift-planner <data_dir | workbook.xlsx> [--demand <path>] [--config <path>] [--json-log]",
        )?,
        demand,
        config,
        json_log,
    })
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"))
}

/// 按数据源形态导入原始记录与需求
fn load_inputs(args: &CliArgs) -> Result<(RawRecordSet, DemandMap)> {
    let source = &args.data_path;
    let workbook = is_workbook(source);

    let raw = if workbook {
        importer::load_raw_records_from_workbook(source)
    } else {
        importer::load_raw_records(source)
    }
    .with_context(|| format!("导入数据源失败: {}", source.display()))?;

    let demand = match (&args.demand, workbook) {
        (Some(path), _) if is_workbook(path) => importer::load_demand_from_workbook(path),
        (Some(path), _) => importer::load_demand(path),
        (None, true) => importer::load_demand_from_workbook(source),
        (None, false) => importer::load_demand(source.join(DEMAND_FILE)),
    }
    .context("导入需求失败")?;

    Ok((raw, demand))
}

fn run() -> Result<PlanOutcome> {
    let args = parse_args()?;
    if args.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let config = match &args.config {
        Some(path) => ConfigManager::from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => ConfigManager::new(),
    };
    let options = config.planning_options().context("配置项无效")?;

    let (raw, demand) = load_inputs(&args)?;

    let orchestrator = PlanningOrchestrator::new(GoodLpSolver::new())
        .with_config_snapshot(config.get_config_snapshot());
    let outcome = orchestrator
        .run(&raw, &demand, &options)
        .context("排产流程失败")?;
    Ok(outcome)
}

fn main() -> ExitCode {
    match run() {
        Ok(PlanOutcome::Planned(report)) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                eprintln!("{}", report.summary_text());
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("报告序列化失败: {}", e);
                ExitCode::FAILURE
            }
        },
        Ok(PlanOutcome::Infeasible) => {
            eprintln!("模型不可行：当前产能/可用性无法满足需求");
            ExitCode::from(2)
        }
        Ok(PlanOutcome::Unbounded) => {
            eprintln!("模型无界");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
