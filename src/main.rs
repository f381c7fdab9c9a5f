// ==========================================
// 道路养护计划系统 - 命令行入口
// ==========================================
// 用法:
//   road-works-dss import <目录>
//   road-works-dss plan <起始年> <起始月> <年数> <总预算>
//   road-works-dss summary <运行ID>
//   road-works-dss runs
//   road-works-dss entries <运行ID>
//   road-works-dss next-start
//   road-works-dss compare
//   road-works-dss config <键> [值]
// 数据库: ROAD_WORKS_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{bail, Context, Result};
use road_works_dss::app::{get_default_db_path, AppState};
use road_works_dss::logging;
use serde::Serialize;

const USAGE: &str = "用法: road-works-dss <import|plan|summary|runs|entries|next-start|compare|config> [参数...]";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("缺少参数 <{}>\n{}", name, USAGE))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        bail!(USAGE);
    };

    let db_path = get_default_db_path();
    tracing::info!("{} v{}，数据库: {}", road_works_dss::APP_NAME, road_works_dss::VERSION, db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    match command {
        "import" => {
            let dir = arg(&args, 1, "目录")?;
            print_json(&state.import_api.import_directory(dir)?)?;
        }
        "plan" => {
            let year: i32 = arg(&args, 1, "起始年")?.parse().context("起始年必须为整数")?;
            let month: u32 = arg(&args, 2, "起始月")?.parse().context("起始月必须为整数")?;
            let years: u32 = arg(&args, 3, "年数")?.parse().context("年数必须为整数")?;
            let budget: f64 = arg(&args, 4, "总预算")?.parse().context("总预算必须为数字")?;

            let result = state.planning_api.create_plan(year, month, years, budget).await?;
            print_json(&result.entries)?;
            eprintln!(
                "运行 {}: 条目 {}，支出 {:.2}，结余 {:.2}，剔除 {} 次",
                result.run.run_id,
                result.entries.len(),
                result.summary.expenses,
                result.summary.balance,
                result.deferred_count
            );
        }
        "summary" => {
            let run_id = arg(&args, 1, "运行ID")?;
            print_json(&state.planning_api.financial_summary_for_run(run_id)?)?;
        }
        "runs" => {
            print_json(&state.planning_api.list_runs()?)?;
        }
        "entries" => {
            let run_id = arg(&args, 1, "运行ID")?;
            print_json(&state.planning_api.list_plan_entries(run_id)?)?;
        }
        "next-start" => {
            print_json(&state.planning_api.next_horizon_start()?)?;
        }
        "compare" => {
            print_json(&state.planning_api.compare_prediction_methods()?)?;
        }
        "config" => {
            let key = arg(&args, 1, "键")?;
            match args.get(2) {
                Some(value) => {
                    state
                        .config_manager
                        .set_global_config_value(key, value)
                        .map_err(|e| anyhow::anyhow!("写入配置失败: {}", e))?;
                    println!("{} = {}", key, value);
                }
                None => {
                    let value = state
                        .config_manager
                        .get_global_config_value(key)
                        .map_err(|e| anyhow::anyhow!("读取配置失败: {}", e))?;
                    println!("{} = {}", key, value.as_deref().unwrap_or("<未设置>"));
                }
            }
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
