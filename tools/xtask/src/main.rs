//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 cue-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `config-check`: 检查舞台配置文件（解析、校验、互相冲突的字段）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use cue_runtime::StageConfig;
use walkdir::WalkDir;

/// 运行一条 cargo 命令，失败时带上完整命令行报错
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let line = format!("cargo {}", args.join(" "));
    eprintln!("\n==> {line}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{line} failed with {status}");
    }
    Ok(())
}

/// 门禁步骤，按顺序执行，遇错即停
const GATES: &[&[&str]] = &[
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets", "--all-features"],
    &["test", "--workspace", "--all-features"],
];

/// 覆盖率报告，`scope` 为选择包的参数
fn coverage(scope: &[&str]) -> anyhow::Result<()> {
    let version = Command::new("cargo").args(["llvm-cov", "--version"]).output();
    if !version.is_ok_and(|out| out.status.success()) {
        anyhow::bail!(
            "cargo llvm-cov 不可用，请先运行 \
`cargo install cargo-llvm-cov` 和 `rustup component add llvm-tools-preview`"
        );
    }

    let mut args = vec!["llvm-cov"];
    args.extend_from_slice(scope);
    // sim feature 打开后集成测试才能编译
    args.extend_from_slice(&["--all-features", "--html"]);
    cargo(&args)?;

    eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
    Ok(())
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            for gate in GATES {
                cargo(gate)?;
            }
        }
        "cov-runtime" => coverage(&["-p", "cue-runtime"])?,
        // host-cli 只是场景驱动，xtask 是工具，都不计入
        "cov-workspace" => coverage(&[
            "--workspace",
            "--exclude",
            "xtask",
            "--exclude",
            "host-cli",
        ])?,
        "config-check" => config_check(args.next().as_deref())?,
        "help" | "-h" | "--help" => print_help(),
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 cue-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  config-check    检查舞台配置文件

CONFIG-CHECK:
  cargo xtask config-check [path]

  不带参数：检查 configs/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 解析错误
    - 配置校验（音量范围、状态名、重力、按钮文字）
    - 同时配置了“动画后消失”和消失延迟（延迟会被忽略）
"#
    );
}

//=============================================================================
// config-check 命令实现
//=============================================================================

/// 默认配置目录（相对于 workspace root）
const DEFAULT_CONFIG_DIR: &str = "configs";

/// 配置检查结果
#[derive(Default)]
struct ConfigCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// 执行配置检查
fn config_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_config_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_CONFIG_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认配置目录不存在: {}\n请在 workspace 根目录运行，或指定配置路径",
                    dir.display()
                );
            }
            collect_config_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到配置文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个配置文件...\n", files.len());

    let mut result = ConfigCheckResult::default();
    for file in &files {
        check_config_file(file, &mut result);
    }

    print_check_result(&result);

    if !result.errors.is_empty() {
        anyhow::bail!("配置检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有配置文件
fn collect_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个配置文件
fn check_config_file(file: &Path, result: &mut ConfigCheckResult) {
    let id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            result.errors.push(format!("{id}: 无法读取文件 - {e}"));
            return;
        }
    };

    let config = match StageConfig::from_json(&content) {
        Ok(c) => c,
        Err(e) => {
            result.errors.push(format!("{id}: {e}"));
            return;
        }
    };

    if let Err(e) = config.validate() {
        result.errors.push(format!("{id}: {e}"));
    }

    // 原始 JSON 才知道哪些字段是显式写出的
    if let Ok(raw) = serde_json::from_str::<serde_json::Value>(&content)
        && config.sequence.disappear_after_animation
        && raw.pointer("/disappear/delay").is_some()
    {
        result.warnings.push(format!(
            "{id}: disappear_after_animation 为 true，disappear.delay 将被忽略"
        ));
    }

    if config.ragdoll.button_hide_seconds > config.ragdoll.hide_delay {
        result.warnings.push(format!(
            "{id}: button_hide_seconds ({}) 大于 hide_delay ({})，布娃娃将保持 {} 秒",
            config.ragdoll.button_hide_seconds,
            config.ragdoll.hide_delay,
            config.ragdoll.hide_wait()
        ));
    }
}

/// 输出检查结果
fn print_check_result(result: &ConfigCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个配置文件", result.files_checked);
    eprintln!();

    for error in &result.errors {
        eprintln!("[ERROR] {error}");
    }
    for warning in &result.warnings {
        eprintln!("[WARN] {warning}");
    }

    eprintln!();
    if !result.errors.is_empty() {
        eprintln!(
            "❌ {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        );
    } else if !result.warnings.is_empty() {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings.len());
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
