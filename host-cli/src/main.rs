//! # Host CLI
//!
//! 无头宿主：加载舞台配置，用内存模拟对象组装角色，按场景逐帧驱动。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- --scenario play
//! cargo run -p host-cli -- --scenario ragdoll --fps 60 --seconds 8
//! cargo run -p host-cli -- --config configs/stage.json --scenario lost-target --verbose
//! ```

mod scenario;

use std::path::PathBuf;

use clap::Parser;
use cue_runtime::StageConfig;
use cue_runtime::sim::SimCharacter;
use tracing::{Level, info, warn};

use scenario::{RunOptions, Scenario};

#[derive(Parser)]
#[command(name = "host-cli")]
#[command(about = "无头运行角色出场序列")]
#[command(version)]
struct Cli {
    /// 舞台配置文件（不存在时使用默认配置）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 要运行的场景
    #[arg(short, long, value_enum, default_value = "play")]
    scenario: Scenario,

    /// 每秒帧数
    #[arg(long, default_value = "30")]
    fps: u32,

    /// 运行时长（秒）
    #[arg(long, default_value = "6")]
    seconds: f32,

    /// 模拟动画片段长度（秒）
    #[arg(long, default_value = "2")]
    clip: f32,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => StageConfig::load(path),
        None => StageConfig::default(),
    };
    if let Err(e) = config.validate() {
        warn!(error = %e, "配置无效，使用默认配置");
        config = StageConfig::default();
    }

    // 角色按原配置建好动画状态，场景再改配置（例如故意指向不存在的状态）
    let character = SimCharacter::new(&config.sequence.state_name, cli.clip);
    cli.scenario.adjust_config(&mut config);
    let mut interaction = character.rig().interaction(&config);

    info!(scenario = ?cli.scenario, fps = cli.fps, seconds = cli.seconds, "开始运行场景");
    let summary = scenario::run(
        cli.scenario,
        &character,
        &mut interaction,
        RunOptions {
            fps: cli.fps,
            seconds: cli.seconds,
        },
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
