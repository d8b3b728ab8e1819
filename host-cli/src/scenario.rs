//! 场景脚本：在固定时间点向交互协调器注入输入，并逐帧推进。

use clap::ValueEnum;
use cue_runtime::sim::SimCharacter;
use cue_runtime::{
    NodeActivation, PhysicsWorld, RagdollState, SequenceState, StageConfig, TargetInteraction,
    TrackingStatus,
};
use serde::Serialize;
use tracing::info;

/// 可运行的场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// 识别后播放，完整走完序列
    Play,
    /// 播放 1 秒后再次点击，触发布娃娃
    Ragdoll,
    /// 播放 1 秒后丢失追踪
    LostTarget,
    /// 配置的动画状态不存在
    UnknownState,
}

/// 注入的输入
#[derive(Debug, Clone, Copy)]
enum Input {
    Status(TrackingStatus),
    Click,
}

impl Scenario {
    /// (时间点, 输入)，按时间排序
    fn timeline(self) -> Vec<(f32, Input)> {
        let mut timeline = vec![
            (0.0, Input::Status(TrackingStatus::Tracked)),
            (0.1, Input::Click),
        ];
        match self {
            Self::Play | Self::UnknownState => {}
            Self::Ragdoll => timeline.push((1.1, Input::Click)),
            Self::LostTarget => timeline.push((1.1, Input::Status(TrackingStatus::NoPose))),
        }
        timeline
    }

    /// 场景对配置的改动
    pub fn adjust_config(self, config: &mut StageConfig) {
        if self == Self::UnknownState {
            config.sequence.state_name = format!("{}-missing", config.sequence.state_name);
        }
    }
}

/// 运行参数
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub fps: u32,
    pub seconds: f32,
}

/// 运行结束时的快照
#[derive(Debug, Serialize)]
pub struct Summary {
    pub scenario: Scenario,
    pub frames: usize,
    pub elapsed: f32,
    pub sequence_state: String,
    pub ragdoll_state: String,
    pub character_active: bool,
    pub button_visible: bool,
    pub button_label: String,
    pub gravity: [f32; 3],
    pub appear_particles: u32,
    pub disappear_particles: u32,
    pub ragdoll_one_shots: usize,
    pub messages: Vec<String>,
}

/// 运行场景
pub fn run(
    scenario: Scenario,
    character: &SimCharacter,
    interaction: &mut TargetInteraction,
    options: RunOptions,
) -> Summary {
    let fps = options.fps.max(1);
    let dt = 1.0 / fps as f32;
    let frames = (options.seconds.max(0.0) * fps as f32).ceil() as usize;

    let mut timeline = scenario.timeline().into_iter().peekable();
    let mut elapsed = 0.0_f32;
    let mut last_sequence = interaction.sequence().state();
    let mut last_ragdoll = interaction.ragdoll().state();

    for frame in 0..frames {
        while let Some((at, input)) = timeline.next_if(|(at, _)| *at <= elapsed) {
            info!(time = at, input = ?input, "注入输入");
            match input {
                Input::Status(status) => interaction.on_target_status(status),
                Input::Click => interaction.on_button_clicked(),
            }
        }

        character.step_interaction(interaction, dt, 1);
        elapsed += dt;

        let sequence = interaction.sequence().state();
        let ragdoll = interaction.ragdoll().state();
        if sequence != last_sequence || ragdoll != last_ragdoll {
            info!(frame, time = elapsed, sequence = ?sequence, ragdoll = ?ragdoll, "状态变化");
            last_sequence = sequence;
            last_ragdoll = ragdoll;
        }
    }

    summarize(scenario, character, interaction, frames, elapsed)
}

fn summarize(
    scenario: Scenario,
    character: &SimCharacter,
    interaction: &TargetInteraction,
    frames: usize,
    elapsed: f32,
) -> Summary {
    let sequence: SequenceState = interaction.sequence().state();
    let ragdoll: RagdollState = interaction.ragdoll().state();

    Summary {
        scenario,
        frames,
        elapsed,
        sequence_state: format!("{sequence:?}"),
        ragdoll_state: format!("{ragdoll:?}"),
        character_active: character.root.is_active(),
        button_visible: character.button.is_visible(),
        button_label: character.button.label(),
        gravity: character.physics.gravity().to_array(),
        appear_particles: character.appear_particles.play_count(),
        disappear_particles: character.disappear_particles.play_count(),
        ragdoll_one_shots: character.ragdoll_sfx.one_shot_volumes().len(),
        messages: character.bridge.sent(),
    }
}
