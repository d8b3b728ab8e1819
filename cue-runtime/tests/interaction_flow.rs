//! # 交互流程集成测试
//!
//! 模拟一次完整的识别会话：识别 → 播放 → 完成 → 再播放 → 打断 → 丢失追踪。
//! 这些测试不依赖真实的追踪/界面设备。

use cue_runtime::sim::SimCharacter;
use cue_runtime::{
    NodeActivation, PhysicsWorld, RagdollState, SequenceState, StageConfig, TargetEvent,
    TargetMessage, TrackingStatus,
};

const DT: f32 = 0.25;

#[test]
fn test_full_session() {
    let config = StageConfig::default();
    let character = SimCharacter::new(&config.sequence.state_name, 2.0);
    let mut interaction = character.rig().interaction(&config);
    let gravity = character.physics.gravity();

    // 1. 识别目标
    interaction.on_target_status(TrackingStatus::Tracked);
    assert!(character.button.is_visible());
    assert_eq!(character.button.label(), "Luister!");

    // 2. 播放，完整走完序列和保持
    interaction.on_button_clicked();
    assert_eq!(character.button.label(), "Stop!");
    assert_eq!(character.appear_sound.play_count(), 1);
    assert_eq!(character.pop_sfx.play_count(), 1);

    character.step_interaction(&mut interaction, DT, 8);
    assert_eq!(interaction.sequence().state(), SequenceState::Idle);
    assert_eq!(character.disappear_particles.play_count(), 1);
    assert_eq!(character.disappear_sfx.play_count(), 1);
    // 出现粒子延迟 0.2 秒后播放过一次
    assert_eq!(character.appear_particles.play_count(), 1);

    character.step_interaction(&mut interaction, DT, 2);
    assert!(!character.root.is_active());
    assert_eq!(character.button.label(), "Luister!");

    // 3. 再次播放，中途打断
    interaction.on_button_clicked();
    assert!(character.root.is_active());
    character.step_interaction(&mut interaction, DT, 2);
    interaction.on_button_clicked();
    assert_eq!(interaction.ragdoll().state(), RagdollState::Active);
    assert!(!character.button.is_visible());
    assert_ne!(character.physics.gravity(), gravity);

    // 4. 丢失追踪：立即全部复位
    interaction.on_target_status(TrackingStatus::NoPose);
    assert_eq!(interaction.ragdoll().state(), RagdollState::Inactive);
    assert_eq!(character.physics.gravity(), gravity);
    assert!(!character.root.is_active());
    assert!(!character.button.is_visible());

    // 丢失追踪后点击无效，倒计时也不会再触发任何东西
    interaction.on_button_clicked();
    character.step_interaction(&mut interaction, DT, 40);
    assert_eq!(interaction.sequence().state(), SequenceState::Idle);
    assert!(!character.button.is_visible());

    let messages: Vec<TargetMessage> = character
        .bridge
        .sent()
        .iter()
        .map(|payload| TargetMessage::from_payload(payload).unwrap())
        .collect();
    let events: Vec<TargetEvent> = messages.iter().map(|m| m.event_type).collect();
    assert_eq!(
        events,
        vec![TargetEvent::Recognized, TargetEvent::Listen, TargetEvent::Listen]
    );
    assert!(messages.iter().all(|m| m.id == 1 && m.name == "nurofen"));
}

#[test]
fn test_untrack_during_finish_hold() {
    let config = StageConfig::default();
    let character = SimCharacter::new(&config.sequence.state_name, 2.0);
    let mut interaction = character.rig().interaction(&config);

    interaction.on_target_status(TrackingStatus::Tracked);
    interaction.on_button_clicked();
    character.step_interaction(&mut interaction, DT, 8);
    assert!(interaction.is_holding());

    interaction.on_target_status(TrackingStatus::Limited);
    assert!(!interaction.is_holding());

    // 被取消的保持阶段不会在重新识别后再触发
    interaction.on_target_status(TrackingStatus::ExtendedTracked);
    character.step_interaction(&mut interaction, DT, 4);
    assert!(!character.root.is_active());
    assert!(character.button.is_visible());
    assert_eq!(character.button.label(), "Luister!");
}

#[test]
fn test_messages_disabled_by_config() {
    let mut config = StageConfig::default();
    config.interaction.send_on_recognized = false;
    config.interaction.send_on_listen_click = false;
    let character = SimCharacter::new(&config.sequence.state_name, 2.0);
    let mut interaction = character.rig().interaction(&config);

    interaction.on_target_status(TrackingStatus::Tracked);
    interaction.on_button_clicked();
    character.step_interaction(&mut interaction, DT, 12);

    assert!(character.bridge.sent().is_empty());
}
