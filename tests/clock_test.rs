//! Clock service tests: ticking, increments, flag falls and the
//! pause-while-thinking knob.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chessbot_arena::{ClockConfig, ClockService, EndReason, NullEngine, Side, Status};
use common::{SlowStrategy, test_controller, wait_for};

#[tokio::test]
async fn tick_before_start_does_nothing() {
    let (controller, notifier, _dir) = test_controller(Arc::new(NullEngine), (0, 0));
    let clock = ClockService::new(controller.clone(), ClockConfig::default());

    clock.tick().await;

    let view = controller.snapshot().await;
    assert_eq!(*view.status(), Status::Waiting);
    assert_eq!(*view.clock_white(), 600);
    assert!(notifier.lines().is_empty());
}

#[tokio::test]
async fn tick_charges_the_side_to_move() {
    let (controller, notifier, _dir) = test_controller(Arc::new(NullEngine), (0, 0));
    let clock = ClockService::new(controller.clone(), ClockConfig::default());

    controller.reset(5, 10, 0, Side::White).await;
    clock.tick().await;

    let view = controller.snapshot().await;
    assert_eq!(*view.clock_white(), 9);
    assert_eq!(*view.clock_black(), 10);
    assert!(notifier.contains("TIME:9,10"));
    assert!(view.display()[1].starts_with("W00:09 B00:10"));
}

#[tokio::test]
async fn flag_fall_ends_the_game() {
    let (controller, notifier, _dir) = test_controller(Arc::new(NullEngine), (0, 0));
    let clock = ClockService::new(controller.clone(), ClockConfig::default());

    controller.reset(5, 1, 0, Side::White).await;
    clock.tick().await;

    let view = controller.snapshot().await;
    assert_eq!(*view.status(), Status::GameOver);
    let end = view.end().expect("game ended");
    assert_eq!(*end.reason(), EndReason::Timeout);
    assert_eq!(*end.winner(), Some(Side::Black));
    assert!(notifier.contains("CHECKMATE:BLACK"));
    assert!(view.display()[0].starts_with("Black Wins!"));

    controller.send_recent_history();
    assert!(notifier.contains("HISTORY_ADD:Play-Engi 0-1"));
}

#[tokio::test]
async fn ticks_after_game_over_are_ignored() {
    let (controller, _notifier, _dir) = test_controller(Arc::new(NullEngine), (0, 0));
    let clock = ClockService::new(controller.clone(), ClockConfig::default());

    controller.reset(5, 1, 0, Side::White).await;
    clock.tick().await;
    clock.tick().await;

    let view = controller.snapshot().await;
    assert_eq!(*view.clock_black(), 1, "loser's opponent keeps their time");
}

#[tokio::test]
async fn committed_move_credits_the_increment() {
    let (controller, _notifier, _dir) = test_controller(Arc::new(NullEngine), (0, 0));

    controller.reset(5, 60, 5, Side::White).await;
    controller.process_move("e2e4").await;

    let view = controller.snapshot().await;
    assert_eq!(*view.clock_white(), 65);
    assert_eq!(*view.clock_black(), 60);
}

#[tokio::test]
async fn paused_clock_does_not_charge_a_thinking_opponent() {
    let strategy = Arc::new(SlowStrategy {
        reply: "e7e5".to_string(),
        delay: Duration::from_millis(500),
    });
    let (controller, _notifier, _dir) = test_controller(strategy, (0, 0));
    let clock = ClockService::new(
        controller.clone(),
        ClockConfig {
            pause_while_thinking: true,
        },
    );

    controller.reset(5, 60, 0, Side::White).await;
    controller.process_move("e2e4").await;

    // Let the reply task reach its search before ticking.
    tokio::time::sleep(Duration::from_millis(150)).await;
    clock.tick().await;

    let view = controller.snapshot().await;
    assert_eq!(*view.clock_black(), 60, "thinking opponent is not charged");

    // Once the reply lands the clock charges normally again.
    wait_for(&controller, |v| v.history().len() == 2).await;
    clock.tick().await;
    assert_eq!(*controller.snapshot().await.clock_white(), 59);
}

#[tokio::test]
async fn unpaused_clock_charges_through_a_search() {
    let strategy = Arc::new(SlowStrategy {
        reply: "e7e5".to_string(),
        delay: Duration::from_millis(500),
    });
    let (controller, _notifier, _dir) = test_controller(strategy, (0, 0));
    let clock = ClockService::new(controller.clone(), ClockConfig::default());

    controller.reset(5, 60, 0, Side::White).await;
    controller.process_move("e2e4").await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    clock.tick().await;

    assert_eq!(*controller.snapshot().await.clock_black(), 59);
}
