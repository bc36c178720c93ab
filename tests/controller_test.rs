/*!
 * Phase Controller Integration Tests
 *
 * Liveness, alternation and shutdown of the toggle task, for both
 * broadcast and queue delivery
 */

use phase_driver::{
    ChannelError, ControllerConfig, Delivery, FixedInterval, Phase, PhaseController, PhaseError,
    RetrievalPolicy, SyncChannel, UniformInterval,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound used to turn a liveness property into a failing test
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

fn controller_with(delivery: Delivery, interval: Duration) -> PhaseController {
    let config = ControllerConfig {
        delivery,
        ..ControllerConfig::default()
    };
    PhaseController::with_interval_source(config, FixedInterval::new(interval)).unwrap()
}

#[test]
fn test_zero_interval_reaches_green() {
    for delivery in [
        Delivery::Broadcast,
        Delivery::Queue(RetrievalPolicy::Lifo),
        Delivery::Queue(RetrievalPolicy::Fifo),
    ] {
        let controller = controller_with(delivery, Duration::ZERO);
        assert_eq!(controller.current_phase(), Phase::Red);

        controller.start().unwrap();
        let result = controller.wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT);
        assert_eq!(result, Ok(()), "delivery {:?}", delivery);

        controller.stop().unwrap();
    }
}

#[test]
fn test_unstarted_controller_stays_red() {
    let controller = PhaseController::new();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(controller.current_phase(), Phase::Red);
    assert_eq!(
        controller.wait_for_phase_timeout(Phase::Green, Duration::from_millis(100)),
        Err(PhaseError::Timeout)
    );
    assert_eq!(controller.current_phase(), Phase::Red);
    assert_eq!(controller.stats().transitions, 0);
}

#[test]
fn test_consecutive_waits_need_a_full_toggle_pair() {
    let controller = PhaseController::with_interval_source(
        ControllerConfig::immediate(),
        FixedInterval::immediate(),
    )
    .unwrap();
    controller.start().unwrap();

    controller
        .wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT)
        .unwrap();
    let first = controller.stats();
    assert!(first.green_entries >= 1);
    assert!(first.transitions >= 1);

    controller
        .wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT)
        .unwrap();
    let second = controller.stats();
    assert!(second.green_entries >= first.green_entries + 1);
    // RED -> GREEN -> RED -> GREEN at minimum
    assert!(second.transitions >= 3);

    controller.stop().unwrap();
}

#[test]
fn test_queued_consecutive_waits_consume_one_green_each() {
    // Each ticket releases exactly one toggle; a closed ticket box parks the task
    let tickets = Arc::new(SyncChannel::new(RetrievalPolicy::Fifo));
    let task_tickets = tickets.clone();
    let source = move || match task_tickets.receive() {
        Ok(()) => Duration::ZERO,
        Err(_) => Duration::MAX,
    };

    let config = ControllerConfig::default().queued(RetrievalPolicy::Fifo);
    let controller = PhaseController::with_interval_source(config, source).unwrap();
    controller.start().unwrap();

    // RED -> GREEN
    tickets.send(());
    controller
        .wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT)
        .unwrap();
    let stats = controller.stats();
    assert_eq!(stats.transitions, 1);
    assert_eq!(stats.pending, 0);

    // GREEN -> RED alone must not satisfy a wait for GREEN
    tickets.send(());
    assert_eq!(
        controller.wait_for_phase_timeout(Phase::Green, Duration::from_millis(200)),
        Err(PhaseError::Timeout)
    );
    let stats = controller.stats();
    assert_eq!(stats.transitions, 2);
    assert_eq!(stats.phase, Phase::Red);
    assert_eq!(stats.pending, 0);

    // RED -> GREEN
    tickets.send(());
    controller
        .wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT)
        .unwrap();
    let stats = controller.stats();
    assert_eq!(stats.transitions, 3);
    assert_eq!(stats.green_entries, 2);
    assert_eq!(stats.pending, 0);

    tickets.close();
    controller.stop().unwrap();
    let transitions = controller.transitions().unwrap();
    assert_eq!(transitions.try_receive(), Err(ChannelError::Closed));
}

#[test]
fn test_wait_with_max_timeout() {
    for delivery in [Delivery::Broadcast, Delivery::Queue(RetrievalPolicy::Lifo)] {
        let controller = controller_with(delivery, Duration::from_millis(5));
        controller.start().unwrap();

        assert_eq!(
            controller.wait_for_phase_timeout(Phase::Green, Duration::MAX),
            Ok(()),
            "delivery {:?}",
            delivery
        );
        controller.stop().unwrap();
    }
}

#[test]
fn test_max_interval_parks_task_until_stop() {
    let controller = controller_with(Delivery::Broadcast, Duration::from_secs(u64::MAX));
    controller.start().unwrap();

    thread::sleep(Duration::from_millis(50));
    assert!(controller.is_running());
    assert_eq!(
        controller.wait_for_phase_timeout(Phase::Green, Duration::from_millis(50)),
        Err(PhaseError::Timeout)
    );

    let start = Instant::now();
    assert_eq!(controller.stop(), Ok(()));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(controller.current_phase(), Phase::Red);
}

#[test]
fn test_panicking_interval_source_releases_waiters() {
    for delivery in [Delivery::Broadcast, Delivery::Queue(RetrievalPolicy::Fifo)] {
        let config = ControllerConfig {
            delivery,
            ..ControllerConfig::default()
        };
        let source = || -> Duration { panic!("interval source failed") };
        let controller = Arc::new(PhaseController::with_interval_source(config, source).unwrap());

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let controller_clone = controller.clone();
                thread::spawn(move || controller_clone.wait_for_phase(Phase::Green))
            })
            .collect();

        // Waiters block before the task dies
        thread::sleep(Duration::from_millis(50));
        controller.start().unwrap();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Err(PhaseError::Stopped), "delivery {:?}", delivery);
        }
        assert!(!controller.is_running());
        assert_eq!(controller.wait_for_phase(Phase::Green), Err(PhaseError::Stopped));
        assert_eq!(controller.stop(), Err(PhaseError::TaskPanicked));
    }
}

#[test]
fn test_published_phases_alternate() {
    let controller = controller_with(
        Delivery::Queue(RetrievalPolicy::Fifo),
        Duration::from_millis(1),
    );
    let transitions = controller.transitions().unwrap();
    controller.start().unwrap();

    let observed: Vec<_> = (0..20)
        .map(|_| transitions.receive_timeout(LIVENESS_TIMEOUT).unwrap())
        .collect();
    controller.stop().unwrap();

    assert_eq!(observed[0], Phase::Green);
    for pair in observed.windows(2) {
        assert_ne!(pair[0], pair[1], "phases must alternate: {:?}", observed);
    }
}

#[test]
fn test_random_interval_liveness() {
    let min = Duration::from_millis(20);
    let max = Duration::from_millis(60);
    let config = ControllerConfig::default().with_intervals(min, max);
    let controller =
        PhaseController::with_interval_source(config, UniformInterval::seeded(42, min, max))
            .unwrap();

    controller.start().unwrap();
    let start = Instant::now();
    controller
        .wait_for_phase_timeout(Phase::Green, max + Duration::from_secs(1))
        .unwrap();
    assert!(start.elapsed() >= min);

    controller.stop().unwrap();
}

#[test]
fn test_single_waiter_returns_only_after_green() {
    for delivery in [Delivery::Broadcast, Delivery::Queue(RetrievalPolicy::Lifo)] {
        let controller = controller_with(delivery, Duration::from_millis(200));
        controller.start().unwrap();

        let start = Instant::now();
        controller
            .wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT)
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(150));
        assert!(controller.stats().green_entries >= 1);
        controller.stop().unwrap();
    }
}

#[test]
fn test_broadcast_wakes_every_waiter() {
    let controller = Arc::new(controller_with(Delivery::Broadcast, Duration::from_millis(50)));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let controller_clone = controller.clone();
            thread::spawn(move || {
                controller_clone.wait_for_phase_timeout(Phase::Green, LIVENESS_TIMEOUT)
            })
        })
        .collect();

    // Give waiters time to block before the first toggle
    thread::sleep(Duration::from_millis(20));
    controller.start().unwrap();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }
    controller.stop().unwrap();
}

#[test]
fn test_broadcast_waiters_for_both_phases() {
    let controller = Arc::new(controller_with(Delivery::Broadcast, Duration::from_millis(10)));
    controller.start().unwrap();

    let handles: Vec<_> = [Phase::Green, Phase::Red, Phase::Green, Phase::Red]
        .into_iter()
        .map(|target| {
            let controller_clone = controller.clone();
            thread::spawn(move || controller_clone.wait_for_phase_timeout(target, LIVENESS_TIMEOUT))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }
    controller.stop().unwrap();
}

#[test]
fn test_stop_releases_blocked_waiters() {
    for delivery in [Delivery::Broadcast, Delivery::Queue(RetrievalPolicy::Fifo)] {
        let controller = Arc::new(controller_with(delivery, Duration::from_secs(60)));
        controller.start().unwrap();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let controller_clone = controller.clone();
                thread::spawn(move || controller_clone.wait_for_phase(Phase::Green))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        controller.stop().unwrap();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Err(PhaseError::Stopped));
        }
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!controller.is_running());
    }
}

#[test]
fn test_wait_after_stop_fails_fast() {
    let controller = controller_with(Delivery::Broadcast, Duration::from_secs(60));
    controller.start().unwrap();
    controller.stop().unwrap();

    assert_eq!(controller.wait_for_phase(Phase::Green), Err(PhaseError::Stopped));
}

#[test]
fn test_drop_while_running_stops_task() {
    let controller = controller_with(Delivery::Broadcast, Duration::from_secs(60));
    controller.start().unwrap();
    assert!(controller.is_running());

    let start = Instant::now();
    drop(controller);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_invalid_config_rejected() {
    let config = ControllerConfig::default()
        .with_intervals(Duration::from_secs(5), Duration::from_secs(1));
    assert!(matches!(
        PhaseController::with_config(config),
        Err(PhaseError::InvalidConfig(_))
    ));
}

#[test]
fn test_stats_serialize() {
    let controller = PhaseController::new();
    let json = serde_json::to_value(controller.stats()).unwrap();

    assert_eq!(json["phase"], "red");
    assert_eq!(json["transitions"], 0);
    assert_eq!(json["running"], false);
}
