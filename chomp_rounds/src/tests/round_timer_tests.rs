use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;

use crate::{CountdownChannel, CountdownEvent, PlayerId, RoundTimer};

type ReceivedEvents = Arc<Mutex<Vec<(PlayerId, CountdownEvent)>>>;

#[derive(Clone)]
struct RecordingChannel {
    events: ReceivedEvents,
}

#[async_trait]
impl CountdownChannel for RecordingChannel {
    async fn send_countdown_event(&self, player: PlayerId, event: CountdownEvent) {
        self.events.lock().unwrap().push((player, event));
    }
}

struct TestContext {
    events: ReceivedEvents,
    timer: RoundTimer,
}

impl TestContext {
    fn new() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let channel = RecordingChannel {
            events: events.clone(),
        };

        Self {
            events,
            timer: RoundTimer::new(Arc::new(channel)),
        }
    }

    fn events_for(&self, player: PlayerId) -> Vec<CountdownEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == player)
            .map(|(_, event)| *event)
            .collect()
    }

    fn expiries_for(&self, player: PlayerId) -> usize {
        self.events_for(player)
            .iter()
            .filter(|event| **event == CountdownEvent::Expired)
            .count()
    }
}

async fn wait(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[tokio::test(start_paused = true)]
async fn full_round_ticks_once_per_second_then_expires() {
    let ctx = TestContext::new();
    ctx.timer.start(1, Duration::from_secs(10)).await;

    wait(Duration::from_secs(11)).await;

    let events = ctx.events_for(1);
    assert_eq!(events.len(), 11, "10 ticks and one expiry");
    for (i, event) in events.iter().take(10).enumerate() {
        assert_eq!(
            *event,
            CountdownEvent::Tick {
                remaining: Duration::from_secs(10 - i as u64)
            }
        );
    }
    assert_eq!(*events.last().unwrap(), CountdownEvent::Expired);
    assert!(!ctx.timer.is_active(1).await);
}

#[tokio::test(start_paused = true)]
async fn stop_reports_elapsed_and_suppresses_later_callbacks() {
    let ctx = TestContext::new();
    ctx.timer.start(1, Duration::from_secs(10)).await;

    wait(Duration::from_secs(3)).await;
    let stopped = ctx.timer.stop(1).await.unwrap();
    assert_eq!(stopped.elapsed, Duration::from_secs(3));
    assert_eq!(stopped.remaining, Duration::from_secs(7));

    let seen = ctx.events_for(1).len();
    wait(Duration::from_secs(30)).await;

    assert_eq!(ctx.events_for(1).len(), seen);
    assert_eq!(ctx.expiries_for(1), 0);
}

#[tokio::test]
async fn stop_without_a_round_is_a_noop() {
    let ctx = TestContext::new();
    assert!(ctx.timer.stop(1).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn restart_resets_the_clock_and_keeps_a_single_round() {
    let ctx = TestContext::new();
    ctx.timer.start(1, Duration::from_secs(10)).await;
    wait(Duration::from_secs(5)).await;

    ctx.timer.start(1, Duration::from_secs(10)).await;
    assert!(ctx.timer.is_active(1).await);

    // Eight seconds after the restart the old deadline has passed but the
    // new one has not.
    wait(Duration::from_secs(8)).await;
    assert!(ctx.timer.is_active(1).await);
    assert_eq!(ctx.expiries_for(1), 0);

    wait(Duration::from_secs(3)).await;
    assert!(!ctx.timer.is_active(1).await);
    assert_eq!(ctx.expiries_for(1), 1);
}

#[tokio::test(start_paused = true)]
async fn restarting_discards_the_old_rounds_ticks() {
    let ctx = TestContext::new();
    ctx.timer.start(1, Duration::from_secs(100)).await;
    wait(Duration::from_secs(2)).await;

    ctx.timer.start(1, Duration::from_secs(10)).await;
    let seen = ctx.events_for(1).len();

    wait(Duration::from_secs(5)).await;
    let fresh = &ctx.events_for(1)[seen..];

    // Every tick after the restart counts down from the new duration.
    assert!(!fresh.is_empty());
    assert!(fresh.iter().all(|event| match event {
        CountdownEvent::Tick { remaining } => *remaining <= Duration::from_secs(10),
        CountdownEvent::Expired => false,
    }));
}

#[tokio::test(start_paused = true)]
async fn players_do_not_share_rounds() {
    let ctx = TestContext::new();
    ctx.timer.start(1, Duration::from_secs(10)).await;
    wait(Duration::from_secs(2)).await;
    ctx.timer.start(2, Duration::from_secs(10)).await;

    let stopped = ctx.timer.stop(1).await.unwrap();
    assert_eq!(stopped.elapsed, Duration::from_secs(2));
    assert!(ctx.timer.is_active(2).await);

    // Player 2 still runs to its own deadline, 12s into the test.
    wait(Duration::from_secs(9)).await;
    assert!(ctx.timer.is_active(2).await);
    assert_eq!(ctx.expiries_for(2), 0);

    wait(Duration::from_secs(2)).await;
    assert_eq!(ctx.expiries_for(2), 1);
    assert_eq!(ctx.expiries_for(1), 0);
}

#[tokio::test(start_paused = true)]
async fn expiry_is_delivered_exactly_once() {
    let ctx = TestContext::new();
    ctx.timer.start(1, Duration::from_secs(3)).await;

    wait(Duration::from_secs(60)).await;

    assert_eq!(ctx.expiries_for(1), 1);
    assert!(ctx.timer.stop(1).await.is_none());
}

fn tokio_ct(future: impl Future<Output = ()>) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(future);
}

proptest! {
    #[test]
    fn elapsed_and_remaining_always_account_for_the_full_duration(
        duration_secs in 2u64..180,
        stop_after in 1u64..180,
    ) {
        let stop_after = stop_after.min(duration_secs - 1);
        tokio_ct(async move {
            let ctx = TestContext::new();
            ctx.timer.start(1, Duration::from_secs(duration_secs)).await;
            wait(Duration::from_secs(stop_after)).await;

            let stopped = ctx.timer.stop(1).await.unwrap();
            assert_eq!(
                stopped.elapsed + stopped.remaining,
                Duration::from_secs(duration_secs)
            );
            assert_eq!(stopped.elapsed, Duration::from_secs(stop_after));
        });
    }
}
