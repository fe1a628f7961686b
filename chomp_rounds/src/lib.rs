use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub type PlayerId = i64;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining: Duration },
    Expired,
}

/// Receives the once-per-second ticks and the single expiry of a round.
/// Implementations must tolerate being called for a player whose prompt is
/// already gone; the timer is the source of truth, not the displayed
/// countdown.
#[async_trait]
pub trait CountdownChannel: Send + Sync + 'static {
    async fn send_countdown_event(&self, player: PlayerId, event: CountdownEvent);
}

struct ActiveRound {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
    started_at: Instant,
    duration: Duration,
}

impl ActiveRound {
    // Cancellation must happen while the registry lock is held; the expiry
    // path checks the token under the same lock before delivering anything.
    fn revoke(&self) {
        self.cancellation_token.cancel();
    }

    async fn join(self) {
        let _ = self.task.await;
    }
}

/// What `stop` reports about the round it ended. Always satisfies
/// `elapsed + remaining == duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoppedRound {
    pub elapsed: Duration,
    pub remaining: Duration,
}

type RoundStore = Mutex<HashMap<PlayerId, ActiveRound>>;

/// Registry of per-player countdowns. At most one round is live per player;
/// all mutations go through the registry lock, and the expiry path re-checks
/// cancellation inside that lock, so a tick can never race a stop.
pub struct RoundTimer {
    rounds: Arc<RoundStore>,
    channel: Arc<dyn CountdownChannel>,
}

impl RoundTimer {
    pub fn new(channel: Arc<dyn CountdownChannel>) -> Self {
        Self {
            rounds: Arc::new(Mutex::new(HashMap::new())),
            channel,
        }
    }

    /// Starts a round for `player`. A round already running for the same
    /// player is cancelled first and fully awaited, so none of its callbacks
    /// can fire once this returns; its remaining time is discarded.
    pub async fn start(&self, player: PlayerId, duration: Duration) {
        let previous = {
            let mut rounds = self.rounds.lock().await;
            let previous = rounds.remove(&player);
            if let Some(previous) = &previous {
                previous.revoke();
            }
            previous
        };
        if let Some(previous) = previous {
            log::info!("Replacing the active round for player {player}");
            previous.join().await;
        }

        let mut rounds = self.rounds.lock().await;
        let cancellation_token = CancellationToken::new();
        let started_at = Instant::now();
        let task = tokio::spawn(run_round(
            player,
            duration,
            started_at,
            cancellation_token.child_token(),
            Arc::clone(&self.rounds),
            Arc::clone(&self.channel),
        ));

        rounds.insert(
            player,
            ActiveRound {
                task,
                cancellation_token,
                started_at,
                duration,
            },
        );
    }

    /// Stops the player's round, if any, and reports how far into it they
    /// were. Once this returns no further tick or expiry will be delivered.
    /// Stopping with no active round is a no-op.
    pub async fn stop(&self, player: PlayerId) -> Option<StoppedRound> {
        let round = {
            let mut rounds = self.rounds.lock().await;
            let round = rounds.remove(&player)?;
            round.revoke();
            round
        };
        let elapsed = round.started_at.elapsed().min(round.duration);
        let duration = round.duration;
        round.join().await;

        Some(StoppedRound {
            elapsed,
            remaining: duration - elapsed,
        })
    }

    pub async fn is_active(&self, player: PlayerId) -> bool {
        self.rounds.lock().await.contains_key(&player)
    }
}

async fn run_round(
    player: PlayerId,
    duration: Duration,
    started_at: Instant,
    cancellation_token: CancellationToken,
    rounds: Arc<RoundStore>,
    channel: Arc<dyn CountdownChannel>,
) {
    let mut interval = time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            _ = interval.tick() => {
                let elapsed = started_at.elapsed();
                if elapsed >= duration {
                    // The registry lock orders expiry against stop/start: if
                    // a stop won the race, the token is already cancelled and
                    // nothing may be delivered.
                    let mut rounds = rounds.lock().await;
                    if cancellation_token.is_cancelled() {
                        break;
                    }
                    rounds.remove(&player);
                    drop(rounds);

                    channel
                        .send_countdown_event(player, CountdownEvent::Expired)
                        .await;
                    break;
                }

                channel
                    .send_countdown_event(
                        player,
                        CountdownEvent::Tick { remaining: duration - elapsed },
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests;
