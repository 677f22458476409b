//! Change trigger source and the engine event loop
//!
//! Two producers feed one consumer: subtree-mutation signals from the
//! document and a fixed-interval safety-net timer. Both collapse into the
//! same [`EngineEvent::Tick`], so idempotency is enforced once, in the
//! controller. Clicks arrive on the same event stream.

use crate::controller::InjectionEngine;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default safety-net tick period
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1500);

/// Events consumed by the engine loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Re-evaluate the tree (mutation burst or timer)
    Tick,
    /// User click on a rendered affordance, tagged by `data-action`
    Click(String),
}

/// Merge mutation signals and a periodic timer into tick events
///
/// Mutation bursts are drained and coalesced into a single tick. A full
/// event queue drops the tick; the timer guarantees another one arrives.
/// The task ends when the event receiver is gone; a closed mutation channel
/// leaves the timer running alone.
pub fn spawn_trigger(
    mut mutations: mpsc::UnboundedReceiver<()>,
    period: Duration,
    events: mpsc::Sender<EngineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut mutations_open = true;
        loop {
            tokio::select! {
                signal = mutations.recv(), if mutations_open => {
                    match signal {
                        Some(()) => {
                            while mutations.try_recv().is_ok() {}
                            tracing::debug!("mutation burst observed");
                        }
                        None => {
                            mutations_open = false;
                            continue;
                        }
                    }
                }
                _ = timer.tick() => {}
            }
            if let Err(mpsc::error::TrySendError::Closed(_)) = events.try_send(EngineEvent::Tick)
            {
                break;
            }
        }
        tracing::debug!("trigger source shutting down");
    })
}

/// Consume the event stream until it closes
///
/// Ticks are handled inline; clicks are spawned so a long-running activation
/// never blocks tick handling. A tick that does nothing is a no-op, never a
/// loop exit.
pub async fn run_engine(engine: InjectionEngine, mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::Tick => {
                engine.tick();
            }
            EngineEvent::Click(action) => {
                let engine = engine.clone();
                tokio::spawn(async move { engine.handle_click(&action).await });
            }
        }
    }
    tracing::debug!("event stream closed; engine loop ending");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timer_produces_ticks_without_mutations() {
        let (_mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::channel(8);
        spawn_trigger(mutation_rx, Duration::from_millis(100), event_tx);

        assert_eq!(event_rx.recv().await, Some(EngineEvent::Tick));
        assert_eq!(event_rx.recv().await, Some(EngineEvent::Tick));
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_burst_coalesces_into_one_tick() {
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::channel(8);
        spawn_trigger(mutation_rx, Duration::from_secs(3600), event_tx);

        // First timer fire happens immediately; absorb it.
        assert_eq!(event_rx.recv().await, Some(EngineEvent::Tick));

        for _ in 0..5 {
            mutation_tx.send(()).unwrap();
        }
        assert_eq!(event_rx.recv().await, Some(EngineEvent::Tick));
        // The burst collapsed into that single tick; no backlog remains.
        tokio::task::yield_now().await;
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_survives_closed_mutation_channel() {
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel::<()>();
        let (event_tx, mut event_rx) = mpsc::channel(8);
        spawn_trigger(mutation_rx, Duration::from_millis(100), event_tx);

        drop(mutation_tx);
        assert_eq!(event_rx.recv().await, Some(EngineEvent::Tick));
        assert_eq!(event_rx.recv().await, Some(EngineEvent::Tick));
    }
}
