//! Integration tests for bridge notifications and session events.

use anyhow::Result;
use hotreload_kernel::bridge::{self, BridgeEvent, BridgeListener};
use hotreload_kernel::events::SessionEvent;
use hotreload_kernel::session::BreakState;

mod common;

/// Break notifications reach the coordinator and are published as events.
#[tokio::test]
async fn test_bridge_events_drive_break_state() -> Result<()> {
    let ctx = common::IntegrationTestContext::with_files(&[("app/main.rs", "fn main() {}")]).await?;
    let mut events = ctx.coordinator.subscribe();

    let (tx, rx) = bridge::channel(4);
    let listener = BridgeListener::new(ctx.coordinator.clone(), rx).spawn(ctx.cancel.clone());

    tx.send(BridgeEvent::BreakEntered).await?;
    assert_eq!(
        events.recv().await?,
        SessionEvent::BreakStateChanged {
            break_state: BreakState::Broken
        }
    );

    tx.send(BridgeEvent::BreakExited).await?;
    assert_eq!(
        events.recv().await?,
        SessionEvent::BreakStateChanged {
            break_state: BreakState::Running
        }
    );

    drop(tx);
    assert_eq!(listener.await?, 2);
    assert_eq!(
        ctx.coordinator.status().break_state,
        Some(BreakState::Running)
    );
    Ok(())
}

/// Edits picked up by the watcher show up as computed and committed events.
#[tokio::test]
async fn test_watcher_cycle_publishes_events() -> Result<()> {
    let ctx = common::IntegrationTestContext::with_files(&[("app/main.rs", "fn main() {}")]).await?;
    let mut events = ctx.coordinator.subscribe();

    ctx.write("app/main.rs", "fn main() { 3; }")?;
    ctx.watcher.tick(&ctx.cancel).await?;

    let computed = serde_json::to_value(events.recv().await?)?;
    assert_eq!(computed["event"], "updates_computed");
    assert_eq!(computed["deltas"], 1);
    assert_eq!(events.recv().await?, SessionEvent::Committed { version: 3 });
    Ok(())
}

/// Ending the session stops further work.
#[tokio::test]
async fn test_end_session_stops_cycle() -> Result<()> {
    let ctx = common::IntegrationTestContext::with_files(&[("app/main.rs", "fn main() {}")]).await?;
    ctx.coordinator.end_session(&ctx.cancel).await?;

    ctx.write("app/main.rs", "fn main() { 4; }")?;
    assert_eq!(
        ctx.watcher.tick(&ctx.cancel).await?,
        hotreload_kernel::watch::TickOutcome::Inactive
    );
    Ok(())
}
