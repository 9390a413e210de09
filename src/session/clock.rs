use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::providers::Transport;

use super::SessionHandle;

/// Periodically report the transport clock to a session.
///
/// Stops when the session goes away.
pub fn spawn_clock(transport: Arc<dyn Transport>, session: SessionHandle, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if session.post_tick(transport.current_time()).await.is_err() {
                debug!("Clock stopped, session closed");
                break;
            }
        }
    })
}
