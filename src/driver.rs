use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::bot::BotContext;
use crate::platform::UpdateSource;

/// Waits between a failed receive and the next attempt.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Real-time pause backed by the tokio timer
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub cycles: u64,
    pub messages: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Receive succeeded; this many messages were handled
    Handled(usize),
    /// Receive failed; the driver paused before returning
    Restarted,
}

/// Receives messages forever, one batch at a time, restarting after
/// any receive failure with a fixed delay.
pub struct PollingDriver<S, P> {
    source: S,
    pause: P,
    context: BotContext,
    restart_delay: Duration,
    stats: DriverStats,
}

impl<S: UpdateSource, P: Pause> PollingDriver<S, P> {
    pub fn new(source: S, pause: P, context: BotContext, restart_delay: Duration) -> Self {
        Self {
            source,
            pause,
            context,
            restart_delay,
            stats: DriverStats::default(),
        }
    }

    #[cfg(test)]
    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// One receive, then each message handled in order.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.cycles += 1;

        match self.source.receive().await {
            Ok(messages) => {
                for msg in &messages {
                    self.context.handle(msg).await;
                }
                self.stats.messages += messages.len() as u64;
                CycleOutcome::Handled(messages.len())
            }
            Err(e) => {
                self.stats.failures += 1;
                error!("Polling error: {:#}", e);
                self.pause.pause(self.restart_delay).await;
                info!(
                    "Restarting polling after {:?} (failure #{}, {} cycles, {} messages handled)",
                    self.restart_delay,
                    self.stats.failures,
                    self.stats.cycles,
                    self.stats.messages
                );
                CycleOutcome::Restarted
            }
        }
    }

    /// Run until the process is stopped.
    pub async fn run(mut self) {
        info!("Bot is running...");
        loop {
            self.run_cycle().await;
        }
    }
}
