use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket handed out for one dashboard load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Latest-request-wins ordering for loads re-triggered on filter changes.
///
/// Every load takes a ticket before it starts. When it finishes, its result
/// is only delivered if no newer ticket has been issued in the meantime, so
/// a slow stale response never overwrites a newer one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Run `request` under a fresh ticket; `None` if it was superseded.
    pub async fn run_latest<F>(&self, request: F) -> Option<F::Output>
    where
        F: Future,
    {
        let ticket = self.begin();
        let output = request.await;
        if self.is_current(ticket) {
            Some(output)
        } else {
            log::debug!("Discarding result of superseded request {}", ticket.value());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_newer_ticket_supersedes() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin();
        assert!(sequencer.is_current(first));
        let second = sequencer.begin();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_slow_stale_request_is_dropped() {
        let sequencer = Arc::new(RequestSequencer::new());

        let slow = {
            let sequencer = sequencer.clone();
            tokio::spawn(async move {
                sequencer
                    .run_latest(async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        "stale"
                    })
                    .await
            })
        };
        // Let the slow request take its ticket first
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fast = sequencer.run_latest(async { "fresh" }).await;

        assert_eq!(fast, Some("fresh"));
        assert_eq!(slow.await.unwrap(), None);
    }
}
