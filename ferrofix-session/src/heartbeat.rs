/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Heartbeat and TestRequest management.
//!
//! This module handles FIX session heartbeat logic including:
//! - Sending heartbeats at configured intervals
//! - Sending TestRequest when no messages received
//! - Detecting heartbeat timeouts
//!
//! All checks take the current instant explicitly, so a paused tokio clock
//! drives them in tests.

use ferrofix_core::types::Timestamp;
use std::time::Duration;
use tokio::time::Instant;

/// What the session should do on a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Nothing is due.
    None,
    /// Nothing was sent for an interval.
    SendHeartbeat,
    /// Nothing was received for the TestRequest delay.
    SendTestRequest,
    /// The TestRequest went unanswered.
    TimedOut,
}

/// Manages heartbeat timing for a FIX session.
#[derive(Debug)]
pub struct HeartbeatManager {
    interval: Duration,
    test_request_delay: Duration,
    last_sent: Instant,
    last_received: Instant,
    test_request_pending: Option<String>,
    test_request_sent_at: Option<Instant>,
}

impl HeartbeatManager {
    /// Creates a manager with the given interval and TestRequest delay multiplier.
    ///
    /// A TestRequest goes out once nothing was received for
    /// `interval * (1 + multiplier)`.
    #[must_use]
    pub fn new(interval: Duration, multiplier: f64, now: Instant) -> Self {
        Self {
            interval,
            test_request_delay: test_request_delay(interval, multiplier),
            last_sent: now,
            last_received: now,
            test_request_pending: None,
            test_request_sent_at: None,
        }
    }

    /// Records that a message was sent.
    #[inline]
    pub fn on_message_sent(&mut self, now: Instant) {
        self.last_sent = now;
    }

    /// Records that a message was received.
    ///
    /// Any inbound traffic proves the counterparty is alive, so a pending
    /// TestRequest is cleared.
    pub fn on_message_received(&mut self, now: Instant) {
        self.last_received = now;
        self.test_request_pending = None;
        self.test_request_sent_at = None;
    }

    /// Records that a TestRequest was sent.
    pub fn on_test_request_sent(&mut self, test_req_id: String, now: Instant) {
        self.test_request_pending = Some(test_req_id);
        self.test_request_sent_at = Some(now);
        self.last_sent = now;
    }

    /// Decides what is due at `now`.
    #[must_use]
    pub fn poll(&self, now: Instant) -> HeartbeatAction {
        if self.is_timed_out(now) {
            HeartbeatAction::TimedOut
        } else if self.should_send_test_request(now) {
            HeartbeatAction::SendTestRequest
        } else if self.should_send_heartbeat(now) {
            HeartbeatAction::SendHeartbeat
        } else {
            HeartbeatAction::None
        }
    }

    /// Checks if a heartbeat should be sent.
    #[must_use]
    pub fn should_send_heartbeat(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_sent) >= self.interval
    }

    /// Checks if a TestRequest should be sent.
    #[must_use]
    pub fn should_send_test_request(&self, now: Instant) -> bool {
        self.test_request_pending.is_none()
            && now.saturating_duration_since(self.last_received) >= self.test_request_delay
    }

    /// Checks if a TestRequest went unanswered for a full interval.
    #[must_use]
    pub fn is_timed_out(&self, now: Instant) -> bool {
        self.test_request_sent_at
            .is_some_and(|sent_at| now.saturating_duration_since(sent_at) >= self.interval)
    }

    /// Returns the pending TestRequest ID, if any.
    #[must_use]
    pub fn pending_test_request(&self) -> Option<&str> {
        self.test_request_pending.as_deref()
    }

    /// Returns the time since the last message was received.
    #[must_use]
    pub fn time_since_last_received(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_received)
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the interval, e.g. to the one the counterparty proposed.
    pub fn set_interval(&mut self, interval: Duration, multiplier: f64) {
        self.interval = interval;
        self.test_request_delay = test_request_delay(interval, multiplier);
    }

    /// Resets the manager state.
    pub fn reset(&mut self, now: Instant) {
        self.last_sent = now;
        self.last_received = now;
        self.test_request_pending = None;
        self.test_request_sent_at = None;
    }
}

fn test_request_delay(interval: Duration, multiplier: f64) -> Duration {
    interval.mul_f64(1.0 + multiplier.max(0.0))
}

/// Generates a TestReqID from the current UTC time.
#[must_use]
pub fn generate_test_req_id() -> String {
    format!("TEST-{}", Timestamp::now().format_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_heartbeat_manager_new() {
        let mgr = HeartbeatManager::new(secs(30), 0.5, Instant::now());
        assert_eq!(mgr.interval(), secs(30));
        assert!(mgr.pending_test_request().is_none());
    }

    #[test]
    fn test_should_send_heartbeat() {
        let start = Instant::now();
        let mut mgr = HeartbeatManager::new(secs(30), 0.5, start);
        assert_eq!(mgr.poll(start + secs(29)), HeartbeatAction::None);
        assert_eq!(mgr.poll(start + secs(30)), HeartbeatAction::SendHeartbeat);

        mgr.on_message_sent(start + secs(30));
        mgr.on_message_received(start + secs(30));
        assert_eq!(mgr.poll(start + secs(31)), HeartbeatAction::None);
    }

    #[test]
    fn test_test_request_after_delay() {
        let start = Instant::now();
        let mut mgr = HeartbeatManager::new(secs(30), 0.5, start);
        mgr.on_message_sent(start + secs(44));
        assert_eq!(mgr.poll(start + secs(44)), HeartbeatAction::None);
        assert_eq!(mgr.poll(start + secs(45)), HeartbeatAction::SendTestRequest);

        mgr.on_test_request_sent("T1".to_string(), start + secs(45));
        assert_eq!(mgr.pending_test_request(), Some("T1"));
        assert_eq!(mgr.poll(start + secs(60)), HeartbeatAction::None);
        assert_eq!(mgr.poll(start + secs(75)), HeartbeatAction::TimedOut);
    }

    #[test]
    fn test_inbound_traffic_clears_test_request() {
        let start = Instant::now();
        let mut mgr = HeartbeatManager::new(secs(10), 0.5, start);
        mgr.on_test_request_sent("T1".to_string(), start + secs(15));
        mgr.on_message_received(start + secs(16));
        assert!(mgr.pending_test_request().is_none());
        assert!(!mgr.is_timed_out(start + secs(30)));
    }

    #[test]
    fn test_set_interval() {
        let start = Instant::now();
        let mut mgr = HeartbeatManager::new(secs(30), 0.5, start);
        mgr.set_interval(secs(2), 0.0);
        assert!(mgr.should_send_test_request(start + secs(2)));
    }

    #[test]
    fn test_generate_test_req_id() {
        let id = generate_test_req_id();
        assert!(id.starts_with("TEST-"));
        assert!(id.len() > 5);
    }
}
