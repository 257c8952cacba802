/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session configuration.
//!
//! A [`SessionConfig`] is built in code with [`SessionConfigBuilder`] or read
//! from a key/value map with [`SessionConfig::from_settings`].

use ferrofix_core::error::SessionError;
use ferrofix_core::session_id::SessionId;
use ferrofix_core::types::CompId;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Which side opens the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    /// Waits for the counterparty's Logon.
    Acceptor,
    /// Connects and sends the first Logon.
    Initiator,
}

impl FromStr for ConnectionType {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "acceptor" => Ok(Self::Acceptor),
            "initiator" => Ok(Self::Initiator),
            other => Err(SessionError::Configuration(format!(
                "ConnectionType must be acceptor or initiator, got '{}'",
                other
            ))),
        }
    }
}

/// What to do with an inbound MsgSeqNum below the expected one when
/// PossDupFlag is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeqTooLowPolicy {
    /// Send Logout and drop the connection.
    #[default]
    Logout,
    /// Log a warning and drop the message.
    Ignore,
}

impl FromStr for SeqTooLowPolicy {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "logout" => Ok(Self::Logout),
            "ignore" => Ok(Self::Ignore),
            other => Err(SessionError::Configuration(format!(
                "SeqTooLowPolicy must be logout or ignore, got '{}'",
                other
            ))),
        }
    }
}

/// Configuration for a FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56).
    pub target_comp_id: CompId,
    /// FIX version BeginString (e.g., "FIX.4.4").
    pub begin_string: String,
    /// Optional qualifier distinguishing sessions with the same CompIDs.
    pub session_qualifier: Option<String>,
    /// Acceptor or initiator.
    pub connection_type: ConnectionType,
    /// Heartbeat interval (tag 108) proposed in our Logon.
    pub heartbeat_interval: Duration,
    /// Whether to reset sequence numbers on logon.
    pub reset_on_logon: bool,
    /// Whether to reset sequence numbers on logout.
    pub reset_on_logout: bool,
    /// Whether to reset sequence numbers on disconnect.
    pub reset_on_disconnect: bool,
    /// Maximum message size in bytes.
    pub max_message_size: usize,
    /// How long to wait for the Logon response.
    pub logon_timeout: Duration,
    /// How long to wait for the Logout response.
    pub logout_timeout: Duration,
    /// Whether to validate incoming message checksums.
    pub validate_checksum: bool,
    /// Whether to check SendingTime against the local clock.
    pub check_latency: bool,
    /// Largest tolerated SendingTime skew.
    pub max_latency: Duration,
    /// Send a ResendRequest for every gap even while one is outstanding.
    pub send_redundant_resend_requests: bool,
    /// Request `[begin, end]` instead of `[begin, infinity]`.
    pub closed_resend_interval: bool,
    /// Keep messages that arrive ahead of a gap for in-order delivery.
    pub queue_out_of_sequence: bool,
    /// Handling of MsgSeqNum too low without PossDupFlag.
    pub seq_too_low_policy: SeqTooLowPolicy,
    /// Extra fraction of the interval before a TestRequest is sent.
    pub test_request_delay_multiplier: f64,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
    /// Optional sender location ID (tag 142).
    pub sender_location_id: Option<String>,
    /// Optional target location ID (tag 143).
    pub target_location_id: Option<String>,
}

impl SessionConfig {
    /// Creates a new session configuration with required fields.
    ///
    /// # Arguments
    /// * `sender_comp_id` - The sender CompID
    /// * `target_comp_id` - The target CompID
    /// * `begin_string` - The FIX version string
    #[must_use]
    pub fn new(
        sender_comp_id: CompId,
        target_comp_id: CompId,
        begin_string: impl Into<String>,
    ) -> Self {
        Self {
            sender_comp_id,
            target_comp_id,
            begin_string: begin_string.into(),
            session_qualifier: None,
            connection_type: ConnectionType::Acceptor,
            heartbeat_interval: Duration::from_secs(30),
            reset_on_logon: false,
            reset_on_logout: false,
            reset_on_disconnect: false,
            max_message_size: 1024 * 1024,
            logon_timeout: Duration::from_secs(10),
            logout_timeout: Duration::from_secs(2),
            validate_checksum: true,
            check_latency: true,
            max_latency: Duration::from_secs(120),
            send_redundant_resend_requests: false,
            closed_resend_interval: true,
            queue_out_of_sequence: true,
            seq_too_low_policy: SeqTooLowPolicy::Logout,
            test_request_delay_multiplier: 0.5,
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            target_location_id: None,
        }
    }

    /// Returns the session identifier this configuration describes.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        let id = SessionId::new(
            self.begin_string.clone(),
            self.sender_comp_id.as_str(),
            self.target_comp_id.as_str(),
        );
        match &self.session_qualifier {
            Some(q) => id.with_qualifier(q.clone()),
            None => id,
        }
    }

    /// Reads a configuration from conventional session settings.
    ///
    /// `BeginString`, `SenderCompID` and `TargetCompID` are required. Every
    /// other key falls back to the [`SessionConfig::new`] default. Durations
    /// are whole seconds and flags accept `Y`/`N`.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` for a missing required key or a
    /// value that does not parse.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, SessionError> {
        let required = |key: &str| {
            settings
                .get(key)
                .ok_or_else(|| SessionError::Configuration(format!("missing setting {}", key)))
        };
        let comp_id = |key: &str| {
            required(key).and_then(|v| {
                CompId::new(v).ok_or_else(|| {
                    SessionError::Configuration(format!("{} '{}' is too long", key, v))
                })
            })
        };

        let mut config = Self::new(
            comp_id("SenderCompID")?,
            comp_id("TargetCompID")?,
            required("BeginString")?.clone(),
        );
        let s = Settings(settings);

        config.session_qualifier = s.string("SessionQualifier");
        if let Some(v) = s.parsed::<ConnectionType>("ConnectionType")? {
            config.connection_type = v;
        }
        if let Some(v) = s.seconds("HeartBtInt")? {
            config.heartbeat_interval = v;
        }
        if let Some(v) = s.flag("ResetOnLogon")? {
            config.reset_on_logon = v;
        }
        if let Some(v) = s.flag("ResetOnLogout")? {
            config.reset_on_logout = v;
        }
        if let Some(v) = s.flag("ResetOnDisconnect")? {
            config.reset_on_disconnect = v;
        }
        if let Some(v) = s.seconds("LogonTimeout")? {
            config.logon_timeout = v;
        }
        if let Some(v) = s.seconds("LogoutTimeout")? {
            config.logout_timeout = v;
        }
        if let Some(v) = s.flag("CheckLatency")? {
            config.check_latency = v;
        }
        if let Some(v) = s.seconds("MaxLatency")? {
            config.max_latency = v;
        }
        if let Some(v) = s.flag("ValidateChecksum")? {
            config.validate_checksum = v;
        }
        if let Some(v) = s.parsed::<usize>("MaxMessageSize")? {
            config.max_message_size = v;
        }
        if let Some(v) = s.flag("SendRedundantResendRequests")? {
            config.send_redundant_resend_requests = v;
        }
        if let Some(v) = s.flag("ClosedResendInterval")? {
            config.closed_resend_interval = v;
        }
        if let Some(v) = s.flag("QueueOutOfSequence")? {
            config.queue_out_of_sequence = v;
        }
        if let Some(v) = s.parsed::<SeqTooLowPolicy>("SeqTooLowPolicy")? {
            config.seq_too_low_policy = v;
        }
        if let Some(v) = s.parsed::<f64>("TestRequestDelayMultiplier")? {
            config.test_request_delay_multiplier = v;
        }
        config.sender_sub_id = s.string("SenderSubID");
        config.target_sub_id = s.string("TargetSubID");
        config.sender_location_id = s.string("SenderLocationID");
        config.target_location_id = s.string("TargetLocationID");
        Ok(config)
    }

    /// Returns the heartbeat interval in seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }
}

struct Settings<'a>(&'a HashMap<String, String>);

impl Settings<'_> {
    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, SessionError> {
        self.0
            .get(key)
            .map(|v| {
                v.trim().parse::<T>().map_err(|_| {
                    SessionError::Configuration(format!("invalid value '{}' for {}", v, key))
                })
            })
            .transpose()
    }

    fn seconds(&self, key: &str) -> Result<Option<Duration>, SessionError> {
        Ok(self.parsed::<u64>(key)?.map(Duration::from_secs))
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, SessionError> {
        self.0
            .get(key)
            .map(|v| match v.trim() {
                "Y" | "y" | "true" => Ok(true),
                "N" | "n" | "false" => Ok(false),
                _ => Err(SessionError::Configuration(format!(
                    "invalid flag '{}' for {}",
                    v, key
                ))),
            })
            .transpose()
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    sender_comp_id: Option<String>,
    target_comp_id: Option<String>,
    begin_string: Option<String>,
    session_qualifier: Option<String>,
    connection_type: Option<ConnectionType>,
    heartbeat_interval: Option<Duration>,
    reset_on_logon: bool,
    reset_on_logout: bool,
    reset_on_disconnect: bool,
    max_message_size: Option<usize>,
    logon_timeout: Option<Duration>,
    logout_timeout: Option<Duration>,
    validate_checksum: Option<bool>,
    check_latency: Option<bool>,
    max_latency: Option<Duration>,
    queue_out_of_sequence: Option<bool>,
    closed_resend_interval: Option<bool>,
    send_redundant_resend_requests: bool,
    seq_too_low_policy: SeqTooLowPolicy,
    sender_sub_id: Option<String>,
    target_sub_id: Option<String>,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: impl Into<String>) -> Self {
        self.sender_comp_id = Some(id.into());
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: impl Into<String>) -> Self {
        self.target_comp_id = Some(id.into());
        self
    }

    /// Sets the FIX version.
    #[must_use]
    pub fn begin_string(mut self, version: impl Into<String>) -> Self {
        self.begin_string = Some(version.into());
        self
    }

    /// Sets the session qualifier.
    #[must_use]
    pub fn session_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.session_qualifier = Some(qualifier.into());
        self
    }

    /// Sets the connection type.
    #[must_use]
    pub const fn connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = Some(connection_type);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Sets whether to reset on logon.
    #[must_use]
    pub const fn reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets whether to reset on logout.
    #[must_use]
    pub const fn reset_on_logout(mut self, reset: bool) -> Self {
        self.reset_on_logout = reset;
        self
    }

    /// Sets whether to reset on disconnect.
    #[must_use]
    pub const fn reset_on_disconnect(mut self, reset: bool) -> Self {
        self.reset_on_disconnect = reset;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub const fn logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = Some(timeout);
        self
    }

    /// Sets the logout timeout.
    #[must_use]
    pub const fn logout_timeout(mut self, timeout: Duration) -> Self {
        self.logout_timeout = Some(timeout);
        self
    }

    /// Sets whether inbound checksums are validated.
    #[must_use]
    pub const fn validate_checksum(mut self, validate: bool) -> Self {
        self.validate_checksum = Some(validate);
        self
    }

    /// Sets whether SendingTime is checked against the local clock.
    #[must_use]
    pub const fn check_latency(mut self, check: bool) -> Self {
        self.check_latency = Some(check);
        self
    }

    /// Sets the largest tolerated SendingTime skew.
    #[must_use]
    pub const fn max_latency(mut self, latency: Duration) -> Self {
        self.max_latency = Some(latency);
        self
    }

    /// Sets whether messages ahead of a gap are queued.
    #[must_use]
    pub const fn queue_out_of_sequence(mut self, queue: bool) -> Self {
        self.queue_out_of_sequence = Some(queue);
        self
    }

    /// Sets whether resend requests name an explicit end.
    #[must_use]
    pub const fn closed_resend_interval(mut self, closed: bool) -> Self {
        self.closed_resend_interval = Some(closed);
        self
    }

    /// Sets whether overlapping resend requests are sent.
    #[must_use]
    pub const fn send_redundant_resend_requests(mut self, send: bool) -> Self {
        self.send_redundant_resend_requests = send;
        self
    }

    /// Sets the MsgSeqNum-too-low policy.
    #[must_use]
    pub const fn seq_too_low_policy(mut self, policy: SeqTooLowPolicy) -> Self {
        self.seq_too_low_policy = policy;
        self
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if a CompID is missing or longer
    /// than 32 characters.
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        let comp_id = |value: Option<String>, name: &str| {
            let value =
                value.ok_or_else(|| SessionError::Configuration(format!("{} is required", name)))?;
            CompId::new(&value)
                .ok_or_else(|| SessionError::Configuration(format!("{} '{}' is too long", name, value)))
        };
        let sender = comp_id(self.sender_comp_id, "sender_comp_id")?;
        let target = comp_id(self.target_comp_id, "target_comp_id")?;
        let begin_string = self.begin_string.unwrap_or_else(|| "FIX.4.4".to_string());

        let mut config = SessionConfig::new(sender, target, begin_string);
        config.session_qualifier = self.session_qualifier;
        if let Some(v) = self.connection_type {
            config.connection_type = v;
        }
        if let Some(v) = self.heartbeat_interval {
            config.heartbeat_interval = v;
        }
        config.reset_on_logon = self.reset_on_logon;
        config.reset_on_logout = self.reset_on_logout;
        config.reset_on_disconnect = self.reset_on_disconnect;
        if let Some(v) = self.max_message_size {
            config.max_message_size = v;
        }
        if let Some(v) = self.logon_timeout {
            config.logon_timeout = v;
        }
        if let Some(v) = self.logout_timeout {
            config.logout_timeout = v;
        }
        if let Some(v) = self.validate_checksum {
            config.validate_checksum = v;
        }
        if let Some(v) = self.check_latency {
            config.check_latency = v;
        }
        if let Some(v) = self.max_latency {
            config.max_latency = v;
        }
        if let Some(v) = self.queue_out_of_sequence {
            config.queue_out_of_sequence = v;
        }
        if let Some(v) = self.closed_resend_interval {
            config.closed_resend_interval = v;
        }
        config.send_redundant_resend_requests = self.send_redundant_resend_requests;
        config.seq_too_low_policy = self.seq_too_low_policy;
        config.sender_sub_id = self.sender_sub_id;
        config.target_sub_id = self.target_sub_id;

        Ok(config)
    }
}
