/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! The FIX session engine.
//!
//! A [`Session`] owns the per-counterparty state: expected and next sequence
//! numbers (persisted in its [`MessageStore`]), the state machine, heartbeat
//! timing, the outstanding resend range and the out-of-sequence queue. The
//! read path, application senders and the driver's timer all go through one
//! async mutex; nothing inside it waits on a socket, because frames are
//! handed to the [`Responder`]'s non-blocking queue.

use crate::application::{Application, RejectReason};
use crate::config::{ConnectionType, SeqTooLowPolicy, SessionConfig};
use crate::heartbeat::{HeartbeatAction, HeartbeatManager, generate_test_req_id};
use crate::responder::Responder;
use crate::sequence::{MessageQueue, ResendRange, SequenceResult};
use crate::state::SessionState;
use bytes::Bytes;
use ferrofix_core::error::{DecodeError, FrameError, SessionError};
use ferrofix_core::field::Field;
use ferrofix_core::message::{Message, MsgType};
use ferrofix_core::session_id::SessionId;
use ferrofix_core::tags;
use ferrofix_core::types::{BusinessRejectReason, SeqNum, SessionRejectReason, Timestamp};
use ferrofix_dictionary::{ValidationError, Validator, Version};
use ferrofix_store::MessageStore;
use ferrofix_tagvalue::{Encoder, parse_message, peek_field};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// EndSeqNo meaning "infinity" before FIX.4.2.
const LEGACY_INFINITY: u64 = 999_999;

/// DefaultApplVerID sent on FIXT.1.1 logons (FIX.5.0SP2).
const DEFAULT_APPL_VER: &str = "9";

/// One FIX session.
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    version: Option<Version>,
    store: Arc<dyn MessageStore>,
    application: Arc<dyn Application>,
    validator: Option<Validator>,
    inner: Mutex<Inner>,
}

struct Inner {
    state: SessionState,
    state_since: Instant,
    responder: Option<Arc<dyn Responder>>,
    heartbeat: HeartbeatManager,
    resend: Option<ResendRange>,
    queue: MessageQueue,
    /// Highest inbound number discarded while out of sequence, 0 if none.
    dropped_through: u64,
    logout_sent: bool,
    reset_sent: bool,
    encoder: Encoder,
}

/// Callbacks collected under the lock and run after it is released.
#[derive(Default)]
struct Notifications {
    logged_on: bool,
    logged_out: bool,
    deliver: Vec<Message>,
}

impl Session {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn MessageStore>,
        application: Arc<dyn Application>,
    ) -> Self {
        let now = Instant::now();
        let heartbeat = HeartbeatManager::new(
            config.heartbeat_interval,
            config.test_request_delay_multiplier,
            now,
        );
        Self {
            id: config.session_id(),
            version: Version::from_begin_string(&config.begin_string),
            config,
            store,
            application,
            validator: None,
            inner: Mutex::new(Inner {
                state: SessionState::Disconnected,
                state_since: now,
                responder: None,
                heartbeat,
                resend: None,
                queue: MessageQueue::new(),
                dropped_through: 0,
                logout_sent: false,
                reset_sent: false,
                encoder: Encoder::new(),
            }),
        }
    }

    /// Validates inbound messages against a dictionary.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the message store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Returns the current state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Returns true once the logon handshake has completed.
    pub async fn is_logged_on(&self) -> bool {
        self.state().await.is_logged_on()
    }

    /// Returns true while a connection is attached.
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.responder.is_some()
    }

    /// Returns the outstanding resend range, if any.
    pub async fn outstanding_resend(&self) -> Option<ResendRange> {
        self.inner.lock().await.resend
    }

    /// Number of messages waiting for a gap to be filled.
    pub async fn queued_len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    /// Next outbound sequence number.
    #[must_use]
    pub fn next_sender_seq(&self) -> u64 {
        self.store.next_sender_seq()
    }

    /// Next expected inbound sequence number.
    #[must_use]
    pub fn next_target_seq(&self) -> u64 {
        self.store.next_target_seq()
    }

    /// Attaches a connection.
    ///
    /// # Errors
    /// Returns `SessionError::AlreadyConnected` if a connection is attached.
    pub async fn on_connect(&self, responder: Arc<dyn Responder>) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.responder.is_some() {
            return Err(SessionError::AlreadyConnected);
        }
        info!(
            session = %self.id,
            connection = responder.connection_id(),
            remote = ?responder.remote_address(),
            "connection attached"
        );
        let now = Instant::now();
        inner.responder = Some(responder);
        inner.state = SessionState::Disconnected;
        inner.state_since = now;
        inner.heartbeat.set_interval(
            self.config.heartbeat_interval,
            self.config.test_request_delay_multiplier,
        );
        inner.heartbeat.reset(now);
        Ok(())
    }

    /// Detaches the connection with the given id.
    ///
    /// A stale driver cannot detach a newer connection: the call is a no-op
    /// unless `connection_id` matches. Returns true if a connection was
    /// detached.
    ///
    /// # Errors
    /// Returns `SessionError::Store` if a configured reset fails.
    pub async fn on_disconnect(&self, connection_id: u64) -> Result<bool, SessionError> {
        let mut notes = Notifications::default();
        let detached = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            let current = inner
                .responder
                .as_ref()
                .is_some_and(|r| r.connection_id() == connection_id);
            if current {
                self.detach(inner, &mut notes, false).await?;
            }
            current
        };
        self.notify(notes).await?;
        Ok(detached)
    }

    /// Sends the initiator's Logon.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is connected
    /// and disconnected at the protocol level, or a send error.
    pub async fn logon(&self) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.responder.is_none() {
            return Err(SessionError::Transport("no connection attached".to_string()));
        }
        if inner.state != SessionState::Disconnected {
            return Err(SessionError::InvalidState {
                expected: SessionState::Disconnected.to_string(),
                current: inner.state.to_string(),
            });
        }
        if self.config.reset_on_logon {
            self.store.reset().await?;
            inner.reset_sent = true;
        }
        let logon = self.logon_message(self.config.heartbeat_interval, inner.reset_sent);
        self.send_admin(inner, logon).await?;
        self.transition(inner, SessionState::LogonPending)?;
        info!(session = %self.id, "Logon sent");
        Ok(())
    }

    /// Starts a logout.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` if not logged on, or a send error.
    pub async fn logout(&self, text: Option<&str>) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if !inner.state.is_logged_on() {
            return Err(SessionError::InvalidState {
                expected: SessionState::Active.to_string(),
                current: inner.state.to_string(),
            });
        }
        self.send_logout(inner, text).await?;
        self.transition(inner, SessionState::LogoutPending)?;
        info!(session = %self.id, "Logout sent");
        Ok(())
    }

    /// Sends a message, returning the sequence number it was given.
    ///
    /// The header is stamped, the message persisted and then queued on the
    /// connection. While not logged on the message is persisted only and
    /// delivered later by resend.
    ///
    /// # Errors
    /// - `SessionError::DoNotSend` if the application vetoed it (nothing persisted)
    /// - `SessionError::NotLoggedOn` if it was stored but not sent
    /// - `SessionError::Transport` if the connection failed (message stays stored)
    pub async fn send(&self, message: Message) -> Result<SeqNum, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let deliver = inner.state.is_logged_on();
        let seq = self.send_locked(inner, message, deliver).await?;
        if !deliver {
            debug!(session = %self.id, seq = seq.value(), "stored message for later resend");
            return Err(SessionError::NotLoggedOn {
                seq_num: seq.value(),
            });
        }
        Ok(seq)
    }

    /// Processes one framed inbound message.
    ///
    /// # Errors
    /// Returns `SessionError::Transport` if no connection is attached, a
    /// fatal `SessionError` when the connection has been dropped, or a
    /// send/store error.
    pub async fn next(&self, frame: Bytes) -> Result<(), SessionError> {
        let mut notes = Notifications::default();
        let result = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            if inner.responder.is_none() {
                debug!(session = %self.id, "frame received with no connection attached");
                return Err(SessionError::Transport("no connection attached".to_string()));
            }
            inner.heartbeat.on_message_received(Instant::now());
            match parse_message(frame.clone()) {
                Ok(msg) => self.process(inner, msg, &mut notes).await,
                Err(err) => self.on_decode_error(inner, &frame, err, &mut notes).await,
            }
        };
        self.notify(notes).await?;
        result
    }

    /// Processes a frame the framer rejected.
    ///
    /// # Errors
    /// Returns `SessionError::ProtocolViolation` when the error is fatal for
    /// the connection.
    pub async fn next_malformed(&self, error: &FrameError) -> Result<(), SessionError> {
        let mut notes = Notifications::default();
        let result = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            inner.heartbeat.on_message_received(Instant::now());
            self.on_frame_error(inner, error, &mut notes).await
        };
        self.notify(notes).await?;
        result
    }

    /// Runs timers: heartbeat, TestRequest, and logon/logout timeouts.
    ///
    /// # Errors
    /// Returns `SessionError::HeartbeatTimeout` or `SessionError::LogonRejected`
    /// when the connection has been dropped.
    pub async fn tick(&self, now: Instant) -> Result<(), SessionError> {
        let mut notes = Notifications::default();
        let result = {
            let mut guard = self.inner.lock().await;
            self.on_tick(&mut guard, now, &mut notes).await
        };
        self.notify(notes).await?;
        result
    }

    async fn notify(&self, notes: Notifications) -> Result<(), SessionError> {
        if notes.logged_on {
            self.application.on_logon(&self.id).await;
        }
        for msg in notes.deliver {
            if let Err(reason) = self.application.from_app(&msg, &self.id).await {
                let mut guard = self.inner.lock().await;
                let inner = &mut *guard;
                if inner.responder.is_some() {
                    let seq = msg.seq_num().unwrap_or(0);
                    self.reject_with(inner, &msg, seq, reason).await?;
                }
            }
        }
        if notes.logged_out {
            info!(session = %self.id, "logged out");
            self.application.on_logout(&self.id).await;
        }
        Ok(())
    }

    fn transition(&self, inner: &mut Inner, next: SessionState) -> Result<(), SessionError> {
        if inner.state == next {
            return Ok(());
        }
        if !inner.state.can_transition_to(next) {
            return Err(SessionError::InvalidState {
                expected: format!("a state leading to {}", next),
                current: inner.state.to_string(),
            });
        }
        debug!(session = %self.id, from = %inner.state, to = %next, "state change");
        inner.state = next;
        inner.state_since = Instant::now();
        Ok(())
    }

    async fn detach(
        &self,
        inner: &mut Inner,
        notes: &mut Notifications,
        after_logout: bool,
    ) -> Result<(), SessionError> {
        let was_logged_on =
            inner.state.is_logged_on() || inner.state == SessionState::LogoutPending;
        if let Some(responder) = inner.responder.take() {
            info!(
                session = %self.id,
                connection = responder.connection_id(),
                "disconnecting"
            );
            responder.disconnect();
        }
        self.transition(inner, SessionState::Disconnected)?;
        inner.resend = None;
        inner.queue.clear();
        inner.dropped_through = 0;
        inner.logout_sent = false;
        inner.reset_sent = false;
        notes.logged_out |= was_logged_on;

        if (after_logout && self.config.reset_on_logout) || self.config.reset_on_disconnect {
            self.store.reset().await?;
        }
        Ok(())
    }

    async fn logout_and_disconnect(
        &self,
        inner: &mut Inner,
        notes: &mut Notifications,
        text: &str,
    ) -> Result<(), SessionError> {
        if inner.responder.is_some()
            && let Err(err) = self.send_logout(inner, Some(text)).await
        {
            warn!(session = %self.id, error = %err, "failed to send Logout");
        }
        self.detach(inner, notes, true).await
    }

    // ----- outbound -----

    fn is_fix42_or_later(&self) -> bool {
        self.version.is_none_or(|v| v >= Version::Fix42)
    }

    fn admin(&self, msg_type: MsgType) -> Message {
        Message::new(&self.config.begin_string, msg_type)
    }

    fn stamp(&self, msg: &mut Message, seq: u64, now: Timestamp) {
        let config = &self.config;
        let header = &mut msg.header;
        header.set_str(tags::BEGIN_STRING, &config.begin_string);
        header.set_str(tags::SENDER_COMP_ID, config.sender_comp_id.as_str());
        header.set_str(tags::TARGET_COMP_ID, config.target_comp_id.as_str());
        if let Some(v) = &config.sender_sub_id {
            header.set_str(tags::SENDER_SUB_ID, v);
        }
        if let Some(v) = &config.target_sub_id {
            header.set_str(tags::TARGET_SUB_ID, v);
        }
        if let Some(v) = &config.sender_location_id {
            header.set_str(tags::SENDER_LOCATION_ID, v);
        }
        if let Some(v) = &config.target_location_id {
            header.set_str(tags::TARGET_LOCATION_ID, v);
        }
        header.set_u64(tags::MSG_SEQ_NUM, seq);
        header.set_timestamp(tags::SENDING_TIME, now);
        msg.clear_raw();
    }

    fn logon_message(&self, heartbeat: Duration, reset: bool) -> Message {
        let mut msg = self.admin(MsgType::Logon);
        msg.body.set_u64(tags::ENCRYPT_METHOD, 0);
        msg.body.set_u64(tags::HEART_BT_INT, heartbeat.as_secs());
        if reset {
            msg.body.set_bool(tags::RESET_SEQ_NUM_FLAG, true);
        }
        if self.version.is_some_and(|v| v.uses_fixt()) {
            msg.body.set_str(tags::DEFAULT_APPL_VER_ID, DEFAULT_APPL_VER);
        }
        msg
    }

    /// Stamp, veto check, encode, persist, bump, then optionally queue.
    async fn send_locked(
        &self,
        inner: &mut Inner,
        mut msg: Message,
        transmit: bool,
    ) -> Result<SeqNum, SessionError> {
        let seq = self.store.next_sender_seq();
        self.stamp(&mut msg, seq, Timestamp::now());

        let verdict = if msg.is_admin() {
            self.application.to_admin(&mut msg, &self.id).await
        } else {
            self.application.to_app(&mut msg, &self.id).await
        };
        if verdict.is_err() {
            debug!(session = %self.id, seq, "outgoing message vetoed");
            return Err(SessionError::DoNotSend);
        }

        let frame = inner.encoder.encode(&msg)?;
        self.store
            .append(seq, frame.clone())
            .await
            .inspect_err(|err| error!(session = %self.id, seq, error = %err, "store append failed"))?;
        self.store.set_next_sender_seq(seq + 1);

        if transmit {
            debug!(session = %self.id, seq, msg_type = ?msg.msg_type(), "sending");
            self.transmit(inner, frame)?;
        }
        Ok(SeqNum::new(seq))
    }

    async fn send_admin(&self, inner: &mut Inner, msg: Message) -> Result<SeqNum, SessionError> {
        self.send_locked(inner, msg, true).await
    }

    fn transmit(&self, inner: &mut Inner, frame: Bytes) -> Result<(), SessionError> {
        let Some(responder) = &inner.responder else {
            return Err(SessionError::Transport("no connection attached".to_string()));
        };
        responder
            .send(frame)
            .inspect_err(|err| error!(session = %self.id, error = %err, "transport write failed"))?;
        inner.heartbeat.on_message_sent(Instant::now());
        Ok(())
    }

    async fn send_logout(&self, inner: &mut Inner, text: Option<&str>) -> Result<(), SessionError> {
        let mut msg = self.admin(MsgType::Logout);
        if let Some(text) = text {
            msg.body.set_str(tags::TEXT, text);
        }
        self.send_admin(inner, msg).await?;
        inner.logout_sent = true;
        Ok(())
    }

    async fn send_reject(
        &self,
        inner: &mut Inner,
        ref_seq: u64,
        ref_msg_type: Option<&str>,
        reason: SessionRejectReason,
        ref_tag: Option<u32>,
        text: Option<&str>,
    ) -> Result<(), SessionError> {
        warn!(
            session = %self.id,
            ref_seq,
            ref_tag = ?ref_tag,
            reason = %reason,
            "rejecting message"
        );
        let mut msg = self.admin(MsgType::Reject);
        msg.body.set_u64(tags::REF_SEQ_NUM, ref_seq);
        if self.is_fix42_or_later() {
            if let Some(tag) = ref_tag {
                msg.body.set_u64(tags::REF_TAG_ID, u64::from(tag));
            }
            if let Some(msg_type) = ref_msg_type {
                msg.body.set_str(tags::REF_MSG_TYPE, msg_type);
            }
            msg.body
                .set_u64(tags::SESSION_REJECT_REASON, u64::from(reason.code()));
        }
        let default_text = reason.to_string();
        msg.body.set_str(tags::TEXT, text.unwrap_or(&default_text));
        self.send_admin(inner, msg).await.map(|_| ())
    }

    async fn send_business_reject(
        &self,
        inner: &mut Inner,
        ref_seq: u64,
        ref_msg_type: &str,
        reason: BusinessRejectReason,
        ref_id: Option<&str>,
        text: Option<&str>,
    ) -> Result<(), SessionError> {
        if !self.is_fix42_or_later() {
            return self
                .send_reject(inner, ref_seq, Some(ref_msg_type), SessionRejectReason::Other, None, text)
                .await;
        }
        warn!(session = %self.id, ref_seq, reason = %reason, "business reject");
        let mut msg = self.admin(MsgType::BusinessMessageReject);
        msg.body.set_u64(tags::REF_SEQ_NUM, ref_seq);
        msg.body.set_str(tags::REF_MSG_TYPE, ref_msg_type);
        if let Some(id) = ref_id {
            msg.body.set_str(tags::BUSINESS_REJECT_REF_ID, id);
        }
        msg.body
            .set_u64(tags::BUSINESS_REJECT_REASON, u64::from(reason.code()));
        let default_text = reason.to_string();
        msg.body.set_str(tags::TEXT, text.unwrap_or(&default_text));
        self.send_admin(inner, msg).await.map(|_| ())
    }

    async fn reject_with(
        &self,
        inner: &mut Inner,
        msg: &Message,
        seq: u64,
        reason: RejectReason,
    ) -> Result<(), SessionError> {
        let msg_type = msg.msg_type();
        let msg_type = msg_type.as_ref().map(MsgType::as_str);
        match reason {
            RejectReason::Session {
                reason,
                ref_tag,
                text,
            } => {
                self.send_reject(inner, seq, msg_type, reason, ref_tag, text.as_deref())
                    .await
            }
            RejectReason::Business {
                reason,
                ref_id,
                text,
            } => {
                self.send_business_reject(
                    inner,
                    seq,
                    msg_type.unwrap_or_default(),
                    reason,
                    ref_id.as_deref(),
                    text.as_deref(),
                )
                .await
            }
        }
    }

    async fn reject_invalid(
        &self,
        inner: &mut Inner,
        msg: &Message,
        seq: u64,
        err: ValidationError,
    ) -> Result<(), SessionError> {
        let msg_type = msg.msg_type();
        let text = err.to_string();
        if let (ValidationError::UnsupportedMsgType { msg_type: raw }, false) = (&err, msg.is_admin())
            && self.is_fix42_or_later()
        {
            return self
                .send_business_reject(
                    inner,
                    seq,
                    raw,
                    BusinessRejectReason::UnsupportedMessageType,
                    None,
                    Some(&text),
                )
                .await;
        }
        self.send_reject(
            inner,
            seq,
            msg_type.as_ref().map(MsgType::as_str),
            err.reject_reason(),
            err.ref_tag(),
            Some(&text),
        )
        .await
    }

    fn send_gap_fill(&self, inner: &mut Inner, start: u64, new_seq: u64) -> Result<(), SessionError> {
        debug!(session = %self.id, start, new_seq, "sending gap fill");
        let now = Timestamp::now();
        let mut msg = self.admin(MsgType::SequenceReset);
        self.stamp(&mut msg, start, now);
        msg.header.set_bool(tags::POSS_DUP_FLAG, true);
        msg.header.set_timestamp(tags::ORIG_SENDING_TIME, now);
        msg.body.set_bool(tags::GAP_FILL_FLAG, true);
        msg.body.set_u64(tags::NEW_SEQ_NO, new_seq);
        let frame = inner.encoder.encode(&msg)?;
        self.transmit(inner, frame)
    }

    async fn prepare_resend(&self, mut msg: Message) -> Option<Message> {
        let orig = msg.header.get(tags::SENDING_TIME).map(|f| f.value.clone());
        msg.clear_raw();
        msg.header.set_bool(tags::POSS_DUP_FLAG, true);
        if let Some(orig) = orig {
            msg.header.set(Field::new(tags::ORIG_SENDING_TIME, orig));
        }
        msg.header.set_timestamp(tags::SENDING_TIME, Timestamp::now());
        self.application
            .to_app(&mut msg, &self.id)
            .await
            .ok()
            .map(|()| msg)
    }

    /// Answers a ResendRequest from the store.
    ///
    /// Application messages go out again with PossDupFlag; admin messages
    /// and numbers never stored collapse into gap fills. Nothing here
    /// consumes an outbound sequence number.
    async fn serve_resend(&self, inner: &mut Inner, begin: u64, end: u64) -> Result<(), SessionError> {
        let last_sent = self.store.next_sender_seq().saturating_sub(1);
        let end = if end == 0 || end > last_sent { last_sent } else { end };
        if begin == 0 || begin > end {
            warn!(session = %self.id, begin, end, "nothing to resend");
            return Ok(());
        }
        info!(session = %self.id, begin, end, "serving ResendRequest");

        let stored = self.store.fetch_range(begin, end).await?;
        let mut gap_start: Option<u64> = None;
        let mut next = begin;
        for (seq, frame) in stored {
            if seq > next {
                gap_start.get_or_insert(next);
            }
            next = seq + 1;

            let resend = match parse_message(frame) {
                Ok(msg) if !msg.is_admin() => self.prepare_resend(msg).await,
                Ok(_) => None,
                Err(err) => {
                    warn!(session = %self.id, seq, error = %err, "stored message unreadable");
                    None
                }
            };
            match resend {
                Some(msg) => {
                    if let Some(start) = gap_start.take() {
                        self.send_gap_fill(inner, start, seq)?;
                    }
                    let frame = inner.encoder.encode(&msg)?;
                    self.transmit(inner, frame)?;
                }
                None => {
                    gap_start.get_or_insert(seq);
                }
            }
        }
        if next <= end {
            gap_start.get_or_insert(next);
        }
        if let Some(start) = gap_start {
            self.send_gap_fill(inner, start, end + 1)?;
        }
        Ok(())
    }

    async fn request_resend(&self, inner: &mut Inner, begin: u64, end: u64) -> Result<(), SessionError> {
        if inner.resend.is_some() && !self.config.send_redundant_resend_requests {
            debug!(session = %self.id, begin, end, "resend already outstanding");
            return Ok(());
        }
        let wire_end = if self.config.closed_resend_interval {
            end
        } else if self.is_fix42_or_later() {
            0
        } else {
            LEGACY_INFINITY
        };
        info!(session = %self.id, begin, end = wire_end, "sending ResendRequest");
        let mut msg = self.admin(MsgType::ResendRequest);
        msg.body.set_u64(tags::BEGIN_SEQ_NO, begin);
        msg.body.set_u64(tags::END_SEQ_NO, wire_end);
        self.send_admin(inner, msg).await?;

        inner.resend = Some(ResendRange::new(begin, end));
        if inner.state == SessionState::Active {
            self.transition(inner, SessionState::ResendInProgress)?;
        }
        Ok(())
    }

    // ----- inbound -----

    async fn on_tick(
        &self,
        inner: &mut Inner,
        now: Instant,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        let in_state = now.saturating_duration_since(inner.state_since);
        match inner.state {
            SessionState::Disconnected => Ok(()),
            SessionState::LogonPending => {
                if in_state < self.config.logon_timeout {
                    return Ok(());
                }
                warn!(session = %self.id, "no Logon response, disconnecting");
                self.detach(inner, notes, false).await?;
                Err(SessionError::LogonRejected {
                    reason: "Logon timed out".to_string(),
                })
            }
            SessionState::LogoutPending => {
                if in_state >= self.config.logout_timeout {
                    warn!(session = %self.id, "no Logout response, disconnecting");
                    self.detach(inner, notes, true).await?;
                }
                Ok(())
            }
            SessionState::Active | SessionState::ResendInProgress => {
                if inner.heartbeat.interval().is_zero() {
                    return Ok(());
                }
                match inner.heartbeat.poll(now) {
                    HeartbeatAction::None => Ok(()),
                    HeartbeatAction::SendHeartbeat => {
                        let msg = self.admin(MsgType::Heartbeat);
                        self.send_admin(inner, msg).await.map(|_| ())
                    }
                    HeartbeatAction::SendTestRequest => {
                        let id = generate_test_req_id();
                        debug!(session = %self.id, test_req_id = %id, "sending TestRequest");
                        let mut msg = self.admin(MsgType::TestRequest);
                        msg.body.set_str(tags::TEST_REQ_ID, &id);
                        self.send_admin(inner, msg).await?;
                        inner.heartbeat.on_test_request_sent(id, now);
                        Ok(())
                    }
                    HeartbeatAction::TimedOut => {
                        let elapsed = inner.heartbeat.time_since_last_received(now);
                        warn!(session = %self.id, elapsed_ms = elapsed.as_millis() as u64, "heartbeat timeout");
                        self.logout_and_disconnect(inner, notes, "Heartbeat timeout")
                            .await?;
                        Err(SessionError::HeartbeatTimeout {
                            elapsed_ms: elapsed.as_millis() as u64,
                        })
                    }
                }
            }
        }
    }

    async fn on_frame_error(
        &self,
        inner: &mut Inner,
        error: &FrameError,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        if error.is_fatal() || !inner.state.is_logged_on() {
            warn!(session = %self.id, error = %error, "malformed frame, disconnecting");
            self.detach(inner, notes, false).await?;
            return Err(SessionError::ProtocolViolation(error.to_string()));
        }
        let ref_tag = match error {
            FrameError::BodyLengthMismatch { .. } => tags::BODY_LENGTH,
            _ => tags::CHECKSUM,
        };
        let ref_seq = error
            .frame()
            .and_then(|f| peek_field(f, tags::MSG_SEQ_NUM))
            .and_then(parse_seq);
        self.send_reject(
            inner,
            ref_seq.unwrap_or(0),
            error.msg_type().map(MsgType::as_str),
            SessionRejectReason::ValueIsIncorrect,
            Some(ref_tag),
            Some(&error.to_string()),
        )
        .await?;
        match ref_seq {
            Some(seq) => self.consume_if_expected(inner, seq, notes).await,
            None => Ok(()),
        }
    }

    async fn on_decode_error(
        &self,
        inner: &mut Inner,
        frame: &Bytes,
        err: DecodeError,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        let msg_type = peek_field(frame, tags::MSG_TYPE).map(MsgType::from_bytes);
        if !inner.state.is_logged_on() || msg_type == Some(MsgType::Logon) {
            warn!(session = %self.id, error = %err, "undecodable message before logon");
            self.detach(inner, notes, false).await?;
            return Err(SessionError::ProtocolViolation(err.to_string()));
        }
        let ref_seq = peek_field(frame, tags::MSG_SEQ_NUM).and_then(parse_seq);
        let (reason, ref_tag) = decode_reject_reason(&err);
        self.send_reject(
            inner,
            ref_seq.unwrap_or(0),
            msg_type.as_ref().map(MsgType::as_str),
            reason,
            ref_tag,
            Some(&err.to_string()),
        )
        .await?;
        match ref_seq {
            Some(seq) => self.consume_if_expected(inner, seq, notes).await,
            None => Ok(()),
        }
    }

    async fn consume_if_expected(
        &self,
        inner: &mut Inner,
        seq: u64,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        if seq == self.store.next_target_seq() {
            self.store.set_next_target_seq(seq + 1);
            self.drain_queue(inner, notes).await?;
        }
        Ok(())
    }

    async fn process(
        &self,
        inner: &mut Inner,
        msg: Message,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        let Some(msg_type) = msg.msg_type() else {
            self.detach(inner, notes, false).await?;
            return Err(SessionError::ProtocolViolation("MsgType missing".to_string()));
        };
        debug!(session = %self.id, msg_type = %msg_type, seq = ?msg.seq_num(), "received");

        if !inner.state.is_logged_on()
            && inner.state != SessionState::LogoutPending
            && msg_type != MsgType::Logon
        {
            warn!(session = %self.id, msg_type = %msg_type, "first message is not a Logon");
            self.detach(inner, notes, false).await?;
            return Err(SessionError::ProtocolViolation(format!(
                "expected Logon, received MsgType {}",
                msg_type
            )));
        }

        if !self.check_header(inner, &msg, &msg_type, notes).await? {
            return Ok(());
        }

        if msg_type == MsgType::Logon && !inner.state.is_logged_on() {
            return self.on_logon(inner, msg, notes).await;
        }

        if msg_type == MsgType::SequenceReset && !is_gap_fill(&msg) {
            return self.on_sequence_reset(inner, &msg, notes).await;
        }

        let Some(seq) = msg.seq_num() else {
            return self
                .send_reject(
                    inner,
                    0,
                    Some(msg_type.as_str()),
                    SessionRejectReason::RequiredTagMissing,
                    Some(tags::MSG_SEQ_NUM),
                    None,
                )
                .await;
        };

        match SequenceResult::check(self.store.next_target_seq(), seq) {
            SequenceResult::Ok => {
                self.process_in_sequence(inner, msg, seq, notes).await?;
                self.drain_queue(inner, notes).await
            }
            SequenceResult::Gap { expected, received } => {
                self.on_seq_too_high(inner, msg, &msg_type, expected, received, notes)
                    .await
            }
            SequenceResult::TooLow { expected, received } => {
                self.on_seq_too_low(inner, &msg, &msg_type, expected, received, notes)
                    .await
            }
        }
    }

    /// BeginString, CompIDs and SendingTime. Returns false if the message was
    /// rejected but the session carries on.
    async fn check_header(
        &self,
        inner: &mut Inner,
        msg: &Message,
        msg_type: &MsgType,
        notes: &mut Notifications,
    ) -> Result<bool, SessionError> {
        if msg.begin_string() != Some(self.config.begin_string.as_str()) {
            warn!(session = %self.id, begin_string = ?msg.begin_string(), "incorrect BeginString");
            self.logout_and_disconnect(inner, notes, "Incorrect BeginString")
                .await?;
            return Err(SessionError::ProtocolViolation(format!(
                "unexpected BeginString {:?}",
                msg.begin_string()
            )));
        }

        let seq = msg.seq_num().unwrap_or(0);
        let sender_ok =
            msg.header.get_str(tags::SENDER_COMP_ID) == Some(self.config.target_comp_id.as_str());
        let target_ok =
            msg.header.get_str(tags::TARGET_COMP_ID) == Some(self.config.sender_comp_id.as_str());
        if !(sender_ok && target_ok) {
            let tag = if sender_ok {
                tags::TARGET_COMP_ID
            } else {
                tags::SENDER_COMP_ID
            };
            self.send_reject(
                inner,
                seq,
                Some(msg_type.as_str()),
                SessionRejectReason::CompIdProblem,
                Some(tag),
                None,
            )
            .await?;
            self.logout_and_disconnect(inner, notes, "CompID problem").await?;
            return Err(SessionError::ProtocolViolation("CompID problem".to_string()));
        }

        if !self.config.check_latency {
            return Ok(true);
        }
        let Some(sent) = msg.sending_time() else {
            if !inner.state.is_logged_on() {
                self.detach(inner, notes, false).await?;
                return Err(SessionError::ProtocolViolation(
                    "SendingTime missing".to_string(),
                ));
            }
            self.send_reject(
                inner,
                seq,
                Some(msg_type.as_str()),
                SessionRejectReason::RequiredTagMissing,
                Some(tags::SENDING_TIME),
                None,
            )
            .await?;
            self.consume_if_expected(inner, seq, notes).await?;
            return Ok(false);
        };
        let skew = sent.abs_diff(Timestamp::now());
        if skew > self.config.max_latency {
            warn!(session = %self.id, skew_ms = skew.as_millis() as u64, "SendingTime accuracy problem");
            self.send_reject(
                inner,
                seq,
                Some(msg_type.as_str()),
                SessionRejectReason::SendingTimeAccuracyProblem,
                Some(tags::SENDING_TIME),
                None,
            )
            .await?;
            self.logout_and_disconnect(inner, notes, "SendingTime accuracy problem")
                .await?;
            return Err(SessionError::ProtocolViolation(
                "SendingTime accuracy problem".to_string(),
            ));
        }
        Ok(true)
    }

    async fn on_logon(
        &self,
        inner: &mut Inner,
        msg: Message,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        let (Some(seq), Some(heart_bt_int)) = (msg.seq_num(), msg.body.get_u64(tags::HEART_BT_INT))
        else {
            warn!(session = %self.id, "Logon without MsgSeqNum or HeartBtInt");
            self.logout_and_disconnect(inner, notes, "Logon missing HeartBtInt")
                .await?;
            return Err(SessionError::ProtocolViolation(
                "Logon missing MsgSeqNum or HeartBtInt".to_string(),
            ));
        };
        let reset_requested = msg.body.get_bool(tags::RESET_SEQ_NUM_FLAG).unwrap_or(false);

        match (inner.state, self.config.connection_type) {
            (SessionState::Disconnected, ConnectionType::Acceptor) => {
                self.transition(inner, SessionState::LogonPending)?;
                if reset_requested || self.config.reset_on_logon {
                    info!(session = %self.id, "resetting sequence numbers on Logon");
                    self.store.reset().await?;
                    inner.reset_sent = true;
                }
            }
            (SessionState::LogonPending, ConnectionType::Initiator) => {
                if reset_requested && !inner.reset_sent {
                    info!(session = %self.id, "counterparty reset sequence numbers");
                    self.store.set_next_target_seq(1);
                }
            }
            (state, _) => {
                warn!(session = %self.id, state = %state, "unexpected Logon");
                self.detach(inner, notes, false).await?;
                return Err(SessionError::ProtocolViolation(format!(
                    "Logon received in state {}",
                    state
                )));
            }
        }

        if let Some(err) = self.validator.as_ref().and_then(|v| v.validate(&msg).err()) {
            let text = err.to_string();
            warn!(session = %self.id, error = %text, "invalid Logon");
            self.logout_and_disconnect(inner, notes, &text).await?;
            return Err(SessionError::LogonRejected { reason: text });
        }
        if let Err(reason) = self.application.from_admin(&msg, &self.id).await {
            let text = reason.text().unwrap_or("Logon rejected").to_string();
            warn!(session = %self.id, reason = %text, "Logon rejected by application");
            self.logout_and_disconnect(inner, notes, &text).await?;
            return Err(SessionError::LogonRejected { reason: text });
        }

        let expected = self.store.next_target_seq();
        if seq < expected {
            let text = format!(
                "MsgSeqNum too low, expecting {} but received {}",
                expected, seq
            );
            warn!(session = %self.id, expected, received = seq, "Logon sequence too low");
            self.logout_and_disconnect(inner, notes, &text).await?;
            return Err(SessionError::SequenceTooLow {
                expected,
                received: seq,
            });
        }

        if self.config.connection_type == ConnectionType::Acceptor {
            inner.heartbeat.set_interval(
                Duration::from_secs(heart_bt_int),
                self.config.test_request_delay_multiplier,
            );
            let reply = self.logon_message(Duration::from_secs(heart_bt_int), inner.reset_sent);
            self.send_admin(inner, reply).await?;
        }
        self.transition(inner, SessionState::Active)?;
        notes.logged_on = true;
        info!(session = %self.id, heart_bt_int, "logged on");

        if seq > expected {
            inner.queue.push_marker(seq, msg);
            self.request_resend(inner, expected, seq - 1).await
        } else {
            self.store.set_next_target_seq(seq + 1);
            Ok(())
        }
    }

    async fn on_seq_too_high(
        &self,
        inner: &mut Inner,
        msg: Message,
        msg_type: &MsgType,
        expected: u64,
        received: u64,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        warn!(session = %self.id, expected, received, "MsgSeqNum too high");
        let end = match msg_type {
            MsgType::Logon => {
                self.logout_and_disconnect(inner, notes, "Logon received while already logged on")
                    .await?;
                return Err(SessionError::ProtocolViolation(
                    "Logon received while logged on".to_string(),
                ));
            }
            MsgType::ResendRequest => {
                self.on_resend_request(inner, &msg, received).await?;
                inner.queue.push_marker(received, msg);
                received - 1
            }
            _ if self.config.queue_out_of_sequence => {
                inner.queue.push(received, msg);
                received - 1
            }
            _ => {
                debug!(session = %self.id, received, "dropping out-of-sequence message");
                inner.dropped_through = inner.dropped_through.max(received);
                received
            }
        };
        self.request_resend(inner, expected, end).await
    }

    async fn on_seq_too_low(
        &self,
        inner: &mut Inner,
        msg: &Message,
        msg_type: &MsgType,
        expected: u64,
        received: u64,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        if msg.is_poss_dup() {
            if *msg_type != MsgType::SequenceReset {
                let Some(orig) = msg.header.get(tags::ORIG_SENDING_TIME) else {
                    return self
                        .send_reject(
                            inner,
                            received,
                            Some(msg_type.as_str()),
                            SessionRejectReason::RequiredTagMissing,
                            Some(tags::ORIG_SENDING_TIME),
                            None,
                        )
                        .await;
                };
                if let (Ok(orig), Some(sending)) = (orig.as_timestamp(), msg.sending_time())
                    && orig > sending
                {
                    self.send_reject(
                        inner,
                        received,
                        Some(msg_type.as_str()),
                        SessionRejectReason::SendingTimeAccuracyProblem,
                        Some(tags::ORIG_SENDING_TIME),
                        None,
                    )
                    .await?;
                    self.logout_and_disconnect(inner, notes, "SendingTime accuracy problem")
                        .await?;
                    return Err(SessionError::ProtocolViolation(
                        "OrigSendingTime later than SendingTime".to_string(),
                    ));
                }
            }
            if let Some(new_seq) = msg.body.get_u64(tags::NEW_SEQ_NO)
                && *msg_type == MsgType::SequenceReset
                && is_gap_fill(msg)
                && new_seq > expected
            {
                info!(session = %self.id, from = expected, to = new_seq, "applying duplicate gap fill");
                self.store.set_next_target_seq(new_seq);
                return self.drain_queue(inner, notes).await;
            }
            debug!(session = %self.id, received, "ignoring possible duplicate");
            return Ok(());
        }

        match self.config.seq_too_low_policy {
            SeqTooLowPolicy::Logout => {
                let text = format!(
                    "MsgSeqNum too low, expecting {} but received {}",
                    expected, received
                );
                warn!(session = %self.id, expected, received, "MsgSeqNum too low");
                self.logout_and_disconnect(inner, notes, &text).await?;
                Err(SessionError::SequenceTooLow { expected, received })
            }
            SeqTooLowPolicy::Ignore => {
                warn!(session = %self.id, expected, received, "ignoring message with MsgSeqNum too low");
                Ok(())
            }
        }
    }

    /// Handles a message whose number is the expected one.
    async fn process_in_sequence(
        &self,
        inner: &mut Inner,
        msg: Message,
        seq: u64,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        self.store.set_next_target_seq(seq + 1);

        if let Some(err) = self.validator.as_ref().and_then(|v| v.validate(&msg).err()) {
            return self.reject_invalid(inner, &msg, seq, err).await;
        }
        if !msg.is_admin() {
            notes.deliver.push(msg);
            return Ok(());
        }
        if let Err(reason) = self.application.from_admin(&msg, &self.id).await {
            return self.reject_with(inner, &msg, seq, reason).await;
        }

        match msg.msg_type() {
            Some(MsgType::TestRequest) => {
                let mut reply = self.admin(MsgType::Heartbeat);
                if let Some(id) = msg.body.get_str(tags::TEST_REQ_ID) {
                    reply.body.set_str(tags::TEST_REQ_ID, id);
                }
                self.send_admin(inner, reply).await.map(|_| ())
            }
            Some(MsgType::ResendRequest) => self.on_resend_request(inner, &msg, seq).await,
            Some(MsgType::Reject) => {
                warn!(
                    session = %self.id,
                    ref_seq = ?msg.body.get_u64(tags::REF_SEQ_NUM),
                    text = ?msg.body.get_str(tags::TEXT),
                    "received Reject"
                );
                Ok(())
            }
            Some(MsgType::SequenceReset) => self.on_gap_fill(inner, &msg, seq).await,
            Some(MsgType::Logout) => self.on_logout(inner, &msg, notes).await,
            Some(MsgType::Logon) => {
                warn!(session = %self.id, "Logon received while already logged on");
                self.logout_and_disconnect(inner, notes, "Logon received while already logged on")
                    .await?;
                Err(SessionError::ProtocolViolation(
                    "Logon received while logged on".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    async fn on_resend_request(&self, inner: &mut Inner, msg: &Message, seq: u64) -> Result<(), SessionError> {
        let begin = msg.body.get_u64(tags::BEGIN_SEQ_NO);
        let end = msg.body.get_u64(tags::END_SEQ_NO);
        match (begin, end) {
            (Some(begin), Some(end)) => self.serve_resend(inner, begin, end).await,
            (None, _) | (_, None) => {
                let tag = if begin.is_none() {
                    tags::BEGIN_SEQ_NO
                } else {
                    tags::END_SEQ_NO
                };
                self.send_reject(
                    inner,
                    seq,
                    Some(MsgType::ResendRequest.as_str()),
                    SessionRejectReason::RequiredTagMissing,
                    Some(tag),
                    None,
                )
                .await
            }
        }
    }

    async fn on_gap_fill(&self, inner: &mut Inner, msg: &Message, seq: u64) -> Result<(), SessionError> {
        match msg.body.get_u64(tags::NEW_SEQ_NO) {
            Some(new_seq) if new_seq > seq => {
                debug!(session = %self.id, from = seq, to = new_seq, "gap fill");
                self.store.set_next_target_seq(new_seq);
                Ok(())
            }
            Some(_) => {
                self.send_reject(
                    inner,
                    seq,
                    Some(MsgType::SequenceReset.as_str()),
                    SessionRejectReason::ValueIsIncorrect,
                    Some(tags::NEW_SEQ_NO),
                    Some("NewSeqNo must be greater than MsgSeqNum"),
                )
                .await
            }
            None => {
                self.send_reject(
                    inner,
                    seq,
                    Some(MsgType::SequenceReset.as_str()),
                    SessionRejectReason::RequiredTagMissing,
                    Some(tags::NEW_SEQ_NO),
                    None,
                )
                .await
            }
        }
    }

    /// SequenceReset-Reset: no sequence checks apply.
    async fn on_sequence_reset(
        &self,
        inner: &mut Inner,
        msg: &Message,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        let seq = msg.seq_num().unwrap_or(0);
        let Some(new_seq) = msg.body.get_u64(tags::NEW_SEQ_NO) else {
            return self
                .send_reject(
                    inner,
                    seq,
                    Some(MsgType::SequenceReset.as_str()),
                    SessionRejectReason::RequiredTagMissing,
                    Some(tags::NEW_SEQ_NO),
                    None,
                )
                .await;
        };
        let expected = self.store.next_target_seq();
        if new_seq > expected {
            info!(session = %self.id, from = expected, to = new_seq, "sequence reset");
            self.store.set_next_target_seq(new_seq);
            self.drain_queue(inner, notes).await
        } else if new_seq < expected {
            self.send_reject(
                inner,
                seq,
                Some(MsgType::SequenceReset.as_str()),
                SessionRejectReason::ValueIsIncorrect,
                Some(tags::NEW_SEQ_NO),
                Some("NewSeqNo below expected MsgSeqNum"),
            )
            .await
        } else {
            warn!(session = %self.id, new_seq, "SequenceReset to the expected number");
            Ok(())
        }
    }

    async fn on_logout(
        &self,
        inner: &mut Inner,
        msg: &Message,
        notes: &mut Notifications,
    ) -> Result<(), SessionError> {
        if inner.logout_sent {
            info!(session = %self.id, "Logout confirmed");
        } else {
            info!(session = %self.id, text = ?msg.body.get_str(tags::TEXT), "counterparty logged out");
            if let Err(err) = self.send_logout(inner, None).await {
                warn!(session = %self.id, error = %err, "failed to answer Logout");
            }
        }
        self.detach(inner, notes, true).await
    }

    /// Processes queued messages that are now in sequence.
    async fn drain_queue(&self, inner: &mut Inner, notes: &mut Notifications) -> Result<(), SessionError> {
        while inner.responder.is_some() {
            let expected = self.store.next_target_seq();
            let Some(entry) = inner.queue.pop_expected(expected) else {
                break;
            };
            if entry.processed {
                self.store.set_next_target_seq(expected + 1);
                continue;
            }
            debug!(session = %self.id, seq = expected, "processing queued message");
            self.process_in_sequence(inner, entry.message, expected, notes)
                .await?;
        }
        inner.queue.discard_below(self.store.next_target_seq());
        self.check_resend_complete(inner).await
    }

    async fn check_resend_complete(&self, inner: &mut Inner) -> Result<(), SessionError> {
        let Some(range) = inner.resend else {
            return Ok(());
        };
        let expected = self.store.next_target_seq();
        if !range.is_satisfied_by(expected) {
            return Ok(());
        }
        info!(session = %self.id, begin = range.begin, end = range.end, "resend complete");
        inner.resend = None;
        if let Some(first) = inner.queue.first_seq() {
            return self.request_resend(inner, expected, first - 1).await;
        }
        if inner.dropped_through >= expected {
            let end = inner.dropped_through;
            return self.request_resend(inner, expected, end).await;
        }
        inner.dropped_through = 0;
        if inner.state == SessionState::ResendInProgress {
            self.transition(inner, SessionState::Active)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("validating", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

fn is_gap_fill(msg: &Message) -> bool {
    msg.body.get_bool(tags::GAP_FILL_FLAG).unwrap_or(false)
}

fn parse_seq(value: &[u8]) -> Option<u64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}

fn decode_reject_reason(err: &DecodeError) -> (SessionRejectReason, Option<u32>) {
    let reason = match err {
        DecodeError::TagOutOfOrder { .. } => SessionRejectReason::TagSpecifiedOutOfRequiredOrder,
        DecodeError::EmptyValue { .. } => SessionRejectReason::TagSpecifiedWithoutValue,
        DecodeError::InvalidTag(_) => SessionRejectReason::InvalidTagNumber,
        DecodeError::MissingRequiredField { .. }
        | DecodeError::MissingMsgType
        | DecodeError::MissingBodyLength => SessionRejectReason::RequiredTagMissing,
        DecodeError::InvalidFieldValue { .. }
        | DecodeError::InvalidUtf8(_)
        | DecodeError::InvalidBodyLength => SessionRejectReason::IncorrectDataFormat,
        DecodeError::Incomplete | DecodeError::InvalidBeginString => SessionRejectReason::Other,
    };
    (reason, err.ref_tag())
}
