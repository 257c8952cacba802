//! Initiator demo: connects to the acceptor demo, sends a few orders after
//! each logon and logs the fills. Stop with Ctrl-C.
//!
//! ```text
//! FIX_ORDERS=5 cargo run -p ferrofix-example --example initiator
//! ```

use async_trait::async_trait;
use ferrofix::prelude::*;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

mod common;
use common::{DemoConfig, init_logging};

struct Trader {
    logged_on: watch::Sender<bool>,
}

#[async_trait]
impl Application for Trader {
    async fn on_logon(&self, session_id: &SessionId) {
        info!(session = %session_id, "logged on");
        self.logged_on.send_replace(true);
    }

    async fn on_logout(&self, session_id: &SessionId) {
        info!(session = %session_id, "logged out");
        self.logged_on.send_replace(false);
    }

    async fn from_app(&self, message: &Message, _session_id: &SessionId) -> Result<(), RejectReason> {
        if message.is_type(&MsgType::ExecutionReport) {
            info!(
                cl_ord_id = message.body.get_str(tags::CL_ORD_ID).unwrap_or("?"),
                exec_id = message.body.get_str(17).unwrap_or("?"),
                status = message.body.get_str(39).unwrap_or("?"),
                "execution report"
            );
        }
        Ok(())
    }
}

fn order(n: u64) -> Message {
    let mut msg = Message::of_type(MsgType::NewOrderSingle);
    msg.body.set_str(tags::CL_ORD_ID, &format!("CL{n}"));
    msg.body.set_str(tags::SYMBOL, "EURUSD");
    msg.body.set_str(54, if n % 2 == 0 { "1" } else { "2" });
    msg.body.set_u64(38, 100 * n);
    msg.body.set_str(40, "2");
    msg.body.set_str(44, "1.0850");
    msg.body.set_timestamp(60, Timestamp::now());
    msg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = DemoConfig::client();
    let count: u64 = std::env::var("FIX_ORDERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);

    let (logged_on, mut logon_events) = watch::channel(false);
    let session = SessionConfigBuilder::new()
        .sender_comp_id(cfg.sender_comp_id.as_str())
        .target_comp_id(cfg.target_comp_id.as_str())
        .begin_string(cfg.begin_string.as_str())
        .connection_type(ConnectionType::Initiator)
        .heartbeat_interval(cfg.heartbeat_interval)
        .build()?;
    let session_id = session.session_id();
    let engine = EngineBuilder::new()
        .with_application(Trader { logged_on })
        .with_reconnect_interval(Duration::from_secs(2))
        .with_max_reconnect_attempts(0)
        .add_session(session)
        .build()
        .await?;

    let sender = engine.clone();
    let id = session_id.clone();
    tokio::spawn(async move {
        let mut next = 1;
        while logon_events.changed().await.is_ok() {
            if !*logon_events.borrow_and_update() {
                continue;
            }
            for _ in 0..count {
                match sender.send(&id, order(next)).await {
                    Ok(seq) => info!(seq = seq.value(), cl_ord_id = %format!("CL{next}"), "order sent"),
                    Err(err) => warn!(error = %err, "order not sent"),
                }
                next += 1;
            }
        }
    });

    info!(address = %cfg.addr(), session = %session_id, "connecting");
    engine
        .initiator(&session_id, cfg.addr())?
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "ctrl-c handler failed");
            }
        })
        .await?;
    Ok(())
}
