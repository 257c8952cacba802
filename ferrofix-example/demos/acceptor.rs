//! Acceptor demo: logs on any configured client and fills every order.
//!
//! ```text
//! RUST_LOG=debug cargo run -p ferrofix-example --example acceptor
//! ```

use async_trait::async_trait;
use ferrofix::core::BusinessRejectReason;
use ferrofix::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{info, warn};

mod common;
use common::{DemoConfig, init_logging};

/// Hands incoming orders to the fill task.
struct OrderDesk {
    orders: mpsc::UnboundedSender<(SessionId, Message)>,
}

#[async_trait]
impl Application for OrderDesk {
    async fn on_logon(&self, session_id: &SessionId) {
        info!(session = %session_id, "client logged on");
    }

    async fn on_logout(&self, session_id: &SessionId) {
        info!(session = %session_id, "client logged out");
    }

    async fn from_app(&self, message: &Message, session_id: &SessionId) -> Result<(), RejectReason> {
        if !message.is_type(&MsgType::NewOrderSingle) {
            return Err(RejectReason::business(
                BusinessRejectReason::UnsupportedMessageType,
            ));
        }
        self.orders
            .send((session_id.clone(), message.clone()))
            .map_err(|_| {
                RejectReason::business(BusinessRejectReason::ApplicationNotAvailable)
            })
    }
}

fn fill(order: &Message, exec_id: u64) -> Message {
    let cl_ord_id = order.body.get_str(tags::CL_ORD_ID).unwrap_or("0");
    let qty = order.body.get_str(38).unwrap_or("0");

    let mut report = Message::of_type(MsgType::ExecutionReport);
    report.body.set_str(37, &format!("ORD{cl_ord_id}"));
    report.body.set_str(tags::CL_ORD_ID, cl_ord_id);
    report.body.set_str(17, &format!("EX{exec_id}"));
    report.body.set_str(150, "F");
    report.body.set_str(39, "2");
    report.body.set_str(tags::SYMBOL, order.body.get_str(tags::SYMBOL).unwrap_or("N/A"));
    report.body.set_str(54, order.body.get_str(54).unwrap_or("1"));
    report.body.set_str(151, "0");
    report.body.set_str(14, qty);
    report.body.set_str(6, order.body.get_str(44).unwrap_or("0"));
    report
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = DemoConfig::server();

    let (tx, mut orders) = mpsc::unbounded_channel();
    let session = SessionConfigBuilder::new()
        .sender_comp_id(cfg.sender_comp_id.as_str())
        .target_comp_id(cfg.target_comp_id.as_str())
        .begin_string(cfg.begin_string.as_str())
        .heartbeat_interval(cfg.heartbeat_interval)
        .build()?;
    let engine = EngineBuilder::new()
        .with_application(OrderDesk { orders: tx })
        .with_validation(true)
        .add_session(session)
        .build()
        .await?;

    let filler = engine.clone();
    tokio::spawn(async move {
        let exec_ids = AtomicU64::new(1);
        while let Some((session_id, order)) = orders.recv().await {
            let report = fill(&order, exec_ids.fetch_add(1, Ordering::Relaxed));
            match filler.send(&session_id, report).await {
                Ok(seq) => info!(session = %session_id, seq = seq.value(), "order filled"),
                Err(err) => warn!(session = %session_id, error = %err, "fill not sent"),
            }
        }
    });

    let acceptor = engine.bind(cfg.addr()).await?;
    info!(address = %acceptor.local_addr()?, version = %cfg.begin_string, "accepting connections");
    acceptor
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "ctrl-c handler failed");
            }
        })
        .await?;
    Ok(())
}
