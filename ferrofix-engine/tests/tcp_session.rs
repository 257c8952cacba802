/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Acceptor and initiator engines talking over loopback TCP.

use async_trait::async_trait;
use ferrofix_core::message::{Message, MsgType};
use ferrofix_core::session_id::SessionId;
use ferrofix_core::tags;
use ferrofix_engine::EngineBuilder;
use ferrofix_session::{Application, ConnectionType, RejectReason, SessionConfigBuilder, SessionState};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
struct Orders(Mutex<Vec<String>>);

#[async_trait]
impl Application for Orders {
    async fn from_app(&self, message: &Message, _session_id: &SessionId) -> Result<(), RejectReason> {
        if let Some(id) = message.body.get_str(tags::CL_ORD_ID) {
            self.0.lock().push(id.to_string());
        }
        Ok(())
    }
}

async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_logon_order_and_shutdown_over_tcp() {
    let orders = Arc::new(Orders::default());
    let server = EngineBuilder::new()
        .with_shared_application(orders.clone())
        .with_validation(true)
        .with_tick_interval(Duration::from_millis(50))
        .add_session(
            SessionConfigBuilder::new()
                .sender_comp_id("SERVER")
                .target_comp_id("CLIENT")
                .build()
                .unwrap(),
        )
        .build()
        .await
        .unwrap();
    let client = EngineBuilder::new()
        .with_tick_interval(Duration::from_millis(50))
        .with_reconnect_interval(Duration::from_millis(50))
        .add_session(
            SessionConfigBuilder::new()
                .sender_comp_id("CLIENT")
                .target_comp_id("SERVER")
                .connection_type(ConnectionType::Initiator)
                .build()
                .unwrap(),
        )
        .build()
        .await
        .unwrap();

    let acceptor = server.bind("127.0.0.1:0").await.unwrap();
    let address = acceptor.local_addr().unwrap();
    let (stop_server, server_stopped) = oneshot::channel::<()>();
    let server_task = tokio::spawn(acceptor.run_until(async {
        server_stopped.await.ok();
    }));

    let client_id = SessionId::new("FIX.4.4", "CLIENT", "SERVER");
    let server_id = SessionId::new("FIX.4.4", "SERVER", "CLIENT");
    let initiator = client.initiator(&client_id, address.to_string()).unwrap();
    let client_session = initiator.session().clone();
    let (stop_client, client_stopped) = oneshot::channel::<()>();
    let client_task = tokio::spawn(initiator.run_until(async {
        client_stopped.await.ok();
    }));

    eventually(|| {
        let session = client_session.clone();
        async move { session.is_logged_on().await }
    })
    .await;
    let server_session = server.session(&server_id).unwrap();
    assert!(server_session.is_logged_on().await);

    let mut order = Message::new("FIX.4.4", MsgType::NewOrderSingle);
    order.body.set_str(tags::CL_ORD_ID, "ORD-1");
    order.body.set_str(tags::SYMBOL, "EURUSD");
    order.body.set_str(54, "1");
    order.body.set_u64(38, 100);
    order.body.set_str(40, "1");
    let seq = client.send(&client_id, order).await.unwrap();
    assert_eq!(seq.value(), 2);

    eventually(|| {
        let orders = orders.clone();
        async move { orders.0.lock().len() == 1 }
    })
    .await;
    assert_eq!(orders.0.lock().as_slice(), ["ORD-1"]);

    stop_client.send(()).unwrap();
    client_task.await.unwrap().unwrap();
    assert_eq!(client_session.state().await, SessionState::Disconnected);

    eventually(|| {
        let session = server_session.clone();
        async move { !session.is_connected().await }
    })
    .await;
    stop_server.send(()).unwrap();
    server_task.await.unwrap().unwrap();
}
