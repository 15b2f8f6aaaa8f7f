//! Integration tests for bus-to-session fan-out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{EventKind, OrderEvent, OrderIssued, OrderStatus, OrderUpdated, Pricing};
use message_bus::{InMemoryMessageBus, MessageBus};
use notifications::{
    ChannelTransport, DispatcherConfig, SessionEnd, StreamSession, SubscriptionDispatcher,
    TransportProbe,
};
use tokio::task::JoinHandle;

struct Harness {
    bus: InMemoryMessageBus,
    dispatcher: Arc<SubscriptionDispatcher>,
    intake: JoinHandle<()>,
}

impl Harness {
    async fn new() -> Self {
        Self::with_config(DispatcherConfig::default()).await
    }

    async fn with_config(config: DispatcherConfig) -> Self {
        let bus = InMemoryMessageBus::with_default_topics();
        let dispatcher = Arc::new(SubscriptionDispatcher::new(config));
        let intake = dispatcher.start(&bus).await.unwrap();
        Self {
            bus,
            dispatcher,
            intake,
        }
    }

    fn open_session(&self, order_id: OrderId) -> (JoinHandle<SessionEnd>, TransportProbe) {
        let (transport, probe) = ChannelTransport::pair();
        let subscription = self.dispatcher.attach(order_id).unwrap();
        let handle = tokio::spawn(StreamSession::new(subscription, transport).run());
        (handle, probe)
    }

    async fn publish_update(&self, order_id: OrderId, status: OrderStatus) {
        let event = OrderEvent::OrderUpdated(OrderUpdated {
            order_id,
            user_id: UserId::from("user-1"),
            status,
            updated_at: Utc::now(),
        });
        self.bus.publish(event, &order_id.to_string()).await.unwrap();
    }
}

async fn next(probe: &mut TransportProbe) -> OrderUpdated {
    tokio::time::timeout(Duration::from_secs(2), probe.recv())
        .await
        .expect("timed out waiting for update")
        .expect("transport dropped")
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_session_only_receives_its_own_order() {
    let h = Harness::new().await;
    let a = OrderId::new();
    let b = OrderId::new();
    let (_session, mut probe) = h.open_session(a);

    for _ in 0..5 {
        h.publish_update(b, OrderStatus::InTransit).await;
        h.publish_update(a, OrderStatus::InTransit).await;
        h.publish_update(b, OrderStatus::Delivered).await;
    }

    for _ in 0..5 {
        assert_eq!(next(&mut probe).await.order_id, a);
    }
    settle().await;
    assert!(probe.try_recv().is_none());
}

fn status_for(n: usize) -> OrderStatus {
    if n % 2 == 0 {
        OrderStatus::InTransit
    } else {
        OrderStatus::Delivered
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_publishers_reach_only_their_own_sessions() {
    const PER_ORDER: usize = 20;
    let h = Harness::new().await;
    let a = OrderId::new();
    let b = OrderId::new();
    let (_session_a, mut probe_a) = h.open_session(a);
    let (_session_b, mut probe_b) = h.open_session(b);

    let publishers: Vec<_> = [a, b]
        .into_iter()
        .map(|order_id| {
            let bus = h.bus.clone();
            tokio::spawn(async move {
                for n in 0..PER_ORDER {
                    let event = OrderEvent::OrderUpdated(OrderUpdated {
                        order_id,
                        user_id: UserId::from("user-1"),
                        status: status_for(n),
                        updated_at: Utc::now(),
                    });
                    bus.publish(event, &order_id.to_string()).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for publisher in publishers {
        publisher.await.unwrap();
    }

    for (order_id, probe) in [(a, &mut probe_a), (b, &mut probe_b)] {
        for n in 0..PER_ORDER {
            let update = next(probe).await;
            assert_eq!(update.order_id, order_id);
            assert_eq!(update.status, status_for(n));
        }
    }
    settle().await;
    assert!(probe_a.try_recv().is_none());
    assert!(probe_b.try_recv().is_none());
}

#[tokio::test]
async fn test_two_sessions_on_same_order_both_receive_every_update_in_order() {
    let h = Harness::new().await;
    let id = OrderId::new();
    let (_first, mut first) = h.open_session(id);
    let (_second, mut second) = h.open_session(id);

    h.publish_update(id, OrderStatus::InTransit).await;
    h.publish_update(id, OrderStatus::Delivered).await;

    for probe in [&mut first, &mut second] {
        assert_eq!(next(probe).await.status, OrderStatus::InTransit);
        assert_eq!(next(probe).await.status, OrderStatus::Delivered);
    }
}

#[tokio::test]
async fn test_disconnecting_one_session_leaves_the_other_running() {
    let h = Harness::new().await;
    let id = OrderId::new();
    let (gone, gone_probe) = h.open_session(id);
    let (_kept, mut kept_probe) = h.open_session(id);

    gone_probe.disconnect();
    assert_eq!(gone.await.unwrap(), SessionEnd::Disconnected);
    assert_eq!(h.dispatcher.listener_count(id), 1);

    h.publish_update(id, OrderStatus::Delivered).await;
    assert_eq!(next(&mut kept_probe).await.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_disconnect_does_not_interrupt_another_orders_session() {
    let h = Harness::new().await;
    let a = OrderId::new();
    let b = OrderId::new();
    let (gone, gone_probe) = h.open_session(a);
    let (_kept, mut kept_probe) = h.open_session(b);

    gone_probe.disconnect();
    assert_eq!(gone.await.unwrap(), SessionEnd::Disconnected);
    assert_eq!(h.dispatcher.listener_count(a), 0);
    assert_eq!(h.dispatcher.listener_count(b), 1);

    h.publish_update(a, OrderStatus::InTransit).await;
    h.publish_update(b, OrderStatus::InTransit).await;
    h.publish_update(b, OrderStatus::Delivered).await;

    let first = next(&mut kept_probe).await;
    assert_eq!((first.order_id, first.status), (b, OrderStatus::InTransit));
    let second = next(&mut kept_probe).await;
    assert_eq!((second.order_id, second.status), (b, OrderStatus::Delivered));
}

#[tokio::test]
async fn test_transport_failure_is_isolated_to_its_session() {
    let h = Harness::new().await;
    let id = OrderId::new();
    let (broken, broken_probe) = h.open_session(id);
    let (_healthy, mut healthy_probe) = h.open_session(id);
    broken_probe.fail_sends(true);

    h.publish_update(id, OrderStatus::InTransit).await;

    assert!(matches!(
        broken.await.unwrap(),
        SessionEnd::TransportFailed(_)
    ));
    assert_eq!(next(&mut healthy_probe).await.status, OrderStatus::InTransit);

    h.publish_update(id, OrderStatus::Delivered).await;
    assert_eq!(next(&mut healthy_probe).await.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_issued_events_are_not_streamed() {
    let h = Harness::new().await;
    let id = OrderId::new();
    let (_session, mut probe) = h.open_session(id);
    let pricing = Pricing::for_subtotal(domain::Money::from_cents(1000)).unwrap();

    let issued = OrderEvent::OrderIssued(OrderIssued {
        order_id: id,
        user_id: UserId::from("user-1"),
        total_items: 1,
        transaction_fee: pricing.transaction_fee,
        net_total: pricing.net_total,
        status: OrderStatus::PreparingPackage,
        issued_at: Utc::now(),
    });
    h.bus.publish(issued, &id.to_string()).await.unwrap();
    h.publish_update(id, OrderStatus::InTransit).await;

    assert_eq!(next(&mut probe).await.status, OrderStatus::InTransit);
    settle().await;
    assert!(probe.try_recv().is_none());
}

#[tokio::test]
async fn test_no_replay_for_late_sessions() {
    let h = Harness::new().await;
    let id = OrderId::new();
    h.publish_update(id, OrderStatus::InTransit).await;
    settle().await;

    let (_session, mut probe) = h.open_session(id);
    h.publish_update(id, OrderStatus::Delivered).await;

    assert_eq!(next(&mut probe).await.status, OrderStatus::Delivered);
    settle().await;
    assert!(probe.try_recv().is_none());
}

#[tokio::test]
async fn test_shutdown_ends_sessions_and_intake() {
    let h = Harness::new().await;
    let id = OrderId::new();
    let (first, _p1) = h.open_session(id);
    let (second, _p2) = h.open_session(OrderId::new());

    h.dispatcher.shutdown();

    assert_eq!(first.await.unwrap(), SessionEnd::FeedClosed);
    assert_eq!(second.await.unwrap(), SessionEnd::FeedClosed);
    tokio::time::timeout(Duration::from_secs(2), h.intake)
        .await
        .unwrap()
        .unwrap();
    assert!(h.dispatcher.attach(id).is_err());
}

#[tokio::test]
async fn test_intake_stops_when_bus_closes() {
    let h = Harness::new().await;
    assert_eq!(h.bus.subscriber_count(EventKind::OrderUpdated), 1);

    h.bus.close();
    tokio::time::timeout(Duration::from_secs(2), h.intake)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_slow_session_is_evicted_without_blocking_others() {
    let h = Harness::with_config(DispatcherConfig { session_buffer: 2 }).await;
    let id = OrderId::new();

    // Never polled, so its queue fills up.
    let stalled = h.dispatcher.attach(id).unwrap();
    let (_healthy, mut healthy_probe) = h.open_session(id);

    for _ in 0..4 {
        h.publish_update(id, OrderStatus::InTransit).await;
        next(&mut healthy_probe).await;
    }

    assert_eq!(h.dispatcher.listener_count(id), 1);
    drop(stalled);
    assert_eq!(h.dispatcher.listener_count(id), 1);
}
