use std::collections::HashSet;
use std::time::Duration;

use depot_config::HubConfig;
use depot_hub::{
    ClientHandle, ClientKey, ClientSummary, Hub, HubError, HubHandle, Message, Registration,
    RoomSummary,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

struct TestClient {
    key: ClientKey,
    rx: mpsc::Receiver<Message>,
}

impl TestClient {
    async fn register(hub: &HubHandle, id: i64, room_id: i64, username: &str) -> Self {
        let (tx, rx) = mpsc::channel(10);
        let key = ClientKey::new(id, room_id, username);
        let registration = hub
            .register(ClientHandle::new(key.clone(), tx))
            .await
            .expect("register should be acknowledged");
        assert_eq!(registration, Registration::Joined);
        Self { key, rx }
    }

    async fn next(&mut self) -> Message {
        timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("message should arrive in time")
            .expect("outbound queue should be open")
    }

    fn pending(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

fn start() -> HubHandle {
    let (hub, _task) = Hub::spawn(&HubConfig::default());
    hub
}

fn client_ids(clients: &[ClientSummary]) -> HashSet<i64> {
    clients.iter().map(|client| client.id).collect()
}

#[tokio::test]
async fn lobby_lists_registered_clients() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let _alice = TestClient::register(&hub, 1, 1, "alice").await;
    let _bob = TestClient::register(&hub, 2, 1, "bob").await;

    let mut clients = hub.list_clients(1).await.unwrap();
    clients.sort_by_key(|client| client.id);
    assert_eq!(
        clients,
        vec![
            ClientSummary {
                id: 1,
                username: "alice".into()
            },
            ClientSummary {
                id: 2,
                username: "bob".into()
            },
        ]
    );
}

#[tokio::test]
async fn unregister_notifies_remaining_members_once() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let alice = TestClient::register(&hub, 1, 1, "alice").await;
    let mut bob = TestClient::register(&hub, 2, 1, "bob").await;

    assert!(hub.unregister(alice.key.clone()).await.unwrap());

    assert_eq!(
        bob.pending(),
        vec![Message::new("user left the chat", 1, "alice")]
    );
    assert_eq!(
        hub.list_clients(1).await.unwrap(),
        vec![ClientSummary {
            id: 2,
            username: "bob".into()
        }]
    );
}

#[tokio::test]
async fn unregistering_last_member_sends_no_notice() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let mut alice = TestClient::register(&hub, 1, 1, "alice").await;
    assert!(hub.unregister(alice.key.clone()).await.unwrap());

    // The hub dropped the only sender, so the queue is closed and empty.
    assert_eq!(alice.rx.recv().await, None);
    assert!(hub.list_clients(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn unregister_closes_outbound_queue_after_pending_messages() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let mut alice = TestClient::register(&hub, 1, 1, "alice").await;
    let mut bob = TestClient::register(&hub, 2, 1, "bob").await;

    hub.broadcast(Message::new("before", 1, "bob")).await.unwrap();
    assert_eq!(bob.next().await, Message::new("before", 1, "bob"));
    hub.unregister(alice.key.clone()).await.unwrap();

    assert_eq!(alice.rx.recv().await, Some(Message::new("before", 1, "bob")));
    assert_eq!(alice.rx.recv().await, None);
}

#[tokio::test]
async fn duplicate_unregister_is_a_no_op() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let alice = TestClient::register(&hub, 1, 1, "alice").await;
    let mut bob = TestClient::register(&hub, 2, 1, "bob").await;
    let _carol = TestClient::register(&hub, 3, 1, "carol").await;

    assert!(hub.unregister(alice.key.clone()).await.unwrap());
    assert!(!hub.unregister(alice.key.clone()).await.unwrap());

    assert_eq!(bob.pending().len(), 1, "only one leave notice expected");
    assert_eq!(client_ids(&hub.list_clients(1).await.unwrap()), HashSet::from([2, 3]));
}

#[tokio::test]
async fn stale_connection_cannot_unregister_newer_one() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let alice = TestClient::register(&hub, 1, 1, "alice").await;
    hub.unregister(alice.key.clone()).await.unwrap();
    let _alice_again = TestClient::register(&hub, 1, 1, "alice").await;

    assert!(!hub.unregister(alice.key.clone()).await.unwrap());
    assert_eq!(client_ids(&hub.list_clients(1).await.unwrap()), HashSet::from([1]));
}

#[tokio::test]
async fn second_connection_for_same_id_is_not_added() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let _alice = TestClient::register(&hub, 1, 1, "alice").await;

    let (tx, mut rx) = mpsc::channel(10);
    let registration = hub
        .register(ClientHandle::new(ClientKey::new(1, 1, "alice"), tx))
        .await
        .unwrap();

    assert_eq!(registration, Registration::AlreadyMember);
    assert_eq!(rx.recv().await, None, "rejected handle should be dropped");
    assert_eq!(hub.list_clients(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn register_into_unknown_room_is_rejected() {
    let hub = start();

    let (tx, mut rx) = mpsc::channel(10);
    let error = hub
        .register(ClientHandle::new(ClientKey::new(1, 42, "alice"), tx))
        .await
        .unwrap_err();

    assert_eq!(error, HubError::RoomNotFound { id: 42 });
    assert_eq!(rx.recv().await, None);
    assert!(hub.list_rooms().await.unwrap().is_empty());
}

#[tokio::test]
async fn broadcast_to_unknown_room_reaches_nobody() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let mut alice = TestClient::register(&hub, 1, 1, "alice").await;

    hub.broadcast(Message::new("hi", 99, "x")).await.unwrap();
    // Same channel, so the sentinel is handled after the stray message.
    hub.broadcast(Message::new("sentinel", 1, "x")).await.unwrap();

    assert_eq!(alice.next().await, Message::new("sentinel", 1, "x"));
    assert!(alice.pending().is_empty());
    assert_eq!(
        hub.list_rooms().await.unwrap(),
        vec![RoomSummary {
            id: 1,
            name: "lobby".into()
        }]
    );
    assert_eq!(client_ids(&hub.list_clients(1).await.unwrap()), HashSet::from([1]));
}

#[tokio::test]
async fn broadcast_reaches_every_member_exactly_once() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();
    hub.create_room(2, "yard").await.unwrap();

    let mut members = Vec::new();
    for id in 1..=5 {
        members.push(TestClient::register(&hub, id, 1, &format!("user-{id}")).await);
    }
    let mut outsider = TestClient::register(&hub, 6, 2, "outsider").await;

    hub.broadcast(Message::new("hi", 1, "user-1")).await.unwrap();
    hub.broadcast(Message::new("sentinel", 2, "x")).await.unwrap();
    assert_eq!(outsider.next().await, Message::new("sentinel", 2, "x"));

    for member in &mut members {
        assert_eq!(member.pending(), vec![Message::new("hi", 1, "user-1")]);
    }
}

#[tokio::test]
async fn broadcast_during_concurrent_registration_never_duplicates() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let mut existing = Vec::new();
    for id in 1..=3 {
        existing.push(TestClient::register(&hub, id, 1, "existing").await);
    }

    let mut joiners = Vec::new();
    for id in 100..120 {
        let hub = hub.clone();
        joiners.push(tokio::spawn(async move {
            TestClient::register(&hub, id, 1, "joiner").await
        }));
    }
    hub.broadcast(Message::new("race", 1, "existing")).await.unwrap();

    let mut late = Vec::new();
    for joiner in joiners {
        late.push(joiner.await.unwrap());
    }

    hub.broadcast(Message::new("sentinel", 1, "x")).await.unwrap();
    for member in &mut existing {
        assert_eq!(member.next().await, Message::new("race", 1, "existing"));
        assert_eq!(member.next().await, Message::new("sentinel", 1, "x"));
    }
    for member in &mut late {
        let mut received = Vec::new();
        received.push(member.next().await);
        received.extend(member.pending());
        let races = received.iter().filter(|m| m.content() == "race").count();
        assert!(races <= 1, "joiner saw the broadcast {races} times");
        assert_eq!(received.last().map(Message::content), Some("sentinel"));
    }
}

#[tokio::test]
async fn membership_tracks_register_and_unregister_sequences() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();

    let mut clients = Vec::new();
    for id in 1..=6 {
        clients.push(TestClient::register(&hub, id, 1, "worker").await);
    }
    for client in clients.iter().filter(|client| client.key.id % 2 == 0) {
        hub.unregister(client.key.clone()).await.unwrap();
    }
    // Repeat one removal to check idempotence.
    hub.unregister(clients[1].key.clone()).await.unwrap();

    assert_eq!(
        client_ids(&hub.list_clients(1).await.unwrap()),
        HashSet::from([1, 3, 5])
    );
}

#[tokio::test]
async fn create_room_rejects_duplicate_ids() {
    let hub = start();
    hub.create_room(1, "lobby").await.unwrap();
    let _alice = TestClient::register(&hub, 1, 1, "alice").await;

    let error = hub.create_room(1, "other").await.unwrap_err();
    assert_eq!(error, HubError::RoomAlreadyExists { id: 1 });

    assert_eq!(
        hub.list_rooms().await.unwrap(),
        vec![RoomSummary {
            id: 1,
            name: "lobby".into()
        }]
    );
    assert_eq!(hub.list_clients(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_clients_of_unknown_room_fails() {
    let hub = start();
    assert_eq!(
        hub.list_clients(7).await.unwrap_err(),
        HubError::RoomNotFound { id: 7 }
    );
}

#[tokio::test]
async fn handle_reports_closed_hub() {
    let (hub, handle) = Hub::new(&HubConfig::default());
    drop(hub);

    assert_eq!(handle.list_rooms().await.unwrap_err(), HubError::Closed);
    assert_eq!(
        handle.broadcast(Message::new("hi", 1, "x")).await.unwrap_err(),
        HubError::Closed
    );
}
