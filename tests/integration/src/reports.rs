//! Keyspace and client reports rendered from live replies.

use keyscope_core::{
    parse_keyspace_info, render_big_keys, render_clients, render_keyspace, tally_clients,
    BigKeyScanner, Connection, KeyspaceStore, ScanOptions,
};

use crate::helpers::{MockServer, MockState};

#[tokio::test]
async fn keyspace_report() {
    colored::control::set_override(false);
    let state = MockState {
        info_keyspace: "# Keyspace\r\n\
            db0:keys=120,expires=3,avg_ttl=100\r\n\
            db12:keys=5,expires=0,avg_ttl=0\r\n\
            db3:keys=40,expires=0,avg_ttl=0\r\n"
            .into(),
        ..MockState::default()
    };
    let server = MockServer::start(state).await;

    let mut conn = Connection::open(&server.options()).await.unwrap();
    let info = conn.info("keyspace").await.unwrap();
    let text = render_keyspace(&parse_keyspace_info(&info));

    assert_eq!(
        text,
        "Database Key Statistics:\n\
         db0   : 120 keys\n\
         db3   : 40 keys\n\
         db12  : 5 keys\n\
         \n\
         Total keys: 165\n"
    );
    assert!(server.command_log().contains(&"INFO keyspace".to_string()));
}

#[tokio::test]
async fn client_report() {
    colored::control::set_override(false);
    let state = MockState {
        client_list: "id=1 addr=192.168.1.10:5000 laddr=10.0.0.1:6379 fd=5 cmd=get\n\
            id=2 addr=192.168.1.11:5001 laddr=10.0.0.1:6379 fd=6 cmd=set\n\
            id=3 addr=192.168.1.10:5002 laddr=10.0.0.1:6379 fd=7 cmd=client|list\n"
            .into(),
        ..MockState::default()
    };
    let server = MockServer::start(state).await;

    let mut conn = Connection::open(&server.options()).await.unwrap();
    let list = conn.client_list().await.unwrap();
    let text = render_clients(&tally_clients(&list));

    assert_eq!(
        text,
        "Client Connections:\n\
         192.168.1.10    : 2\n\
         192.168.1.11    : 1\n\
         \n\
         Total connections: 3\n"
    );
    assert!(server.command_log().contains(&"CLIENT LIST".to_string()));
}

#[tokio::test]
async fn big_key_report_text() {
    colored::control::set_override(false);
    let mut state = MockState::default();
    state.insert("queue", "list", 1200);
    state.insert("tags", "set", 8);
    let server = MockServer::start(state).await;

    let mut conn = Connection::open(&server.options()).await.unwrap();
    let report = BigKeyScanner::new(ScanOptions {
        top_n: 5,
        ..ScanOptions::default()
    })
    .run(&mut conn)
    .await;
    let text = render_big_keys(&report);

    assert!(text.starts_with("Scanned 2 keys in 1 batches\n"));
    assert!(text.contains("Top 5 biggest keys per type:"));
    assert!(text.contains(&format!(" 1. {:<60} (1200 items)\n", "queue")));
    assert!(text.contains(&format!(" 1. {:<60} (8 members)\n", "tags")));
    assert!(text.find("[LIST]").unwrap() < text.find("[SET]").unwrap());
    assert_eq!(text, render_big_keys(&report));
}
