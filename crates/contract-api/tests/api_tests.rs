use std::net::SocketAddr;

use contract_api::{build_router, sweep_deadlines, ApiState};
use contract_domain::parse_timestamp;
use contract_infra::ContractDesk;
use contract_persistence::DbConfig;
use diesel::connection::SimpleConnection;
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn seeded_state() -> (TempDir, ApiState) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("contracts.db");
    let desk = ContractDesk::open(DbConfig::for_path(path.to_string_lossy().to_string())).expect("open");
    desk.initialize(parse_timestamp("2025-03-03 10:00:00").unwrap()).expect("seed");
    (dir, ApiState::new(desk))
}

async fn serve(state: ApiState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

async fn send_raw(addr: SocketAddr, path: &str) -> (u16, Value) {
    let mut stream = TcpStream::connect(addr).await.expect("connect server");
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.expect("write request");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).await.expect("read response");
    let (head, body) = buf.split_once("\r\n\r\n").expect("http response");
    let status = head.lines()
                     .next()
                     .and_then(|line| line.split_whitespace().nth(1))
                     .and_then(|code| code.parse::<u16>().ok())
                     .expect("status code");
    (status, serde_json::from_str(body).expect("json body"))
}

#[tokio::test]
async fn banner_names_the_service() {
    let (_dir, state) = seeded_state();
    let addr = serve(state).await;
    let (status, body) = send_raw(addr, "/").await;
    assert_eq!(status, 200);
    assert_eq!(body["service"], "contractflow");
}

#[tokio::test]
async fn clients_lists_seeded_organizations() {
    let (_dir, state) = seeded_state();
    let expected = state.desk().organizations().unwrap().len();
    let addr = serve(state).await;
    let (status, body) = send_raw(addr, "/clients").await;
    assert_eq!(status, 200);
    let clients = body.as_array().expect("array of clients");
    assert_eq!(clients.len(), expected);
    assert!(clients.iter().any(|c| c["inn"] == "7703234453"));
}

#[tokio::test]
async fn contract_stats_reports_counters() {
    let (_dir, state) = seeded_state();
    let addr = serve(state).await;
    let (status, body) = send_raw(addr, "/contracts/stats").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_contracts"], 50);
    assert_eq!(body["on_approval"], 0);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (_dir, state) = seeded_state();
    let addr = serve(state).await;
    let mut stream = TcpStream::connect(addr).await.expect("connect server");
    stream.write_all(format!("GET /nope HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n").as_bytes())
          .await
          .expect("write request");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).await.expect("read response");
    assert!(buf.starts_with("HTTP/1.1 404"));
}

#[tokio::test]
async fn sweep_on_a_fresh_database_finds_nothing() {
    let (_dir, state) = seeded_state();
    assert_eq!(sweep_deadlines(&state).await.expect("sweep"), 0);
}

#[tokio::test]
async fn storage_failure_answers_500_with_json_error() {
    let (_dir, state) = seeded_state();
    {
        let mut conn = state.desk().provider().pool.get().expect("connection");
        conn.batch_execute("DROP TABLE organizations").expect("drop table");
    }
    let addr = serve(state).await;
    let (status, body) = send_raw(addr, "/clients").await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().is_some_and(|msg| msg.contains("organizations")), "{body}");

    // el resto de rutas sigue respondiendo
    let (status, _) = send_raw(addr, "/contracts/stats").await;
    assert_eq!(status, 200);
}
