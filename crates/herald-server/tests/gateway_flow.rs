//! Gateway integration tests: issue → register → connect → push over real
//! sockets, plus the admission and routing invariants observable only through
//! the full HTTP/WebSocket surface.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use herald_core::cid::sign;
use herald_server::{AppState, HeraldServer, ServerConfig};
use herald_settings::{HeraldSettings, SiteSettings};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn test_settings(sites: Vec<SiteSettings>) -> HeraldSettings {
    let mut settings = HeraldSettings::default();
    settings.cid.current_secret_version = "1".to_owned();
    settings.cid.secrets = vec![herald_core::SecretRecord {
        version: "1".to_owned(),
        key: "k".to_owned(),
    }];
    settings.sites = sites;
    settings
}

async fn boot(sites: Vec<SiteSettings>) -> (SocketAddr, HeraldServer) {
    let state = AppState::from_settings(&test_settings(sites)).unwrap();
    let server = HeraldServer::new(ServerConfig::default(), state);
    let (addr, _handle) = server.listen().await.unwrap();
    (addr, server)
}

async fn connect(addr: SocketAddr, query: &str) -> Result<WsStream, WsError> {
    let url = format!("ws://{addr}/notifications/websocket?{query}");
    connect_async(url).await.map(|(ws, _)| ws)
}

async fn post_json(addr: SocketAddr, path: &str, body: &Value) -> Value {
    reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn next_json(ws: &mut WsStream) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for websocket message")
        .expect("stream ended")
        .expect("websocket error");
    let text = msg.into_text().expect("expected a text frame");
    serde_json::from_str(text.as_str()).unwrap()
}

#[tokio::test]
async fn end_to_end_issue_register_connect_push() {
    // Upstream business backend that accepts the registration.
    let backend = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/biz-client/biz/login/regCid"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(json!({"success": true})),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let (addr, _server) = boot(vec![SiteSettings {
        id: "pw01tk01".to_owned(),
        name: "dev".to_owned(),
        domain: backend.uri(),
        cid_current_secret_key_version: Some(1),
    }])
    .await;

    // Issue: random.1.<sha1(random ++ "k")>, pinned as a year-long cookie.
    let response = reqwest::get(format!("http://{addr}/cid")).await.unwrap();
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_owned();
    assert!(set_cookie.starts_with("cid="));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let cid = body["data"]["cid"].as_str().unwrap().to_owned();
    let parts: Vec<&str> = cid.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[1], "1");
    assert_eq!(parts[2], sign(parts[0], "k"));

    // A second request presenting the cookie gets the same identifier back.
    let cookie_pair = set_cookie.split(';').next().unwrap().to_owned();
    let again: Value = reqwest::Client::new()
        .get(format!("http://{addr}/cid"))
        .header("cookie", cookie_pair)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["data"]["cid"].as_str().unwrap(), cid);

    // Register the CID for the site; the gateway forwards upstream.
    let registered = post_json(
        addr,
        "/register-cid",
        &json!({
            "cid": cid,
            "manageSiteId": "pw01tk01",
            "clientType": "C_WEB",
            "clientFlag": "w",
        }),
    )
    .await;
    assert_eq!(registered, json!({"success": true}));

    // Connect and push to exactly that identity.
    let mut ws = connect(
        addr,
        &format!("id={cid}&idType=cid&manageSiteId=pw01tk01&clientType=C_WEB&clientFlag=w"),
    )
    .await
    .unwrap();

    let pushed = post_json(
        addr,
        "/notifications/push",
        &json!({
            "targets": [{"manageSiteId": "pw01tk01", "cid": cid}],
            "data": {"hello": 1},
        }),
    )
    .await;
    assert_eq!(pushed, json!({"success": true}));

    let message = next_json(&mut ws).await;
    assert_eq!(message["code"], 2001);
    assert_eq!(message["data"], json!({"hello": 1}));
    assert!(message["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn duplicate_identity_rejected_until_holder_closes() {
    let (addr, _server) = boot(Vec::new()).await;
    let query = "id=dup-1&idType=cid&manageSiteId=s1";

    let mut first = connect(addr, query).await.unwrap();

    // Second upgrade with the same (identifier, kind): 403, holder unaffected.
    match connect(addr, query).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 403),
        other => panic!("expected http 403, got {other:?}"),
    }

    let pushed = post_json(
        addr,
        "/notifications/push",
        &json!({"targets": [{"manageSiteId": "s1", "cid": "dup-1"}], "data": {"still": "here"}}),
    )
    .await;
    assert_eq!(pushed["success"], true);
    assert_eq!(next_json(&mut first).await["data"]["still"], "here");

    // Same identifier under the other kind is a different key.
    let _other_kind = connect(addr, "id=dup-1&idType=user-id&manageSiteId=s1")
        .await
        .unwrap();

    // After the holder closes, the key becomes reusable. Eviction runs in the
    // connection task, so poll until admission succeeds.
    first.close(None).await.unwrap();
    let mut attempts = 0;
    loop {
        match connect(addr, query).await {
            Ok(_ws) => break,
            Err(_) => {
                attempts += 1;
                assert!(attempts < 50, "key never became reusable");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

#[tokio::test]
async fn routing_is_precise_and_broadcast_is_site_wide() {
    let (addr, _server) = boot(Vec::new()).await;

    let mut by_cid = connect(addr, "id=c1&idType=cid&manageSiteId=s1").await.unwrap();
    let mut by_user = connect(addr, "id=c1&idType=user-id&manageSiteId=s1")
        .await
        .unwrap();
    let mut other_site = connect(addr, "id=c2&idType=cid&manageSiteId=s2")
        .await
        .unwrap();

    // Unicast by cid must not hit the user-id connection with the same id.
    let _ = post_json(
        addr,
        "/notifications/push",
        &json!({"targets": [{"manageSiteId": "s1", "cid": "c1"}], "data": {"n": 1}}),
    )
    .await;
    assert_eq!(next_json(&mut by_cid).await["code"], 2001);

    // Broadcast covers every s1 connection and nothing on s2.
    let _ = post_json(
        addr,
        "/notifications/push",
        &json!({"targets": {"manageSiteId": "s1"}, "data": {"n": 2}}),
    )
    .await;
    let b1 = next_json(&mut by_cid).await;
    let b2 = next_json(&mut by_user).await;
    assert_eq!(b1["code"], 2002);
    assert_eq!(b2["code"], 2002);
    assert_eq!(b2["data"]["n"], 2);

    // The user-id connection never saw the unicast, and s2 saw nothing:
    // its first (and only pending) frame would have been the broadcast.
    let _ = post_json(
        addr,
        "/notifications/push",
        &json!({"targets": {"manageSiteId": "s2"}, "data": {"n": 3}}),
    )
    .await;
    assert_eq!(next_json(&mut other_site).await["data"]["n"], 3);
}

#[tokio::test]
async fn upgrade_precondition_ladder() {
    let (addr, _server) = boot(Vec::new()).await;

    // Plain HTTP request: refused before any parameter checks.
    let body: Value = reqwest::get(format!("http://{addr}/notifications/websocket?id=x"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["errCode"], "NOT_WEBSOCKET");

    // Real upgrade negotiations with a broken query: structured JSON errors.
    // Sent as a raw HTTP/1.1 upgrade request so the response body stays
    // observable (a websocket client drops non-101 bodies).
    for (query, code) in [
        ("idType=cid", "ID_MISSING"),
        ("id=x", "ID_TYPE_MISSING"),
        ("id=x&idType=session", "ID_TYPE_ERROR"),
    ] {
        let raw = raw_upgrade_request(addr, query).await;
        assert!(raw.starts_with("HTTP/1.1 200"), "query {query}: {raw}");
        assert!(raw.contains(code), "query {query}: {raw}");
    }
}

/// Issue a hand-rolled upgrade request and collect whatever the server sends
/// back before the read goes idle.
async fn raw_upgrade_request(addr: SocketAddr, query: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET /notifications/websocket?{query} HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut collected = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match tokio::time::timeout(Duration::from_millis(500), stream.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => collected.extend_from_slice(&buf[..n]),
            _ => break,
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}

#[tokio::test]
async fn push_validation_reports_shape_errors() {
    let (addr, _server) = boot(Vec::new()).await;

    let body = post_json(addr, "/notifications/push", &json!({"data": {"x": 1}})).await;
    assert_eq!(body["errCode"], "PARAMS_MISSING");

    let body = post_json(
        addr,
        "/notifications/push",
        &json!({"targets": 7, "data": {"x": 1}}),
    )
    .await;
    assert_eq!(body["errCode"], "PARAMS_TYPE_ERROR");

    // Valid shape with zero matching connections is still accepted.
    let body = post_json(
        addr,
        "/notifications/push",
        &json!({"targets": {"manageSiteId": "nobody"}, "data": 1}),
    )
    .await;
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn register_cid_reports_unknown_site_and_upstream_rejection() {
    let backend = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "errCode": "NOPE"})),
        )
        .mount(&backend)
        .await;

    let (addr, server) = boot(vec![SiteSettings {
        id: "s1".to_owned(),
        name: "dev".to_owned(),
        domain: backend.uri(),
        cid_current_secret_key_version: Some(1),
    }])
    .await;

    let cid = server
        .state()
        .codec
        .issue(&server.state().ids)
        .unwrap()
        .to_string();

    let unknown_site = post_json(
        addr,
        "/register-cid",
        &json!({"cid": cid, "manageSiteId": "ghost", "clientType": "C_WEB", "clientFlag": "w"}),
    )
    .await;
    assert_eq!(unknown_site["errCode"], "DOMAIN_NOT_FOUND");

    let rejected = post_json(
        addr,
        "/register-cid",
        &json!({"cid": cid, "manageSiteId": "s1", "clientType": "C_WEB", "clientFlag": "w"}),
    )
    .await;
    assert_eq!(rejected["success"], false);
    assert_eq!(rejected["errCode"], "REGISTER_CID_ERROR");

    let bad_cid = post_json(
        addr,
        "/register-cid",
        &json!({"cid": "a.1.ffff", "manageSiteId": "s1", "clientType": "C_WEB", "clientFlag": "w"}),
    )
    .await;
    assert_eq!(bad_cid["errCode"], "CID_VERIFY_ERROR");
}

#[tokio::test]
async fn status_pages_respond() {
    let (addr, _server) = boot(Vec::new()).await;

    let health: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let index: Value = reqwest::get(format!("http://{addr}/"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(index["service"], "herald");
    assert_eq!(index["connections"], 0);

    let debug: Value = reqwest::Client::new()
        .get(format!("http://{addr}/debug"))
        .header("user-agent", "probe/1.0")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(debug["userAgent"], "probe/1.0");
}
