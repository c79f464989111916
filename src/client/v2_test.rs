use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use warp::Filter;

use super::*;

const VERSION_BODY: &str = r#"{"etcdserver":"3.6.0","etcdcluster":"3.6.0"}"#;

fn serve_mock_cluster(store: Arc<DashMap<String, String>>) -> SocketAddr {
    let version = warp::get()
        .and(warp::path("version"))
        .and(warp::path::end())
        .map(|| VERSION_BODY);

    let members = warp::get().and(warp::path!("v2" / "members")).map(|| {
        warp::reply::json(&serde_json::json!({
            "members": [
                {"id": "8e9e05c52164694d", "name": "m0", "peerURLs": ["http://127.0.0.1:2380"], "clientURLs": ["http://127.0.0.1:2379"]},
                {"id": "91bc3c398fb3c146", "name": "m1", "peerURLs": ["http://127.0.0.1:2381"], "clientURLs": []}
            ]
        }))
    });

    let set = warp::put()
        .and(warp::path!("v2" / "keys" / String))
        .and(warp::body::form())
        .map(move |key: String, form: HashMap<String, String>| {
            if let Some(value) = form.get("value") {
                store.insert(key, value.clone());
            }
            warp::reply::with_status("", warp::http::StatusCode::CREATED)
        });

    let (addr, server) = warp::serve(version.or(members).or(set)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

async fn client_for(endpoints: Vec<String>) -> V2Client {
    V2Client::new(&endpoints, None, &ClientConfig::default())
        .await
        .expect("client should build")
}

#[tokio::test]
async fn test_version_returns_raw_body() {
    let addr = serve_mock_cluster(Arc::new(DashMap::new()));
    let client = client_for(vec![format!("http://{addr}")]).await;

    let body = client.version().await.unwrap();

    assert!(body.contains(r#""etcdcluster":"3.6.0"#));
}

#[tokio::test]
async fn test_members_decodes_member_records() {
    let addr = serve_mock_cluster(Arc::new(DashMap::new()));
    let client = client_for(vec![addr.to_string()]).await;

    let members = client.members().await.unwrap();

    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "m0");
    assert_eq!(members[0].client_urls, vec!["http://127.0.0.1:2379".to_string()]);
    assert!(members[1].client_urls.is_empty());
}

#[tokio::test]
async fn test_set_stores_value() {
    let store = Arc::new(DashMap::new());
    let addr = serve_mock_cluster(store.clone());
    let client = client_for(vec![format!("http://{addr}")]).await;

    client.set("foo", "bar").await.unwrap();

    assert_eq!(store.get("foo").map(|v| v.clone()), Some("bar".to_string()));
}

#[tokio::test]
async fn test_requests_fail_over_to_next_endpoint() {
    let addr = serve_mock_cluster(Arc::new(DashMap::new()));
    let client = client_for(vec!["http://127.0.0.1:1".to_string(), format!("http://{addr}")]).await;

    assert!(client.version().await.is_ok());
}

#[tokio::test]
async fn test_unknown_path_is_an_http_error() {
    let addr = serve_mock_cluster(Arc::new(DashMap::new()));
    let client = client_for(vec![format!("http://{addr}")]).await;

    assert!(client.get_text("/missing").await.is_err());
}
