//! End-to-end streaming workflow
//!
//! Player-like access pattern: probe with `HEAD`, read the first chunk, seek
//! near the end, abandon a transfer midway, then keep streaming.

use std::net::SocketAddr;

use futures::StreamExt;
use lectern_core::config::LecternConfig;
use lectern_core::storage::test_fixtures::{MediaTree, create_media_tree, sample_bytes};
use lectern_web::{AppState, build_router};
use reqwest::StatusCode;
use reqwest::header;

async fn spawn_server(tree: &MediaTree) -> SocketAddr {
    let mut config = LecternConfig::with_roots(&tree.library_root, &tree.upload_dir);
    config.streaming.read_chunk_size = 16 * 1024;
    let app = build_router(AppState::new(config).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    address
}

#[tokio::test]
async fn test_player_seek_workflow() {
    let tree = create_media_tree();
    let large = sample_bytes(4 * 1024 * 1024);
    std::fs::write(tree.library_root.join("a/lecture.mp4"), &large).unwrap();
    let address = spawn_server(&tree).await;
    let url = format!("http://{address}/library/a/lecture.mp4");
    let client = reqwest::Client::new();

    let probe = client.head(&url).send().await.unwrap();
    assert_eq!(probe.status(), StatusCode::OK);
    assert_eq!(probe.headers()[header::ACCEPT_RANGES], "bytes");
    assert_eq!(
        probe.headers()[header::CONTENT_LENGTH],
        large.len().to_string().as_str()
    );

    let first = client
        .get(&url)
        .header(header::RANGE, "bytes=0-65535")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(first.bytes().await.unwrap(), &large[..65536]);

    let tail_start = large.len() - 1000;
    let seek = client
        .get(&url)
        .header(header::RANGE, format!("bytes={tail_start}-"))
        .send()
        .await
        .unwrap();
    assert_eq!(seek.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        seek.headers()[header::CONTENT_RANGE],
        format!("bytes {tail_start}-{}/{}", large.len() - 1, large.len()).as_str()
    );
    assert_eq!(seek.bytes().await.unwrap(), &large[tail_start..]);
}

#[tokio::test]
async fn test_abandoned_transfer_does_not_affect_server() {
    let tree = create_media_tree();
    let large = sample_bytes(8 * 1024 * 1024);
    std::fs::write(tree.library_root.join("a/long.mp4"), &large).unwrap();
    let address = spawn_server(&tree).await;
    let url = format!("http://{address}/library/a/long.mp4");

    {
        let client = reqwest::Client::new();
        let response = client.get(&url).send().await.unwrap();
        let mut body = response.bytes_stream();
        let chunk = body.next().await.unwrap().unwrap();
        assert!(!chunk.is_empty());
        // Dropping the stream and client closes the connection mid-body.
    }

    let response = reqwest::Client::new()
        .get(&url)
        .header(header::RANGE, "bytes=100-199")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.bytes().await.unwrap(), &large[100..200]);
}

#[tokio::test]
async fn test_errors_over_the_wire() {
    let tree = create_media_tree();
    let address = spawn_server(&tree).await;
    let client = reqwest::Client::new();

    let unsatisfiable = client
        .get(format!("http://{address}/stream/v.mp4"))
        .header(header::RANGE, "bytes=5000-")
        .send()
        .await
        .unwrap();
    assert_eq!(unsatisfiable.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(unsatisfiable.headers()[header::CONTENT_RANGE], "bytes */1000");

    let missing = client
        .get(format!("http://{address}/stream/nope.mp4"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(missing.bytes().await.unwrap().is_empty());
}
