//! Integration tests for reconciliation behavior observed through the API.
//!
//! Artifacts are deleted out-of-band (directly through the storage backend)
//! to simulate files vanishing underneath the catalog.

mod common;

use axum::http::StatusCode;
use common::{TestServer, UploadFixture};
use workshop_storage::ArtifactStore;

#[tokio::test]
async fn listing_purges_records_with_missing_files() {
    let server = TestServer::new().await;

    let (_, kept) = server
        .upload(UploadFixture::valid("Kept", "kept.zip", b"kept"))
        .await;
    let (_, doomed) = server
        .upload(UploadFixture::valid("Doomed", "doomed.zip", b"doomed"))
        .await;

    // Remove the backing file out-of-band.
    let doomed_key = doomed["file_key"].as_str().unwrap();
    server.state.storage.delete(doomed_key).await.unwrap();

    let (status, body) = server.get("/v1/addons").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["addons"][0]["id"], kept["id"]);

    // The purge is permanent: direct retrieval no longer finds the record.
    let doomed_id = doomed["id"].as_str().unwrap();
    let (status, _) = server.get(&format!("/v1/addons/{doomed_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_trims_missing_images_durably() {
    let server = TestServer::new().await;

    let fixture = UploadFixture::valid("Pack", "pack.zip", b"pack")
        .with_image("image0", "one.png", b"1")
        .with_image("image1", "two.png", b"2")
        .with_image("image2", "three.png", b"3");
    let (_, created) = server.upload(fixture).await;
    let id = created["id"].as_str().unwrap().to_string();

    let gone_key = created["images"][1]["key"].as_str().unwrap();
    server.state.storage.delete(gone_key).await.unwrap();

    let (_, body) = server.get("/v1/addons").await;
    let images = body["addons"][0]["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["key"], created["images"][0]["key"]);
    assert_eq!(images[1]["key"], created["images"][2]["key"]);

    // The trimmed list was persisted: a plain record read (which does not
    // reconcile) shows the same two images.
    let (_, record) = server.get(&format!("/v1/addons/{id}")).await;
    assert_eq!(record["images"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn stats_shrink_after_purge() {
    let server = TestServer::new().await;

    let (_, a) = server
        .upload(UploadFixture::valid("A", "a.zip", b"aaa"))
        .await;
    let (_, b) = server
        .upload(UploadFixture::valid("B", "b.zip", b"bbb"))
        .await;

    let a_id = a["id"].as_str().unwrap();
    server.post(&format!("/v1/addons/{a_id}/download")).await;

    let (_, stats) = server.get("/v1/stats").await;
    assert_eq!(stats["total_addons"], 2);

    server
        .state
        .storage
        .delete(b["file_key"].as_str().unwrap())
        .await
        .unwrap();

    let (_, stats) = server.get("/v1/stats").await;
    assert_eq!(stats["total_addons"], 1);
    assert_eq!(stats["total_downloads"], 1);
}

#[tokio::test]
async fn purged_content_can_be_reuploaded_fresh() {
    let server = TestServer::new().await;

    let (_, original) = server
        .upload(UploadFixture::valid("Original", "pack.zip", b"contents"))
        .await;
    server
        .state
        .storage
        .delete(original["file_key"].as_str().unwrap())
        .await
        .unwrap();

    // Reconcile purges the record...
    let (_, body) = server.get("/v1/addons").await;
    assert_eq!(body["total"], 0);

    // ...so the same bytes are accepted again, as a new record.
    let (status, fresh) = server
        .upload(UploadFixture::valid("Original", "pack.zip", b"contents"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(fresh["id"], original["id"]);
    assert_eq!(fresh["file_hash"], original["file_hash"]);
}
