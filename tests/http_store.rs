use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::post,
};
use bytes::Bytes;
use image_uplink::{
    AssetStore, HttpAssetStore, SignatureService, StoreConfig, StoreError, UploadError,
    UploadOptions, UploadRequest, Uploader, client::HttpClient,
};
use serde_json::{Value, json};

/// What the fake provider saw for one request.
#[derive(Debug, Default, Clone)]
struct Received {
    cloud: String,
    resource_type: String,
    fields: HashMap<String, String>,
    file_len: usize,
    file_name: Option<String>,
    file_type: Option<String>,
}

#[derive(Clone)]
struct Provider {
    status: StatusCode,
    body: Value,
    delay: Duration,
    received: Arc<Mutex<Vec<Received>>>,
}

async fn upload(
    State(provider): State<Provider>,
    Path((cloud, resource_type)): Path<(String, String)>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut received = Received {
        cloud,
        resource_type,
        ..Default::default()
    };
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            received.file_name = field.file_name().map(String::from);
            received.file_type = field.content_type().map(String::from);
            received.file_len = field.bytes().await.unwrap().len();
        } else {
            received.fields.insert(name, field.text().await.unwrap());
        }
    }
    provider.received.lock().unwrap().push(received);
    if !provider.delay.is_zero() {
        tokio::time::sleep(provider.delay).await;
    }
    (provider.status, Json(provider.body.clone()))
}

/// Start a fake provider on a random port, returning its base url.
async fn spawn_provider(status: StatusCode, body: Value) -> (String, Arc<Mutex<Vec<Received>>>) {
    spawn_delayed_provider(status, body, Duration::ZERO).await
}

async fn spawn_delayed_provider(
    status: StatusCode,
    body: Value,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<Received>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let provider = Provider {
        status,
        body,
        delay,
        received: Arc::clone(&received),
    };
    let app = Router::new()
        .route("/v1_1/{cloud}/{resource_type}/upload", post(upload))
        .with_state(provider);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

fn config(endpoint: &str) -> StoreConfig {
    StoreConfig::new()
        .endpoint(endpoint)
        .cloud_name("demo")
        .unwrap()
        .api_key("123456")
        .unwrap()
        .api_secret("abcd")
        .unwrap()
        .build()
}

fn store(endpoint: &str) -> HttpAssetStore {
    HttpAssetStore::from_config(config(endpoint)).unwrap()
}

fn photo() -> UploadRequest {
    UploadRequest::new()
        .bytes(Bytes::from(vec![0xFF; 10 * 1024]))
        .file_name(Some("photo.JPG".into()))
        .content_type(Some("image/jpeg".into()))
        .build()
}

#[tokio::test]
async fn signed_folder_upload() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (endpoint, received) = spawn_provider(
        StatusCode::OK,
        json!({ "secure_url": "https://res.example.com/avatars/img.jpg", "bytes": 10240 }),
    )
    .await;

    let uploader = Uploader::new(store(&endpoint));
    let result = uploader.upload(photo(), "avatars".into()).await.unwrap();
    assert_eq!(result.secure_url, "https://res.example.com/avatars/img.jpg");

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let req = &received[0];
    assert_eq!(req.cloud, "demo");
    assert_eq!(req.resource_type, "auto");
    assert_eq!(req.file_len, 10 * 1024);
    assert_eq!(req.file_name.as_deref(), Some("photo.JPG"));
    assert_eq!(req.file_type.as_deref(), Some("image/jpeg"));
    assert_eq!(req.fields["folder"], "avatars");
    assert_eq!(req.fields["overwrite"], "false");
    assert_eq!(req.fields["use_filename"], "false");
    assert_eq!(req.fields["unique_filename"], "false");
    assert_eq!(req.fields["quality"], "auto:good");
    assert_eq!(req.fields["api_key"], "123456");
    assert!(req.fields["public_id"].starts_with("img_"));
    assert!(req.fields["public_id"].ends_with(".jpg"));

    let signed = [
        "folder",
        "public_id",
        "use_filename",
        "unique_filename",
        "overwrite",
        "quality",
        "timestamp",
    ]
    .into_iter()
    .map(|name| (name, req.fields[name].clone()))
    .collect::<Vec<_>>();
    assert_eq!(
        req.fields["signature"],
        SignatureService.signature(&signed, "abcd")
    );
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let (endpoint, received) = spawn_provider(
        StatusCode::BAD_REQUEST,
        json!({ "error": { "message": "Resource already exists" } }),
    )
    .await;

    let err = Uploader::new(store(&endpoint))
        .upload(photo(), "avatars".into())
        .await
        .unwrap_err();
    match err {
        UploadError::Store(StoreError::Provider(message)) => {
            assert_eq!(message, "Resource already exists")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unexpected_error_body_reports_status() {
    let (endpoint, _) = spawn_provider(StatusCode::UNAUTHORIZED, json!("nope")).await;
    let options = UploadOptions::new().build();
    let err = store(&endpoint)
        .upload(Bytes::from_static(b"gif89a"), &options)
        .await
        .unwrap_err();
    match err {
        StoreError::Provider(message) => assert!(message.contains("401"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_object_success_body_is_malformed() {
    let (endpoint, _) = spawn_provider(StatusCode::OK, json!(["secure_url"])).await;
    let err = Uploader::new(store(&endpoint))
        .upload(photo(), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UploadError::Store(StoreError::UploadResponseMalformed)
    ));
}

#[tokio::test]
async fn unreachable_provider_is_a_store_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = Uploader::new(store(&endpoint))
        .upload(photo(), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Store(StoreError::Provider(_))));
}

#[tokio::test]
async fn slow_provider_hits_client_timeout() {
    let (endpoint, _) = spawn_delayed_provider(
        StatusCode::OK,
        json!({ "secure_url": "https://res.example.com/late.jpg" }),
        Duration::from_secs(10),
    )
    .await;
    let client = HttpClient::builder()
        .with_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let store = HttpAssetStore::new(config(&endpoint), client);

    let err = Uploader::new(store)
        .upload(photo(), "avatars".into())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Store(StoreError::Timeout)));
}
