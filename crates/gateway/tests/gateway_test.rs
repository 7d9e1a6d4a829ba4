use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use oneul_core::mocks::{MockAudioSource, MockClassifier, MockMediaStore, MockShoutDetector};
use oneul_core::traits::{AudioSource, EmotionClassifier, MediaStore, ShoutDetector};
use oneul_core::types::{BaseEmotion, EmotionResult, ExtendedEmotion, ShoutDetection};
use oneul_core::Error;
use oneul_gateway::{AppState, AudioProcessor, GatewayConfig, GatewayServer, VisionProcessor};
use oneul_store::{InMemoryMediaStore, KeyLayout};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "oneul-test-boundary";
const PUBLIC_BASE: &str = "https://media.example.com";

fn joyful() -> EmotionResult {
    EmotionResult {
        base_emotion: BaseEmotion::Joy,
        extended_emotion: ExtendedEmotion::Satisfaction,
        warning_signs: vec![],
        confidence: 82,
        summary: "밝게 웃고 있는 모습입니다.".to_string(),
    }
}

struct Harness {
    classifier: Arc<dyn EmotionClassifier>,
    source: Arc<dyn AudioSource>,
    detector: Arc<dyn ShoutDetector>,
    store: Arc<dyn MediaStore>,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            classifier: Arc::new(MockClassifier::returning(joyful())),
            source: Arc::new(MockAudioSource::new(vec![0u8; 64])),
            detector: Arc::new(MockShoutDetector::returning(ShoutDetection::absent())),
            store: Arc::new(MockMediaStore::new(PUBLIC_BASE)),
        }
    }
}

impl Harness {
    fn app(self) -> Router {
        self.app_with(GatewayConfig::default())
    }

    fn app_with(self, config: GatewayConfig) -> Router {
        let state = AppState {
            vision: VisionProcessor::new(self.classifier, self.store.clone()),
            audio: AudioProcessor::new(self.source, self.detector, self.store),
        };
        GatewayServer::new(config, state).build_router()
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(uri: &str, fields: &[(&str, &str)], file: (&str, &str, &str, &[u8])) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    let (field, filename, content_type, data) = file;
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn png_bytes() -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(&[0u8; 32]);
    data
}

#[tokio::test]
async fn test_root_and_health() {
    let (status, json) = send(
        Harness::default().app(),
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"service": "Oneuleun AI API", "status": "running"}));

    let (status, json) = send(
        Harness::default().app(),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_context_classifies_photo_url() {
    let classifier = Arc::new(MockClassifier::returning(joyful()));
    let app = Harness {
        classifier: classifier.clone(),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json(
            "/context/",
            json!({"session_id": "s1", "user_id": "u1", "photo_url": "https://x/a.jpg"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["session_id"], "s1");
    assert_eq!(json["user_id"], "u1");
    assert_eq!(json["photo_url"], "https://x/a.jpg");
    assert_eq!(json["analysis"]["base_emotion"], "기쁨");
    assert_eq!(json["analysis"]["extended_emotion"], "만족");
    assert_eq!(json["analysis"]["warning_signs"], json!([]));
    assert_eq!(json["analysis"]["confidence"], 82);
    assert_eq!(json["categories"]["base_emotions"].as_array().unwrap().len(), 7);
    assert_eq!(json["categories"]["extended_emotions"].as_array().unwrap().len(), 8);
    assert_eq!(json["categories"]["warning_signs"].as_array().unwrap().len(), 6);
    assert!(json.get("object_key").is_none());

    assert_eq!(classifier.seen(), vec!["https://x/a.jpg".to_string()]);
}

#[tokio::test]
async fn test_context_without_trailing_slash() {
    let (status, _) = send(
        Harness::default().app(),
        post_json(
            "/context",
            json!({"session_id": "s1", "user_id": "u1", "photo_url": "https://x/a.jpg"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_context_missing_photo_url_is_rejected() {
    let classifier = Arc::new(MockClassifier::returning(joyful()));
    let app = Harness {
        classifier: classifier.clone(),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json("/context/", json!({"session_id": "s1", "user_id": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_context_malformed_json_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/context/")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"session_id\": "))
        .unwrap();

    let (status, json) = send(Harness::default().app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_context_invalid_provider_label_is_bad_gateway() {
    let app = Harness {
        classifier: Arc::new(MockClassifier::failing(|| {
            Error::upstream_format("base_emotion '행복' is not a recognized label")
        })),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json(
            "/context/",
            json!({"session_id": "s1", "user_id": "u1", "photo_url": "https://x/a.jpg"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "UPSTREAM_FORMAT_ERROR");
}

#[tokio::test]
async fn test_context_upload_stores_under_session_prefix() {
    let store = Arc::new(InMemoryMediaStore::new(
        KeyLayout::new("oneuld", None),
        PUBLIC_BASE,
    ));
    let classifier = Arc::new(MockClassifier::returning(joyful()));
    let app = Harness {
        classifier: classifier.clone(),
        store: store.clone(),
        ..Default::default()
    }
    .app();

    let png = png_bytes();
    let (status, json) = send(
        app,
        post_multipart(
            "/context/upload",
            &[("session_id", "s2"), ("user_id", "u2")],
            ("image_file", "face.png", "image/png", png.as_slice()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let key = json["object_key"].as_str().unwrap();
    assert!(key.starts_with("oneuld/image/s2/"));
    assert!(key.ends_with(".png"));
    assert_eq!(json["photo_url"], format!("{}/{}", PUBLIC_BASE, key));

    let stored = store.get(key).unwrap();
    assert_eq!(stored.data.as_ref(), png.as_slice());
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(classifier.seen(), vec![format!("{}/{}", PUBLIC_BASE, key)]);
}

#[tokio::test]
async fn test_context_upload_rejects_non_image() {
    let store = Arc::new(MockMediaStore::new(PUBLIC_BASE));
    let app = Harness {
        store: store.clone(),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_multipart(
            "/context/upload",
            &[("session_id", "s2"), ("user_id", "u2")],
            ("image_file", "notes.txt", "text/plain", &b"hello there"[..]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_context_upload_requires_file() {
    let mut body = String::new();
    for (name, value) in [("session_id", "s2"), ("user_id", "u2")] {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    let request = Request::builder()
        .method("POST")
        .uri("/context/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, json) = send(Harness::default().app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("image_file"));
}

#[tokio::test]
async fn test_analyze_without_shout_returns_null_fields() {
    let source = Arc::new(MockAudioSource::new(vec![1u8; 128]));
    let app = Harness {
        source: source.clone(),
        ..Default::default()
    }
    .app();

    let conversation = "{\"오늘 기분은 어떠세요?\": \"괜찮아요\"}";
    let (status, json) = send(
        app,
        post_json(
            "/analyze/",
            json!({
                "session_id": "s1",
                "user_id": "u1",
                "conversation": conversation,
                "audio_url": "https://x/clip.wav"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["conversation"], conversation);
    assert_eq!(json["audio_url"], "https://x/clip.wav");
    assert_eq!(
        json["shout_detection"],
        json!({
            "present": false,
            "start_ms": null,
            "end_ms": null,
            "peak_dbfs": null,
            "confidence": null
        })
    );
    assert_eq!(source.fetched(), vec!["https://x/clip.wav".to_string()]);
}

#[tokio::test]
async fn test_analyze_reports_detected_shout() {
    let app = Harness {
        detector: Arc::new(MockShoutDetector::returning(ShoutDetection::detected(
            1200, 2000, -3.5, 0.6,
        ))),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json(
            "/analyze",
            json!({
                "session_id": "s1",
                "user_id": "u1",
                "conversation": "{}",
                "audio_url": "https://x/clip.wav"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["shout_detection"]["present"], true);
    assert_eq!(json["shout_detection"]["start_ms"], 1200);
    assert_eq!(json["shout_detection"]["end_ms"], 2000);
    assert_eq!(json["shout_detection"]["peak_dbfs"], -3.5);
    assert_eq!(json["shout_detection"]["confidence"], 0.6);
}

#[tokio::test]
async fn test_analyze_rejects_invalid_conversation() {
    let source = Arc::new(MockAudioSource::new(vec![1u8; 16]));
    let app = Harness {
        source: source.clone(),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json(
            "/analyze/",
            json!({
                "session_id": "s1",
                "user_id": "u1",
                "conversation": "{not json",
                "audio_url": "https://x/clip.wav"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(source.fetched().is_empty());
}

#[tokio::test]
async fn test_analyze_undecodable_audio_degrades() {
    let app = Harness {
        detector: Arc::new(MockShoutDetector::failing(|| {
            Error::detection("unsupported audio container")
        })),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json(
            "/analyze/",
            json!({
                "session_id": "s1",
                "user_id": "u1",
                "conversation": "{}",
                "audio_url": "https://x/clip.bin"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "DETECTION_ERROR");
    assert_eq!(json["shout_detection"]["present"], false);
    assert!(json["shout_detection"]["start_ms"].is_null());
    assert!(json["error"].as_str().unwrap().contains("unsupported"));
}

#[tokio::test]
async fn test_analyze_fetch_timeout_is_gateway_timeout() {
    let detector = Arc::new(MockShoutDetector::returning(ShoutDetection::absent()));
    let app = Harness {
        source: Arc::new(MockAudioSource::failing(|| {
            Error::upstream_timeout("audio download timed out")
        })),
        detector: detector.clone(),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_json(
            "/analyze/",
            json!({
                "session_id": "s1",
                "user_id": "u1",
                "conversation": "{}",
                "audio_url": "https://x/slow.wav"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "UPSTREAM_TIMEOUT");
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_analyze_upload_stores_and_detects() {
    let store = Arc::new(InMemoryMediaStore::new(
        KeyLayout::new("oneuld", None),
        PUBLIC_BASE,
    ));
    let detector = Arc::new(MockShoutDetector::returning(ShoutDetection::absent()));
    let app = Harness {
        store: store.clone(),
        detector: detector.clone(),
        ..Default::default()
    }
    .app();

    let clip = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
    let conversation = "{\"q\": \"a\"}";
    let (status, json) = send(
        app,
        post_multipart(
            "/analyze/upload",
            &[
                ("session_id", "s3"),
                ("user_id", "u3"),
                ("conversation", conversation),
            ],
            ("audio_file", "clip.wav", "audio/wav", clip.as_slice()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["conversation"], conversation);
    let key = json["object_key"].as_str().unwrap();
    assert!(key.starts_with("oneuld/audio/s3/"));
    assert_eq!(json["audio_url"], format!("{}/{}", PUBLIC_BASE, key));
    assert_eq!(store.len(), 1);
    assert_eq!(detector.calls(), vec![clip.len()]);
}

#[tokio::test]
async fn test_analyze_upload_storage_failure_is_bad_gateway() {
    let detector = Arc::new(MockShoutDetector::returning(ShoutDetection::absent()));
    let app = Harness {
        store: Arc::new(MockMediaStore::failing(|| Error::storage("access denied"))),
        detector: detector.clone(),
        ..Default::default()
    }
    .app();

    let (status, json) = send(
        app,
        post_multipart(
            "/analyze/upload",
            &[
                ("session_id", "s3"),
                ("user_id", "u3"),
                ("conversation", "{}"),
            ],
            ("audio_file", "clip.wav", "audio/wav", &b"RIFF0000WAVE"[..]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "STORAGE_ERROR");
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_identifiers_are_echoed_as_sent() {
    let (status, json) = send(
        Harness::default().app(),
        post_json(
            "/context/",
            json!({"session_id": " s1 ", "user_id": "u1\t", "photo_url": "https://x/a.jpg"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], " s1 ");
    assert_eq!(json["user_id"], "u1\t");
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let store = Arc::new(MockMediaStore::new(PUBLIC_BASE));
    let app = Harness {
        store: store.clone(),
        ..Default::default()
    }
    .app_with(GatewayConfig {
        max_upload_bytes: 1024,
        ..GatewayConfig::default()
    });

    let mut png = png_bytes();
    png.extend_from_slice(&[0u8; 8192]);
    let (status, json) = send(
        app,
        post_multipart(
            "/context/upload",
            &[("session_id", "s2"), ("user_id", "u2")],
            ("image_file", "big.png", "image/png", png.as_slice()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert!(store.uploads().is_empty());
}
