//! HTTP schema registry integration tests.
//!
//! These tests run a small axum server that speaks the subset of the registry
//! REST API the client uses, and drive the codec against it over real HTTP.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use schema_codec::{
    CodecError, HttpRegistryConfig, HttpSchemaRegistry, RegistryError, SchemaCodec,
    SchemaRegistry, SchemaType,
};
use serde_json::{json, Value};
use stats_types::Event;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct StubState {
    /// (subject, schema text); id is index + 1.
    schemas: Vec<(String, String)>,
}

type Shared = Arc<Mutex<StubState>>;

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error_code": 40401, "message": message})),
    )
        .into_response()
}

async fn list_subjects(State(state): State<Shared>) -> Response {
    let state = state.lock().unwrap();
    let subjects: Vec<&String> = state.schemas.iter().map(|(s, _)| s).collect();
    Json(json!(subjects)).into_response()
}

async fn latest(State(state): State<Shared>, Path(subject): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.schemas.iter().position(|(s, _)| s == &subject) {
        Some(index) => Json(json!({
            "subject": subject,
            "version": 1,
            "id": index + 1,
            "schemaType": "JSON",
            "schema": state.schemas[index].1,
        }))
        .into_response(),
        None => not_found(&format!("Subject '{subject}' not found.")),
    }
}

async fn register(
    State(state): State<Shared>,
    Path(subject): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    assert_eq!(body["schemaType"], "JSON");
    let schema = body["schema"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    state.schemas.push((subject, schema));
    Json(json!({"id": state.schemas.len()})).into_response()
}

async fn schema_by_id(State(state): State<Shared>, Path(id): Path<usize>) -> Response {
    let state = state.lock().unwrap();
    match id.checked_sub(1).and_then(|i| state.schemas.get(i)) {
        Some((_, schema)) => {
            Json(json!({"schemaType": "JSON", "schema": schema})).into_response()
        }
        None => not_found("Schema not found"),
    }
}

async fn subjects_for_id(State(state): State<Shared>, Path(id): Path<usize>) -> Response {
    let state = state.lock().unwrap();
    match id.checked_sub(1).and_then(|i| state.schemas.get(i)) {
        Some((subject, _)) => Json(json!([subject])).into_response(),
        None => not_found("Schema not found"),
    }
}

async fn start_stub_registry() -> anyhow::Result<(String, Shared)> {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/subjects", get(list_subjects))
        .route("/subjects/:subject/versions/latest", get(latest))
        .route("/subjects/:subject/versions", axum::routing::post(register))
        .route("/schemas/ids/:id", get(schema_by_id))
        .route("/schemas/ids/:id/subjects", get(subjects_for_id))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Address without scheme, the way it is configured in deployments
    Ok((addr.to_string(), state))
}

#[tokio::test]
async fn test_codec_round_trip_over_http() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();

    let (addr, state) = start_stub_registry().await.unwrap();
    let registry = HttpSchemaRegistry::new(&HttpRegistryConfig::new(addr)).unwrap();
    let codec = SchemaCodec::new(Arc::new(registry));

    codec.preflight().await.unwrap();

    let event = Event::new("Dwight", "Ford", "Black");
    let bytes = codec.serialize("cars", &event).await.unwrap().to_bytes();
    assert_eq!(&bytes[..5], &[0, 0, 0, 0, 1]);

    let decoded = codec.deserialize("cars", &bytes).await.unwrap();
    assert_eq!(decoded, event);

    assert_eq!(state.lock().unwrap().schemas.len(), 1);
}

#[tokio::test]
async fn test_not_found_maps_to_registry_error() {
    let (addr, _) = start_stub_registry().await.unwrap();
    let registry = HttpSchemaRegistry::new(&HttpRegistryConfig::new(addr)).unwrap();

    match registry.latest("missing").await {
        Err(RegistryError::NotFound(message)) => {
            assert_eq!(message, "Subject 'missing' not found.")
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(matches!(
        registry.schema_by_id(42).await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_register_sends_json_schema_type() {
    let (addr, state) = start_stub_registry().await.unwrap();
    let registry = HttpSchemaRegistry::new(&HttpRegistryConfig::new(addr)).unwrap();

    let id = registry
        .register("cars", SchemaType::Json, r#"{"type":"object"}"#)
        .await
        .unwrap();

    assert_eq!(id, 1);
    assert_eq!(state.lock().unwrap().schemas[0].0, "cars");
}

#[tokio::test]
async fn test_unreachable_registry() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = HttpRegistryConfig::new(format!("http://{addr}"));
    config.timeout = Duration::from_secs(2);
    let codec = SchemaCodec::new(Arc::new(HttpSchemaRegistry::new(&config).unwrap()));

    assert!(matches!(
        codec.preflight().await,
        Err(CodecError::SchemaUnavailable {
            source: RegistryError::Unreachable(_),
            ..
        })
    ));
}
