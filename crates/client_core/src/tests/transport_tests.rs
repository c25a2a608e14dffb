use super::*;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use shared::domain::Budget;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    json_tx: Arc<Mutex<Option<oneshot::Sender<(HeaderMap, Value)>>>>,
    form_tx: Arc<Mutex<Option<oneshot::Sender<SubmissionPayload>>>>,
}

async fn handle_json(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let rejected = body["email"] == "blocked@example.com";
    if let Some(tx) = state.json_tx.lock().await.take() {
        let _ = tx.send((headers, body));
    }
    if rejected {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": [{ "field": "email", "message": "Invalid email domain" }] })),
        )
    } else {
        (StatusCode::OK, Json(json!({ "ok": true, "next": "/thanks" })))
    }
}

async fn handle_form(
    State(state): State<ServerState>,
    Form(payload): Form<SubmissionPayload>,
) -> Redirect {
    if let Some(tx) = state.form_tx.lock().await.take() {
        let _ = tx.send(payload);
    }
    Redirect::to("/thanks")
}

async fn handle_thanks() -> &'static str {
    "thanks"
}

struct FormServer {
    base_url: String,
    json_rx: oneshot::Receiver<(HeaderMap, Value)>,
    form_rx: oneshot::Receiver<SubmissionPayload>,
}

async fn spawn_form_server() -> Result<FormServer> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (json_tx, json_rx) = oneshot::channel();
    let (form_tx, form_rx) = oneshot::channel();
    let state = ServerState {
        json_tx: Arc::new(Mutex::new(Some(json_tx))),
        form_tx: Arc::new(Mutex::new(Some(form_tx))),
    };
    let app = Router::new()
        .route("/f/json", post(handle_json))
        .route("/f/form", post(handle_form))
        .route("/thanks", get(handle_thanks))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(FormServer {
        base_url: format!("http://{addr}"),
        json_rx,
        form_rx,
    })
}

fn payload(email: &str) -> SubmissionPayload {
    SubmissionPayload {
        name: "Ada".to_string(),
        email: email.to_string(),
        budget: Budget::From5kTo10k,
        message: "We need a new website built soon.".to_string(),
        source: "tests".to_string(),
    }
}

#[tokio::test]
async fn json_post_carries_payload_and_negotiates_json() {
    let server = spawn_form_server().await.expect("spawn server");
    let transport = HttpTransport::new().expect("client");
    let endpoint = Url::parse(&format!("{}/f/json", server.base_url)).expect("url");

    let reply = transport
        .send_json(&endpoint, &payload("ada@example.com"))
        .await
        .expect("reply");
    assert!(reply.is_success());
    assert!(reply.body.contains("\"ok\":true"));

    let (headers, body) = server.json_rx.await.expect("request");
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["accept"], "application/json");
    assert_eq!(
        body,
        json!({
            "name": "Ada",
            "email": "ada@example.com",
            "budget": "5k-10k",
            "message": "We need a new website built soon.",
            "source": "tests",
        })
    );
}

#[tokio::test]
async fn rejection_status_is_a_reply_not_an_error() {
    let server = spawn_form_server().await.expect("spawn server");
    let transport = HttpTransport::new().expect("client");
    let endpoint = Url::parse(&format!("{}/f/json", server.base_url)).expect("url");

    let reply = transport
        .send_json(&endpoint, &payload("blocked@example.com"))
        .await
        .expect("reply");
    assert_eq!(reply.status, 422);
    assert!(reply.body.contains("Invalid email domain"));
}

#[tokio::test]
async fn form_post_follows_the_server_redirect() {
    let server = spawn_form_server().await.expect("spawn server");
    let transport = HttpTransport::new().expect("client");
    let endpoint = Url::parse(&format!("{}/f/form", server.base_url)).expect("url");

    let location = transport
        .post_form(&endpoint, &payload("ada@example.com"))
        .await
        .expect("location");
    assert_eq!(location.path(), "/thanks");

    let received = server.form_rx.await.expect("form");
    assert_eq!(received, payload("ada@example.com"));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpTransport::new().expect("client");
    let endpoint = Url::parse(&format!("http://{addr}/f/json")).expect("url");
    let err = transport
        .send_json(&endpoint, &payload("ada@example.com"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, TransportError::Request(_)));
}

#[tokio::test]
async fn missing_transports_report_unavailable() {
    let endpoint = Url::parse("https://formspree.io/f/abc").expect("url");
    assert!(matches!(
        MissingPrimaryTransport
            .send_json(&endpoint, &payload("a@b.com"))
            .await,
        Err(TransportError::Unavailable(_))
    ));
    assert!(matches!(
        MissingFallbackTransport
            .post_form(&endpoint, &payload("a@b.com"))
            .await,
        Err(TransportError::Unavailable(_))
    ));
}
