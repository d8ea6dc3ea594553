use super::*;
use crate::session::Outcome;
use crate::streaming::ScriptedChunkStream;
use axum::{response::IntoResponse, routing::post, Router};
use bytes::Bytes;
use futures::stream;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the mock panel server answers to POST /api/chat
#[derive(Clone)]
enum MockReply {
    /// SSE response streaming the given chunks
    Sse(Vec<Vec<u8>>),
    /// SSE response that errors mid-body after the given chunks
    SseAbort(Vec<Vec<u8>>),
    /// Plain JSON document response
    Json(serde_json::Value),
    /// Error status with a plain body
    Status(u16, &'static str),
}

async fn create_mock_server(reply: MockReply) -> String {
    let app = Router::new().route(
        "/api/chat",
        post(move || {
            let reply = reply.clone();
            async move {
                match reply {
                    MockReply::Sse(chunks) => {
                        let body = stream::iter(
                            chunks
                                .into_iter()
                                .map(|chunk| Ok::<_, std::io::Error>(Bytes::from(chunk))),
                        );
                        axum::response::Response::builder()
                            .status(axum::http::StatusCode::OK)
                            .header("content-type", "text/event-stream")
                            .body(axum::body::Body::from_stream(body))
                            .unwrap()
                    }
                    MockReply::SseAbort(chunks) => {
                        let mut items: Vec<Result<Bytes, std::io::Error>> = chunks
                            .into_iter()
                            .map(|chunk| Ok(Bytes::from(chunk)))
                            .collect();
                        items.push(Err(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "connection reset",
                        )));
                        axum::response::Response::builder()
                            .status(axum::http::StatusCode::OK)
                            .header("content-type", "text/event-stream")
                            .body(axum::body::Body::from_stream(stream::iter(items)))
                            .unwrap()
                    }
                    MockReply::Json(value) => {
                        (axum::http::StatusCode::OK, axum::Json(value)).into_response()
                    }
                    MockReply::Status(code, body) => axum::response::Response::builder()
                        .status(axum::http::StatusCode::from_u16(code).unwrap())
                        .body(axum::body::Body::from(body))
                        .unwrap(),
                }
            }
        }),
    );

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", server_addr)
}

/// Event collector for streaming tests, optionally cancelling after a
/// number of deltas
#[derive(Clone, Default)]
struct EventCollector {
    events: Arc<Mutex<Vec<StreamEvent>>>,
    cancel_after: Option<usize>,
}

impl EventCollector {
    fn new() -> Self {
        Self::default()
    }

    fn cancelling_after(deltas: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            cancel_after: Some(deltas),
        }
    }

    fn callback(&self) -> StreamCallback {
        let events = self.events.clone();
        let cancel_after = self.cancel_after;

        Box::new(move |event: &StreamEvent| {
            let mut events = events.lock().unwrap();
            events.push(event.clone());
            if let Some(limit) = cancel_after {
                let deltas = events
                    .iter()
                    .filter(|e| matches!(e, StreamEvent::Delta(_)))
                    .count();
                if deltas >= limit {
                    return Err(anyhow::anyhow!("stop requested"));
                }
            }
            Ok(())
        })
    }

    fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    fn deltas(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StreamEvent::Delta(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

fn simple_request() -> ChatRequest {
    ChatRequest {
        messages: vec![OutgoingMessage {
            role: MessageRole::User,
            content: "¿Cómo van las ventas?".to_string(),
        }],
        mode: ChatMode::Pro,
    }
}

#[tokio::test]
async fn streams_deltas_in_order_and_completes() {
    let base_url = create_mock_server(MockReply::Sse(vec![
        b"data: {\"delta\":\"Las ventas\"}\n\n".to_vec(),
        b"data: {\"content\":\" suben un 12%\"}\n\n".to_vec(),
        b"data: [DONE]\n\n".to_vec(),
    ]))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    assert_eq!(
        collector.deltas(),
        vec!["Las ventas".to_string(), " suben un 12%".to_string()]
    );
    assert_eq!(collector.events().last(), Some(&StreamEvent::Done));
    assert_eq!(session.accumulated_text(), "Las ventas suben un 12%");
    assert!(!session.is_active());
}

#[tokio::test]
async fn done_sentinel_stops_the_stream() {
    // Frames after [DONE] must never surface, even within the same chunk.
    let base_url = create_mock_server(MockReply::Sse(vec![
        b"data: hello\n\ndata: [DONE]\n\ndata: ignored\n\n".to_vec(),
    ]))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    assert_eq!(
        collector.events(),
        vec![
            StreamEvent::Delta("hello".to_string()),
            StreamEvent::Done
        ]
    );
    assert_eq!(session.accumulated_text(), "hello");
}

#[tokio::test]
async fn stream_without_done_completes_implicitly() {
    // No [DONE], and the final line is not newline-terminated.
    let base_url = create_mock_server(MockReply::Sse(vec![
        b"data: primera\n\n".to_vec(),
        b"data: cola".to_vec(),
    ]))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    assert_eq!(
        collector.deltas(),
        vec!["primera".to_string(), "cola".to_string()]
    );
    assert_eq!(collector.events().last(), Some(&StreamEvent::Done));
}

#[tokio::test]
async fn json_response_is_a_single_delta() {
    let base_url = create_mock_server(MockReply::Json(
        json!({"data": {"content": "Respuesta completa"}}),
    ))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    assert_eq!(
        collector.events(),
        vec![
            StreamEvent::Delta("Respuesta completa".to_string()),
            StreamEvent::Done
        ]
    );
}

#[tokio::test]
async fn json_without_known_fields_shows_the_document() {
    let base_url = create_mock_server(MockReply::Json(json!({"status": "ok"}))).await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    let deltas = collector.deltas();
    assert_eq!(deltas.len(), 1);
    assert!(deltas[0].contains("\"status\""));
    assert_eq!(collector.events().last(), Some(&StreamEvent::Done));
}

#[tokio::test]
async fn error_status_becomes_an_error_event() {
    let base_url = create_mock_server(MockReply::Status(500, "boom")).await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    let events = collector.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Error(_)));
    assert!(session.accumulated_text().contains("❌ Error:"));
    assert!(!session.is_active());
}

#[tokio::test]
async fn mid_stream_failure_preserves_received_text() {
    let base_url = create_mock_server(MockReply::SseAbort(vec![
        b"data: respuesta parcial\n\n".to_vec(),
    ]))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    let events = collector.events();
    assert_eq!(events[0], StreamEvent::Delta("respuesta parcial".to_string()));
    assert!(matches!(events.last(), Some(StreamEvent::Error(_))));
    assert!(session.accumulated_text().starts_with("respuesta parcial"));
    assert!(session.accumulated_text().contains("❌ Error:"));
}

#[tokio::test]
async fn cancellation_stops_events_and_accumulation() {
    let base_url = create_mock_server(MockReply::Sse(vec![
        b"data: uno\n\ndata: dos\n\ndata: tres\n\ndata: [DONE]\n\n".to_vec(),
    ]))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::cancelling_after(1);

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    // Only the delta that triggered the stop; no Done, no further deltas.
    assert_eq!(
        collector.events(),
        vec![StreamEvent::Delta("uno".to_string())]
    );
    assert_eq!(session.accumulated_text(), "uno");
    assert!(!session.is_active());
}

#[tokio::test]
async fn rerun_resets_the_accumulator() {
    let base_url = create_mock_server(MockReply::Sse(vec![
        b"data: texto\n\ndata: [DONE]\n\n".to_vec(),
    ]))
    .await;

    let client = PanelClient::new(base_url);
    let mut session = StreamSession::new();
    let collector = EventCollector::new();

    session
        .run(&client, &simple_request(), &collector.callback())
        .await;
    session
        .run(&client, &simple_request(), &collector.callback())
        .await;

    // Two runs, same single answer each time; no carry-over between runs.
    assert_eq!(session.accumulated_text(), "texto");
}

#[tokio::test]
async fn scripted_stream_is_boundary_insensitive() {
    // The same logical stream diced into 3-byte chunks must produce the
    // same deltas the HTTP path would see.
    let raw = b"data: {\"delta\":\"Caf\xc3\xa9\"}\n\ndata: cortado\n\ndata: [DONE]\n\n";
    let chunks: Vec<Vec<u8>> = raw.chunks(3).map(|c| c.to_vec()).collect();

    let mut session = StreamSession::new();
    let collector = EventCollector::new();
    let callback = collector.callback();
    let mut stream = ScriptedChunkStream::new(chunks);

    let outcome = session.consume(&mut stream, &callback).await.unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(
        collector.deltas(),
        vec!["Café".to_string(), "cortado".to_string()]
    );
    assert_eq!(session.accumulated_text(), "Cafécortado");
}

#[tokio::test]
async fn non_streaming_fallback_extracts_text() {
    let base_url = create_mock_server(MockReply::Json(
        json!({"data": {"content": "desde el fallback"}}),
    ))
    .await;

    let client = PanelClient::new(base_url);
    let answer = client.send_chat(&simple_request()).await.unwrap();
    assert_eq!(answer, "desde el fallback");
}

#[test]
fn formatted_stream_output_yields_structured_view() {
    // End-to-end over the text pipeline: accumulate, format, extract,
    // clean, the way a renderer consumes a finished message.
    let raw = "## Ventas por zona\n\n| Zona | Total |\n|---|---|\n| Norte | 1.200,50 € |\n| Sur | 800 |\n\n```\n█████████\n```";

    let formatted = format_for_display(raw);
    let view = StructuredView::extract(&formatted);

    let table = view.table.expect("table should be recognized");
    assert_eq!(table.headers, vec!["Zona", "Total"]);
    assert_eq!(table.rows.len(), 2);

    assert_eq!(view.kpis.len(), 1);
    assert_eq!(view.kpis[0].label, "Total");
    assert_eq!(view.kpis[0].value, 2000.5);

    assert_eq!(view.metrics.len(), 2);
    assert_eq!(view.metrics[0].label, "Norte");
    assert_eq!(view.metrics[0].value, 1200.5);

    // Cleaning happens after structure extraction and removes the bar art.
    let cleaned = clean_chart_artifacts(&formatted);
    assert!(!cleaned.contains('█'));
}
