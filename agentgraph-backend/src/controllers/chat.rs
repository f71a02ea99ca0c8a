//! SSE chat endpoint.
//!
//! POST /api/chat-sse runs the configured graph against the request message
//! and streams one `data:` frame per progress event, then a final `done`
//! frame carrying the task result. A missing entry point is rejected with a
//! 500 before streaming starts. An engine error mid-run ends the stream with
//! a terminal `error` frame, since the response headers are already on the
//! wire; every frame already sent stands.

use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use actix_web::web::Bytes;
use actix_web::{web, HttpResponse, Responder};
use async_stream::stream;
use futures_util::{pin_mut, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::graph::GraphTask;
use crate::memory::{InMemoryMemory, Memory};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/chat-sse").route(web::post().to(chat_sse)));
}

fn frame(payload: serde_json::Value) -> Bytes {
    Bytes::from(format!("data: {}\n\n", payload))
}

async fn chat_sse(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> impl Responder {
    let run_id = state.run_counter.fetch_add(1, Ordering::SeqCst);
    let message = body.into_inner().message;
    log::info!("[CHAT] run {} started ({} chars)", run_id, message.len());

    // Fail fast on unusable graphs, while a plain 500 is still possible
    if let Err(e) = state.graph.entry_edges() {
        log::error!("[CHAT] run {} rejected: {}", run_id, e);
        return HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }));
    }

    // Fresh store per request: runs cannot collide on memory ids
    let memory: Arc<dyn Memory> = Arc::new(InMemoryMemory::new());
    let task = GraphTask::new(state.graph.clone(), memory);

    let sse = stream! {
        let mut failed = false;
        {
            let events = task.run_task(message, 0);
            pin_mut!(events);
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        yield Ok::<_, Infallible>(frame(json!({
                            "type": "progress",
                            "agent": event.agent,
                            "output": event.output,
                        })));
                    }
                    Err(e) => {
                        log::error!("[CHAT] run {} failed: {}", run_id, e);
                        yield Ok(frame(json!({
                            "type": "error",
                            "message": e.to_string(),
                        })));
                        failed = true;
                        break;
                    }
                }
            }
        }

        if !failed {
            let result = task
                .memory()
                .load()
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            log::info!("[CHAT] run {} completed", run_id);
            yield Ok(frame(json!({ "type": "done", "result": result })));
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(sse)
}
