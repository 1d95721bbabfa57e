//! Runs the whole pipeline in one process on the in-memory bus.
//!
//! Usage:
//!
//! ```text
//! lexbus-local [user-id]
//! ```
//!
//! Every line read from standard input is sent as a chat message of the
//! given user (default `local`). A line of the form
//! `/upload <object-id> <text>` stores `<text>` as an uploaded document and
//! announces it to the parser. Replies are logged as they are delivered.
//! Configuration comes from the environment (see `lexbus::config`).

use lexbus::agent::{
    adapters::{
        extractor::Utf8TextExtractor, language_model::EchoLanguageModel,
        object_store::InMemoryObjectStore, sleeper::TokioSleeper,
    },
    ports::ObjectRef,
};
use lexbus::bus::adapters::memory::InMemoryBus;
use lexbus::config::RuntimeConfig;
use lexbus::delivery::{
    adapters::{channel::ChannelConnection, memory::InMemoryChatHistory},
    domain::UploadNotice,
};
use lexbus::envelope::{SessionId, UserId};
use lexbus::pipeline::{Pipeline, PipelinePorts};
use lexbus::session::adapters::memory::InMemoryKeyValueStore;
use lexbus::telemetry;
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

const UPLOAD_BUCKET: &str = "local-uploads";

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    if !telemetry::init_tracing() {
        tracing::debug!("tracing subscriber already installed");
    }
    let config = RuntimeConfig::from_env()?;
    let user_id = UserId::new(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "local".to_owned()),
    );
    let session_id = SessionId::new(format!("{user_id}-session"));

    let clock = Arc::new(DefaultClock);
    let bus = InMemoryBus::with_partitions(config.bus.partitions);
    let objects = Arc::new(InMemoryObjectStore::new());
    let ports = PipelinePorts {
        model: Arc::new(EchoLanguageModel),
        objects: objects.clone(),
        extractor: Arc::new(Utf8TextExtractor),
        sleeper: Arc::new(TokioSleeper),
        store: Arc::new(InMemoryKeyValueStore::new(Arc::clone(&clock))),
        history: Arc::new(InMemoryChatHistory::new()),
    };
    let pipeline = Pipeline::spawn(&config, &bus, ports, clock)?;

    let (connection, mut deliveries) = ChannelConnection::open(config.delivery.channel_capacity);
    pipeline
        .registry()
        .register(&user_id, Arc::new(connection))
        .await;
    let printer = tokio::spawn(async move {
        while let Some(message) = deliveries.recv().await {
            tracing::info!(
                event = message.envelope().event(),
                correlation_id = %message.envelope().correlation_id(),
                reply = message.reply().unwrap_or_default(),
                "delivered"
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let outcome = if let Some(upload) = input.strip_prefix("/upload ") {
            let (object_id, text) = upload.split_once(' ').unwrap_or((upload, ""));
            objects.insert(
                ObjectRef::new(UPLOAD_BUCKET, object_id),
                text.as_bytes().to_vec(),
            )?;
            pipeline
                .gateway()
                .notify_upload(
                    Some(user_id.clone()),
                    Some(session_id.clone()),
                    &UploadNotice::new(UPLOAD_BUCKET, object_id),
                )
                .await
        } else {
            pipeline
                .gateway()
                .handle_inbound(
                    &user_id,
                    &json!({ "message": { "text": input, "session_id": session_id.as_str() } }),
                )
                .await
        };
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "input rejected");
        }
    }

    pipeline.registry().unregister(&user_id, None).await;
    pipeline.shutdown().await?;
    printer.abort();
    Ok(())
}
