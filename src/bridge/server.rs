//! Request dispatch and the stdin/stdout loops.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::effects::EffectRegistry;

use super::protocol::{BridgeRequest, OutgoingLine, RequestEnvelope};
use super::services::LineSender;

/// Answers bridge requests against an [`EffectRegistry`].
pub struct Bridge {
    registry: Arc<EffectRegistry>,
    lines: LineSender,
}

impl Bridge {
    pub fn new(registry: Arc<EffectRegistry>, lines: LineSender) -> Self {
        Self { registry, lines }
    }

    /// Answer one request.
    pub async fn handle(&self, envelope: RequestEnvelope) -> OutgoingLine {
        let RequestEnvelope { id, request } = envelope;
        let answer = match request {
            BridgeRequest::Trigger {
                effect,
                options,
                trigger,
            } => self
                .registry
                .trigger(&effect, options, &trigger)
                .await
                .map_err(|e| e.to_string())
                .and_then(|result| serde_json::to_value(result).map_err(|e| e.to_string())),
            BridgeRequest::Validate { effect, options } => self
                .registry
                .validate(&effect, &options)
                .map(Into::into)
                .map_err(|e| e.to_string()),
            BridgeRequest::Label { effect, options } => self
                .registry
                .default_label(&effect, &options)
                .map(Into::into)
                .map_err(|e| e.to_string()),
            BridgeRequest::Evaluate { variable, args } => self
                .registry
                .evaluate(&variable, &args)
                .await
                .map(Into::into)
                .map_err(|e| e.to_string()),
            BridgeRequest::Catalog => {
                serde_json::to_value(self.registry.catalog()).map_err(|e| e.to_string())
            }
        };

        match answer {
            Ok(result) => OutgoingLine::ok(id, result),
            Err(error) => {
                log::warn!("bridge: request {id} failed: {error}");
                OutgoingLine::error(id, error)
            }
        }
    }

    /// Parse and answer one input line.  Blank lines yield nothing.
    pub async fn handle_line(&self, line: &str) -> Option<OutgoingLine> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(envelope) => Some(self.handle(envelope).await),
            Err(e) => {
                log::warn!("bridge: unreadable request: {e}");
                Some(OutgoingLine::error(
                    serde_json::Value::Null,
                    format!("Invalid request: {e}"),
                ))
            }
        }
    }

    /// Read requests from `input` until EOF, answering each on its own task
    /// so slow effects do not block later requests.  Finished tasks are
    /// reaped as new lines arrive.  Returns once every request has been
    /// answered.
    pub async fn serve<R>(self: Arc<Self>, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut tasks = JoinSet::new();

        while let Some(line) = lines.next_line().await? {
            let bridge = Arc::clone(&self);
            tasks.spawn(async move {
                if let Some(answer) = bridge.handle_line(&line).await {
                    if bridge.lines.send(answer).is_err() {
                        log::warn!("bridge: output closed, response dropped");
                    }
                }
            });
            reap_finished(&mut tasks);
        }

        log::info!(
            "bridge: input closed, waiting for {} request(s)",
            tasks.len()
        );
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        Ok(())
    }
}

/// Join every task in `tasks` that has already completed, without waiting.
/// Returns how many were joined.
fn reap_finished(tasks: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = tasks.try_join_next() {
        log_join(joined);
        reaped += 1;
    }
    reaped
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        log::error!("bridge: request task failed: {e}");
    }
}

/// Write every line received on `rx` to `out` as compact JSON, one per line,
/// until all senders are dropped.
pub async fn write_lines<W>(
    mut rx: mpsc::UnboundedReceiver<OutgoingLine>,
    mut out: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let mut text = serde_json::to_string(&line)?;
        text.push('\n');
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
