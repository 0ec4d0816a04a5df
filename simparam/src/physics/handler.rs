use std::sync::Arc;

use super::msg::PhysicsMsg;

/// How a transport hands physics updates to the engine.
#[derive(Clone)]
pub enum UpdateHandler {
    /// Queue-based: stored until the owner drains the queue
    Queue(flume::Sender<PhysicsMsg>),

    /// Direct callback: applied on the delivering thread
    Callback(Arc<dyn Fn(PhysicsMsg) + Send + Sync>),
}

impl UpdateHandler {
    pub fn handle(&self, msg: PhysicsMsg) {
        match self {
            UpdateHandler::Queue(tx) => {
                if tx.send(msg).is_err() {
                    tracing::debug!("Physics update queue closed, dropping message");
                }
            }
            UpdateHandler::Callback(cb) => cb(msg),
        }
    }
}

impl std::fmt::Debug for UpdateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateHandler::Queue(_) => f.write_str("UpdateHandler::Queue"),
            UpdateHandler::Callback(_) => f.write_str("UpdateHandler::Callback"),
        }
    }
}
