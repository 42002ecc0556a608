use super::{
    Transport,
    TransportError,
};
use futures::future::BoxFuture;
use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Timeout,
}

/// Scripted transport that answers known commands and times out otherwise.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    replies: HashMap<String, Reply>,
    log: Mutex<Vec<String>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, command: impl Into<String>, text: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::Text(text.into()));
        self
    }

    pub(crate) fn fail(mut self, command: impl Into<String>) -> Self {
        self.replies.insert(command.into(), Reply::Timeout);
        self
    }

    /// Commands received so far, in order.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl Transport for MockTransport {
    fn execute<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<String, TransportError>> {
        if let Ok(mut log) = self.log.lock() {
            log.push(command.to_string());
        }
        let reply = self.replies.get(command).cloned().unwrap_or(Reply::Timeout);
        Box::pin(async move {
            match reply {
                Reply::Text(text) => Ok(text),
                Reply::Timeout => Err(TransportError::Timeout(Duration::from_secs(5))),
            }
        })
    }
}
