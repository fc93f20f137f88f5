use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{AgenticRagRequest, AgenticRagResponse, ProcessError, Processor};

pub type ProcessResult = Result<AgenticRagResponse, ProcessError>;

impl Processor {
    /// Run the request on a background task.
    ///
    /// The receiver yields exactly one result and then closes.
    pub fn process_stream(self: Arc<Self>, request: AgenticRagRequest) -> mpsc::Receiver<ProcessResult> {
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            let result = self.process(request).await;
            if tx.send(result).await.is_err() {
                tracing::debug!("stream receiver dropped before the response was ready");
            }
        });

        rx
    }

    /// Run the request on a background task and hand the result to `callback`.
    pub fn process_with_callback<F>(self: Arc<Self>, request: AgenticRagRequest, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(ProcessResult) + Send + 'static,
    {
        let mut rx = self.process_stream(request);
        tokio::spawn(async move {
            if let Some(result) = rx.recv().await {
                callback(result);
            }
        })
    }
}
