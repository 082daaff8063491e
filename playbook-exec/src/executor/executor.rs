use std::sync::Arc;

use futures_util::stream::{self, Stream};
use playbook_core::types::Bundle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::env::EnvStack;
use crate::executor::config::ExecutorConfig;
use crate::executor::events::{ChannelEventSink, EventSink, StepEvent};
use crate::executor::interpreter::{Interpreter, RunOutcome};
use crate::executor::playbooks::Playbook;
use crate::transport::Transport;

/// Owns a bundle and a transport and runs playbooks against them.
#[derive(Clone)]
pub struct Executor {
    bundle: Arc<Bundle>,
    transport: Arc<dyn Transport>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(bundle: Arc<Bundle>, transport: Arc<dyn Transport>, config: ExecutorConfig) -> Self {
        Self {
            bundle,
            transport,
            config,
        }
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub async fn execute(&self, playbooks: &[Playbook], seed: EnvStack, sink: &dyn EventSink) -> RunOutcome {
        Interpreter::new(&self.bundle, self.transport.as_ref(), &self.config)
            .execute(playbooks, seed, sink)
            .await
    }

    /// Runs on a spawned task and yields events as they happen. The stream ends after
    /// the last playbook's closing event. Dropping the stream abandons the run: the task
    /// is aborted at its next suspension point and no further requests are sent.
    /// Must be called inside a tokio runtime.
    pub fn stream(&self, playbooks: Vec<Playbook>, seed: EnvStack) -> impl Stream<Item = StepEvent> + Send + 'static {
        let (tx, rx) = mpsc::unbounded_channel();
        let this = self.clone();
        let run = AbortOnDrop(tokio::spawn(async move {
            let sink = ChannelEventSink::new(tx);
            this.execute(&playbooks, seed, &sink).await;
        }));
        stream::unfold((rx, run), |(mut rx, run)| async move {
            rx.recv().await.map(|ev| (ev, (rx, run)))
        })
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
