use chrono::NaiveTime;
use statusdeck::daily_log::DailyLog;
use statusdeck::history::{History, HistoryStats};
use statusdeck::{Provider, Sample, Snapshot};
use std::{collections::BTreeMap, fmt::Display};
use tokio::sync::{mpsc, oneshot};

/// Sole owner of the latency histories and the daily log. Both the request
/// handlers and the sampler go through its handle, so writes never race.
struct StateActor {
    receiver: mpsc::Receiver<StateActorMessage>,
    histories: BTreeMap<String, History>,
    daily: DailyLog,
}

impl StateActor {
    fn new(receiver: mpsc::Receiver<StateActorMessage>, daily: DailyLog) -> Self {
        let histories = Provider::ALL
            .iter()
            .map(|p| (p.name().to_string(), History::default()))
            .collect();
        Self {
            receiver,
            histories,
            daily,
        }
    }

    fn handle_message(&mut self, msg: StateActorMessage) {
        // Errors when responding can happen e.g. if the `select!` macro is
        // used to cancel waiting for the response. We can safely ignore these.
        match msg {
            StateActorMessage::RecordSamples {
                samples,
                respond_to,
            } => {
                for sample in samples {
                    self.histories
                        .entry(sample.provider.clone())
                        .or_default()
                        .push(sample);
                }
                let _ = respond_to.send(());
            }
            StateActorMessage::RecordSnapshot {
                snapshot,
                at,
                respond_to,
            } => {
                self.daily.record(snapshot, &at);
                let _ = respond_to.send(self.daily.len());
            }
            StateActorMessage::GetHistory {
                provider,
                respond_to,
            } => {
                let reply = self
                    .histories
                    .get(&provider)
                    .map(|h| (h.samples().cloned().collect(), h.stats()))
                    .ok_or(StateActorError::NotFound);
                let _ = respond_to.send(reply);
            }
            StateActorMessage::GetDailyLog { respond_to } => {
                let _ = respond_to.send(self.daily.to_vec());
            }
        }
    }

    async fn run(&mut self) {
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }
    }
}

#[derive(Clone)]
pub struct StateActorHandle {
    sender: mpsc::Sender<StateActorMessage>,
}

impl StateActorHandle {
    pub fn new(daily: DailyLog, buffer: usize) -> Self {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let mut actor = StateActor::new(receiver, daily);
        tokio::spawn(async move { actor.run().await });

        Self { sender }
    }

    pub async fn record_samples(&self, samples: Vec<Sample>) -> Result<(), StateActorError> {
        let (send, recv) = oneshot::channel();
        self.send(StateActorMessage::RecordSamples {
            samples,
            respond_to: send,
        })
        .await?;
        recv.await.map_err(|_| StateActorError::Gone)
    }

    /// Returns the log length after recording.
    pub async fn record_snapshot(
        &self,
        snapshot: Snapshot,
        at: NaiveTime,
    ) -> Result<usize, StateActorError> {
        let (send, recv) = oneshot::channel();
        self.send(StateActorMessage::RecordSnapshot {
            snapshot,
            at,
            respond_to: send,
        })
        .await?;
        recv.await.map_err(|_| StateActorError::Gone)
    }

    pub async fn get_history(
        &self,
        provider: &str,
    ) -> Result<(Vec<Sample>, Option<HistoryStats>), StateActorError> {
        let (send, recv) = oneshot::channel();
        self.send(StateActorMessage::GetHistory {
            provider: provider.to_string(),
            respond_to: send,
        })
        .await?;
        recv.await.map_err(|_| StateActorError::Gone)?
    }

    pub async fn get_daily_log(&self) -> Result<Vec<Snapshot>, StateActorError> {
        let (send, recv) = oneshot::channel();
        self.send(StateActorMessage::GetDailyLog { respond_to: send })
            .await?;
        recv.await.map_err(|_| StateActorError::Gone)
    }

    async fn send(&self, msg: StateActorMessage) -> Result<(), StateActorError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| StateActorError::Gone)
    }
}

enum StateActorMessage {
    RecordSamples {
        samples: Vec<Sample>,
        respond_to: oneshot::Sender<()>,
    },
    RecordSnapshot {
        snapshot: Snapshot,
        at: NaiveTime,
        respond_to: oneshot::Sender<usize>,
    },
    GetHistory {
        provider: String,
        respond_to: oneshot::Sender<Result<(Vec<Sample>, Option<HistoryStats>), StateActorError>>,
    },
    GetDailyLog {
        respond_to: oneshot::Sender<Vec<Snapshot>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateActorError {
    NotFound,
    Gone,
}

impl Display for StateActorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "No history for this provider"),
            Self::Gone => write!(f, "State actor is not running"),
        }
    }
}

impl std::error::Error for StateActorError {}
