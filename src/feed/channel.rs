//! Push boundary for external transports

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::error::{FeedError, FeedResult};
use super::source::{ConnectionState, ReadingSource};
use super::{parse_event, FeedEvent};

/// Reading source fed by JSON lines pushed from another thread.
///
/// Real transports (a pub/sub client, a serial bridge) hold the `Sender`
/// and push one JSON object per message; the tracking side polls without
/// blocking. The source fails fatally once every sender is gone.
pub struct ChannelFeed {
    receiver: Receiver<String>,
    label: String,
    state: ConnectionState,
}

impl ChannelFeed {
    /// Creates the source and the handle producers push lines into
    pub fn new(label: impl Into<String>) -> (Self, Sender<String>) {
        let (sender, receiver) = mpsc::channel();
        (
            ChannelFeed {
                receiver,
                label: label.into(),
                state: ConnectionState::Connected,
            },
            sender,
        )
    }
}

impl ReadingSource for ChannelFeed {
    fn poll(&mut self) -> FeedResult<Option<FeedEvent>> {
        if let ConnectionState::Disconnected { reason } = &self.state {
            return Err(FeedError::Closed {
                source: self.label.clone(),
                reason: reason.clone(),
            });
        }
        match self.receiver.try_recv() {
            Ok(line) => parse_event(&line).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                let reason = "publisher hung up".to_string();
                self.state = ConnectionState::Disconnected {
                    reason: reason.clone(),
                };
                Err(FeedError::Closed {
                    source: self.label.clone(),
                    reason,
                })
            }
        }
    }

    fn describe(&self) -> &str {
        &self.label
    }

    fn connection_state(&self) -> ConnectionState {
        self.state.clone()
    }

    fn close(&mut self) {
        if !matches!(self.state, ConnectionState::Disconnected { .. }) {
            self.state = ConnectionState::Disconnected {
                reason: "closed".to_string(),
            };
        }
    }
}
