// crates/store/src/testing.rs
//! Scripted in-memory sources and conversation fixtures.
//!
//! A normal module rather than `#[cfg(test)]` so downstream crates (the
//! engine) can drive a store in their own tests without a real remote.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use convo_view_core::{Conversation, ConversationKind, InboxPartition, Participant, SourceError};

use crate::source::{ConversationPage, ConversationSource, PageDirection};

/// One recorded `list_page` invocation, for assertions on pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub partition: InboxPartition,
    pub cursor: Option<String>,
    pub direction: PageDirection,
}

enum Scripted {
    Page(ConversationPage),
    Error(String),
}

/// A conversation source that replays scripted pages per partition.
///
/// Each `list_page` call pops the next scripted response for its partition;
/// an exhausted script answers with an empty final page. Every call is
/// recorded for later inspection.
#[derive(Default)]
pub struct ScriptedSource {
    queues: Mutex<HashMap<InboxPartition, VecDeque<Scripted>>>,
    log: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, partition: InboxPartition, page: ConversationPage) {
        self.queues
            .lock()
            .expect("script lock poisoned")
            .entry(partition)
            .or_default()
            .push_back(Scripted::Page(page));
    }

    pub fn push_error(&self, partition: InboxPartition, message: &str) {
        self.queues
            .lock()
            .expect("script lock poisoned")
            .entry(partition)
            .or_default()
            .push_back(Scripted::Error(message.to_string()));
    }

    /// Delay every response — for exercising in-flight behavior.
    pub fn set_response_delay(&self, delay: Duration) {
        *self.delay.lock().expect("script lock poisoned") = Some(delay);
    }

    pub fn calls_for(&self, partition: InboxPartition) -> Vec<RecordedCall> {
        self.log
            .lock()
            .expect("script lock poisoned")
            .iter()
            .filter(|call| call.partition == partition)
            .cloned()
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.log.lock().expect("script lock poisoned").len()
    }
}

#[async_trait]
impl ConversationSource for ScriptedSource {
    async fn list_page(
        &self,
        partition: InboxPartition,
        cursor: Option<&str>,
        direction: PageDirection,
    ) -> Result<ConversationPage, SourceError> {
        let delay = *self.delay.lock().expect("script lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.log
            .lock()
            .expect("script lock poisoned")
            .push(RecordedCall {
                partition,
                cursor: cursor.map(str::to_string),
                direction,
            });

        let next = self
            .queues
            .lock()
            .expect("script lock poisoned")
            .get_mut(&partition)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::Error(message)) => Err(SourceError::request(partition, message)),
            None => Ok(ConversationPage::default()),
        }
    }
}

/// Minimal conversation fixture; chain the `ConversationExt` helpers for
/// anything beyond an id.
pub fn conversation(id: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        ..Default::default()
    }
}

pub fn page(
    items: Vec<Conversation>,
    has_more: bool,
    newest_cursor: Option<&str>,
    oldest_cursor: Option<&str>,
) -> ConversationPage {
    ConversationPage {
        items,
        has_more,
        newest_cursor: newest_cursor.map(str::to_string),
        oldest_cursor: oldest_cursor.map(str::to_string),
    }
}

/// Fluent fixture helpers over [`Conversation`].
pub trait ConversationExt: Sized {
    fn with_title(self, title: &str) -> Conversation;
    fn with_network(self, network: &str) -> Conversation;
    fn with_kind(self, kind: ConversationKind) -> Conversation;
    fn with_last_activity(self, iso: &str) -> Conversation;
    fn with_unread(self, unread_count: u32) -> Conversation;
    fn with_pinned(self) -> Conversation;
    fn with_muted(self) -> Conversation;
    fn with_participant_names(self, names: &[&str]) -> Conversation;
}

impl ConversationExt for Conversation {
    fn with_title(mut self, title: &str) -> Conversation {
        self.title = Some(title.to_string());
        self
    }

    fn with_network(mut self, network: &str) -> Conversation {
        self.network = network.to_string();
        self
    }

    fn with_kind(mut self, kind: ConversationKind) -> Conversation {
        self.kind = kind;
        self
    }

    fn with_last_activity(mut self, iso: &str) -> Conversation {
        self.last_activity = Some(iso.to_string());
        self
    }

    fn with_unread(mut self, unread_count: u32) -> Conversation {
        self.unread_count = unread_count;
        self
    }

    fn with_pinned(mut self) -> Conversation {
        self.pinned = true;
        self
    }

    fn with_muted(mut self) -> Conversation {
        self.muted = true;
        self
    }

    fn with_participant_names(mut self, names: &[&str]) -> Conversation {
        self.participants = names
            .iter()
            .enumerate()
            .map(|(i, name)| Participant {
                id: format!("p{i}"),
                name: Some(name.to_string()),
                ..Default::default()
            })
            .collect();
        self
    }
}
