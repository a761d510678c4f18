// crates/store/src/source.rs
//! Interface to the remote conversation service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use convo_view_core::{Conversation, InboxPartition, SourceError};

/// Which way a page request walks a partition's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    /// Walk backwards through history — full-refresh pagination.
    Older,
    /// Fetch what arrived since a cursor — incremental refresh.
    Newer,
}

/// One page of conversations from a partition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub items: Vec<Conversation>,
    pub has_more: bool,
    /// Cursor at the newest edge of this page, for later `Newer` requests.
    pub newest_cursor: Option<String>,
    /// Cursor at the oldest edge of this page, for the next `Older` request.
    pub oldest_cursor: Option<String>,
}

/// A paginated remote source of conversations.
///
/// The production implementation is the HTTP API client owned by the UI
/// shell; tests use `testing::ScriptedSource`. Implementations are expected
/// to be cheap to share (`Arc`) and safe to call concurrently — one refresh
/// fetches all three partitions at once.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    async fn list_page(
        &self,
        partition: InboxPartition,
        cursor: Option<&str>,
        direction: PageDirection,
    ) -> Result<ConversationPage, SourceError>;
}
