//! InMemory Meeting Store 実装
//!
//! HTTP API で作成されるミーティングメタデータを HashMap で保持します。
//! WebSocket 側のミーティングルーム（Hub 管理）とは独立しており、
//! 全員が退出してもメタデータは消えない。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use idobata_shared::time::get_ist_timestamp;

use crate::domain::{Meeting, MeetingDraft, MeetingError, MeetingStore, Timestamp};

/// インメモリ Meeting Store 実装
pub struct InMemoryMeetingStore {
    meetings: Mutex<HashMap<String, Meeting>>,
}

impl InMemoryMeetingStore {
    /// 新しい InMemoryMeetingStore を作成
    pub fn new() -> Self {
        Self {
            meetings: Mutex::new(HashMap::new()),
        }
    }

    /// 招待リンクのスラッグを生成（`meeting-{16 hex}-{unix millis}`）
    fn generate_meeting_link() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("meeting-{}-{}", &hex[..16], get_ist_timestamp())
    }
}

impl Default for InMemoryMeetingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeetingStore for InMemoryMeetingStore {
    async fn create_meeting(&self, draft: MeetingDraft) -> Meeting {
        let meeting = Meeting {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            start_at: draft.start_at,
            host: draft.host,
            link: Self::generate_meeting_link(),
            created_at: Timestamp::new(get_ist_timestamp()),
        };

        let mut meetings = self.meetings.lock().await;
        meetings.insert(meeting.id.clone(), meeting.clone());
        tracing::info!("Meeting created: {}", meeting.id);
        meeting
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, MeetingError> {
        let meetings = self.meetings.lock().await;
        meetings
            .get(meeting_id)
            .cloned()
            .ok_or(MeetingError::NotFound)
    }
}
