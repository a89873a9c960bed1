use std::time::{SystemTime, UNIX_EPOCH};

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ROOM_NAME: &str = "Unnamed Room";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub audio: bool,
    pub video: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        RoomSettings {
            audio: true,
            video: false,
        }
    }
}

/// Partial settings record, as it arrives in create/update payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub audio: Option<bool>,
    pub video: Option<bool>,
}

impl SettingsUpdate {
    /// Replacement semantics: unspecified flags read as off, the same way a
    /// partial record overwrites the whole settings field.
    pub fn into_settings(self) -> RoomSettings {
        RoomSettings {
            audio: self.audio.unwrap_or(false),
            video: self.video.unwrap_or(false),
        }
    }

    /// Merge semantics: unspecified flags keep their current value.
    pub fn apply_to(self, current: RoomSettings) -> RoomSettings {
        RoomSettings {
            audio: self.audio.unwrap_or(current.audio),
            video: self.video.unwrap_or(current.video),
        }
    }
}

/// One meeting session tracked by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub room_name: String,
    /// Reference to the owning user. Absence is accepted by construction but
    /// the room is unusable without one.
    #[serde(default)]
    pub host: Option<String>,
    pub participants: Vec<String>,
    /// Handle to an external call session, opaque to the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_call_id: Option<String>,
    pub settings: RoomSettings,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Creation payload. Every field is optional; missing fields are filled by
/// `Room::new`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDraft {
    pub id: Option<String>,
    pub room_name: Option<String>,
    pub host: Option<String>,
    pub participants: Option<Vec<String>>,
    pub stream_call_id: Option<String>,
    pub settings: Option<SettingsUpdate>,
    pub created_at: Option<SystemTime>,
    pub updated_at: Option<SystemTime>,
}

/// Update payload. `id` and `created_at` are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomPatch {
    pub room_name: Option<String>,
    pub host: Option<String>,
    pub participants: Option<Vec<String>>,
    pub stream_call_id: Option<String>,
    pub settings: Option<SettingsUpdate>,
}

impl Room {
    pub fn new(draft: RoomDraft) -> Self {
        let now = SystemTime::now();
        let host = draft.host;
        let created_at = draft.created_at.unwrap_or(now);
        Room {
            id: draft.id.unwrap_or_else(generate_room_id),
            room_name: draft
                .room_name
                .unwrap_or_else(|| DEFAULT_ROOM_NAME.to_string()),
            participants: draft
                .participants
                .unwrap_or_else(|| host.iter().cloned().collect()),
            host,
            stream_call_id: draft.stream_call_id,
            settings: draft
                .settings
                .map_or_else(RoomSettings::default, SettingsUpdate::into_settings),
            created_at,
            updated_at: draft.updated_at.unwrap_or(now).max(created_at),
        }
    }

    /// Shallow merge: a supplied settings update replaces the whole record.
    pub(crate) fn patch_replace(&mut self, patch: RoomPatch) {
        if let Some(settings) = patch.settings {
            self.settings = settings.into_settings();
        }
        self.patch_fields(patch);
    }

    /// Deep merge: settings flags are applied field by field.
    pub(crate) fn patch_merge(&mut self, patch: RoomPatch) {
        if let Some(settings) = patch.settings {
            self.settings = settings.apply_to(self.settings);
        }
        self.patch_fields(patch);
    }

    fn patch_fields(&mut self, patch: RoomPatch) {
        if let Some(room_name) = patch.room_name {
            self.room_name = room_name;
        }
        if let Some(host) = patch.host {
            self.host = Some(host);
        }
        if let Some(participants) = patch.participants {
            self.participants = participants;
        }
        if let Some(stream_call_id) = patch.stream_call_id {
            self.stream_call_id = Some(stream_call_id);
        }
        self.touch();
    }

    // updated_at never moves backwards, even if the clock does
    fn touch(&mut self) {
        self.updated_at = SystemTime::now().max(self.updated_at);
    }

    /// Field lookup for the query evaluator, keyed by wire name.
    pub(crate) fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::String(self.id.clone())),
            "roomName" => Some(Value::String(self.room_name.clone())),
            "host" => self.host.clone().map(Value::String),
            "participants" => serde_json::to_value(&self.participants).ok(),
            "streamCallId" => self.stream_call_id.clone().map(Value::String),
            "settings" => serde_json::to_value(self.settings).ok(),
            "createdAt" => serde_json::to_value(self.created_at).ok(),
            "updatedAt" => serde_json::to_value(self.updated_at).ok(),
            _ => None,
        }
    }
}

// `room-<epoch millis>-<random suffix>`
fn generate_room_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("room-{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_host(host: &str) -> RoomDraft {
        RoomDraft {
            host: Some(host.to_string()),
            ..RoomDraft::default()
        }
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let room = Room::new(draft_with_host("u1"));

        assert!(room.id.starts_with("room-"));
        assert_eq!(room.room_name, DEFAULT_ROOM_NAME);
        assert_eq!(room.participants, vec!["u1".to_string()]);
        assert_eq!(room.settings, RoomSettings::default());
        assert!(room.updated_at >= room.created_at);
    }

    #[test]
    fn hostless_draft_builds_an_empty_participant_list() {
        let room = Room::new(RoomDraft::default());

        assert_eq!(room.host, None);
        assert!(room.participants.is_empty());
    }

    #[test]
    fn supplied_fields_are_kept_as_is() {
        let room = Room::new(RoomDraft {
            id: Some("room-fixed".to_string()),
            room_name: Some("Standup".to_string()),
            host: Some("alice".to_string()),
            participants: Some(vec!["alice".to_string(), "alice".to_string()]),
            ..RoomDraft::default()
        });

        assert_eq!(room.id, "room-fixed");
        assert_eq!(room.room_name, "Standup");
        // duplicates are not deduplicated
        assert_eq!(room.participants.len(), 2);
    }

    #[test]
    fn partial_settings_at_creation_drop_unspecified_flags() {
        let room = Room::new(RoomDraft {
            host: Some("u1".to_string()),
            settings: Some(SettingsUpdate {
                audio: Some(true),
                video: None,
            }),
            ..RoomDraft::default()
        });

        assert_eq!(
            room.settings,
            RoomSettings {
                audio: true,
                video: false
            }
        );
    }

    #[test]
    fn patch_replace_overwrites_the_whole_settings_record() {
        let mut room = Room::new(draft_with_host("u1"));
        room.patch_replace(RoomPatch {
            settings: Some(SettingsUpdate {
                video: Some(true),
                audio: None,
            }),
            ..RoomPatch::default()
        });

        assert_eq!(
            room.settings,
            RoomSettings {
                audio: false,
                video: true
            }
        );
    }

    #[test]
    fn patch_merge_keeps_unspecified_flags() {
        let mut room = Room::new(draft_with_host("u1"));
        room.patch_merge(RoomPatch {
            settings: Some(SettingsUpdate {
                video: Some(true),
                audio: None,
            }),
            ..RoomPatch::default()
        });

        assert_eq!(
            room.settings,
            RoomSettings {
                audio: true,
                video: true
            }
        );
    }

    #[test]
    fn wire_names_are_camel_case() {
        let room = Room::new(RoomDraft {
            host: Some("alice".to_string()),
            stream_call_id: Some("call-42".to_string()),
            ..RoomDraft::default()
        });
        let value = serde_json::to_value(&room).unwrap();

        assert!(value.get("roomName").is_some());
        assert!(value.get("streamCallId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
