use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::filter::RoomFilter;
use crate::room::{Room, RoomDraft, RoomPatch};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("room host is required")]
    MissingHost,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreConfig {
    /// Reject drafts without a host instead of accepting them as-is.
    pub require_host: bool,
}

/// Contract of the room collection.
///
/// Every operation is async so a storage-backed implementation can be swapped
/// in without touching call sites; the in-memory store completes each call
/// without suspending beyond its own lock. Absent ids are reported as
/// `Ok(None)`, never as an error.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create(&self, draft: RoomDraft) -> Result<Room, StoreError>;
    /// All rooms matching the filter, in insertion order.
    async fn find(&self, filter: &RoomFilter) -> Result<Vec<Room>, StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, StoreError>;
    /// Shallow merge: a settings record in the patch replaces the stored one
    /// wholesale.
    async fn find_by_id_and_update(
        &self,
        id: &str,
        patch: RoomPatch,
    ) -> Result<Option<Room>, StoreError>;
    /// Like `find_by_id_and_update`, but settings flags merge field by field.
    async fn find_by_id_and_merge(
        &self,
        id: &str,
        patch: RoomPatch,
    ) -> Result<Option<Room>, StoreError>;
    /// Removes the room and returns its last state. Terminal for that id.
    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Room>, StoreError>;
    /// Snapshot of the whole collection, in insertion order.
    async fn get_all(&self) -> Result<Vec<Room>, StoreError>;
}

/// In-memory room collection. Lives for the process lifetime of whatever
/// service owns it; nothing is persisted.
///
/// Clones share the same collection, so one store can be handed to several
/// handler tasks. Reads hand out clones of the stored rooms; the only way to
/// mutate a stored room is through the update operations.
#[derive(Debug, Clone, Default)]
pub struct RoomStore {
    rooms: Arc<RwLock<Vec<Room>>>,
    config: StoreConfig,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        RoomStore {
            rooms: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }
}

#[async_trait]
impl RoomRepository for RoomStore {
    async fn create(&self, draft: RoomDraft) -> Result<Room, StoreError> {
        if draft.host.is_none() {
            if self.config.require_host {
                return Err(StoreError::MissingHost);
            }
            warn!("creating a room without a host");
        }

        let room = Room::new(draft);
        let mut rooms = self.rooms.write().await;
        rooms.push(room.clone());
        debug!("created room {}", room.id);
        Ok(room)
    }

    async fn find(&self, filter: &RoomFilter) -> Result<Vec<Room>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .iter()
            .filter(|room| filter.matches(room))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.iter().find(|room| room.id == id).cloned())
    }

    async fn find_by_id_and_update(
        &self,
        id: &str,
        patch: RoomPatch,
    ) -> Result<Option<Room>, StoreError> {
        let mut rooms = self.rooms.write().await;
        match rooms.iter_mut().find(|room| room.id == id) {
            Some(room) => {
                room.patch_replace(patch);
                debug!("updated room {id}");
                Ok(Some(room.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id_and_merge(
        &self,
        id: &str,
        patch: RoomPatch,
    ) -> Result<Option<Room>, StoreError> {
        let mut rooms = self.rooms.write().await;
        match rooms.iter_mut().find(|room| room.id == id) {
            Some(room) => {
                room.patch_merge(patch);
                debug!("merged update into room {id}");
                Ok(Some(room.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Room>, StoreError> {
        let mut rooms = self.rooms.write().await;
        match rooms.iter().position(|room| room.id == id) {
            Some(index) => {
                let room = rooms.remove(index);
                debug!("deleted room {id}");
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<Room>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.to_vec())
    }
}
