use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::domain::{Language, StudentId};
use storage::Storage;

use crate::error::{ClientError, Result};

/// Storage key of the single persisted profile record.
pub const PROFILE_STORAGE_KEY: &str = "studySaathiUser";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub id: StudentId,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub doubt_solved_session: bool,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, language: Language) -> Self {
        let name = name.into();
        Self {
            id: StudentId::from_name(&name),
            name,
            language,
            doubt_solved_session: false,
        }
    }

    /// Recomputes `id` from `name`; records written by older clients may lack it.
    pub fn refresh_id(&mut self) {
        self.id = StudentId::from_name(&self.name);
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self) -> Result<Option<UserProfile>>;
    async fn save(&self, profile: &UserProfile) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl ProfileStore for Storage {
    async fn load(&self) -> Result<Option<UserProfile>> {
        let raw = self
            .get_item(PROFILE_STORAGE_KEY)
            .await
            .map_err(ClientError::Storage)?;
        raw.map(|text| serde_json::from_str(&text).map_err(ClientError::from))
            .transpose()
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        let text = serde_json::to_string(profile)?;
        self.set_item(PROFILE_STORAGE_KEY, &text)
            .await
            .map_err(ClientError::Storage)
    }

    async fn clear(&self) -> Result<()> {
        self.remove_item(PROFILE_STORAGE_KEY)
            .await
            .map_err(ClientError::Storage)
    }
}

/// Process-local store for headless runs and tests.
#[derive(Default)]
pub struct MemoryProfileStore {
    record: Mutex<Option<String>>,
}

impl MemoryProfileStore {
    pub fn with_profile(profile: &UserProfile) -> Result<Self> {
        Ok(Self {
            record: Mutex::new(Some(serde_json::to_string(profile)?)),
        })
    }

    fn record(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load(&self) -> Result<Option<UserProfile>> {
        let raw = self.record().clone();
        raw.map(|text| serde_json::from_str(&text).map_err(ClientError::from))
            .transpose()
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        let text = serde_json::to_string(profile)?;
        *self.record() = Some(text);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.record() = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
