//! Account identity and the provisioned-data record.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provision::DataVersion;

/// Account identifier, a uuid v7 rendered without dashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// A fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The slice of the account row the provisioning engine owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,

    /// Version of the account's provisioned data, not of the software.
    #[serde(rename = "data_version")]
    pub version: DataVersion,
}

impl AccountRecord {
    pub fn new(id: AccountId, version: DataVersion) -> Self {
        Self { id, version }
    }
}
