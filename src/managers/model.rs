// Resource bodies as far as the gateway needs to see them. Only `name` is
// interpreted; every other field passes through to the domain manager.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque domain value (host info, disk, CPU, GPU, RAM module)
pub type Document = Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attributes: Map::new(),
        }
    }
}

impl Group {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attributes: Map::new(),
        }
    }
}

/// One crontab entry, passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CronJob(pub Map<String, Value>);

/// PUT /crontab body: the entry to replace and its replacement
#[derive(Debug, Clone, Deserialize)]
pub struct CronJobChange {
    pub old_cron_job: Option<CronJob>,
    pub new_cron_job: Option<CronJob>,
}

/// Total and used memory in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamUsage {
    pub size: u64,
    #[serde(rename = "use")]
    pub used: u64,
}
