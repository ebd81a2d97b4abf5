use cql_protocol::types::{ByName, Row};
use derive_more::Constructor;
use std::convert::TryFrom;
use uuid::Uuid;

use crate::Error;

/// Descriptive information about a host, as found in `system.local` or `system.peers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Constructor)]
pub struct HostInfo {
    pub host_id: Option<Uuid>,
    pub release_version: Option<String>,
    pub rack: Option<String>,
    pub datacenter: Option<String>,
}

impl HostInfo {
    /// Checks if both infos place a host in the same rack and datacenter.
    #[inline]
    pub fn same_location(&self, other: &HostInfo) -> bool {
        self.rack == other.rack && self.datacenter == other.datacenter
    }
}

impl TryFrom<&Row> for HostInfo {
    type Error = Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(HostInfo {
            host_id: row.by_name("host_id")?,
            release_version: row.by_name("release_version")?,
            rack: row.by_name("rack")?,
            datacenter: row.by_name("data_center")?,
        })
    }
}
