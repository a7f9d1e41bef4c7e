use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use std::collections::BTreeSet;

/// A content channel and its derived summary statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Bytes of distinct blobs behind the channel's available files.
    pub published_size: u64,
    /// Distinct available resources, deduplicated by content identity.
    pub total_resource_count: u64,
    pub included_languages: BTreeSet<String>,
    /// `None` until the channel's fields have been calculated once.
    pub order: Option<u64>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ChannelRow {
    id: String,
    name: String,
    published_size: i64,
    total_resource_count: i64,
    order: Option<i64>,
}
impl ChannelRow {
    pub(crate) fn into_model(self, included_languages: BTreeSet<String>) -> Result<Channel, Error> {
        Ok(Channel {
            id: self.id,
            name: self.name,
            published_size: u64::try_from(self.published_size)
                .or_raise(|| ErrorKind::InvalidData("published size"))?,
            total_resource_count: u64::try_from(self.total_resource_count)
                .or_raise(|| ErrorKind::InvalidData("total resource count"))?,
            included_languages,
            order: self.order.map(u64::try_from).transpose().or_raise(|| ErrorKind::InvalidData("order"))?,
        })
    }
}
