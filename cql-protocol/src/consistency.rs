//! Consistency levels attached to queries.

use derive_more::Display;

/// Consistency level of a query. Control queries read system tables of the contacted node, so
/// they only ever use [`Consistency::One`].
#[derive(Debug, PartialEq, Clone, Copy, Display, Ord, PartialOrd, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Consistency {
    Any,
    #[default]
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}
