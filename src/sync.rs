//! Keeps the catalog in step with its record source.
//!
//! A [`CatalogSynchronizer`] runs refresh cycles: enumerate records, filter
//! them by path, resolve best-effort metadata, then publish the result to the
//! [`CatalogStore`](crate::library::CatalogStore) in one swap. Progress and the
//! final outcome are reported through a [`NotificationSink`].

mod filter;
mod notify;
mod source;
mod synchronizer;
mod ticker;

pub use filter::FilterPattern;
pub use notify::{CatalogEvent, EventBus, NotificationSink, RefreshProgress, RefreshSummary};
pub use source::{
    ExtendedMetadata, FilterPatternProvider, ListenerId, RawRecord, RecordEnumerator,
    RecordStream, SettingKey, SettingsListener,
};
pub use synchronizer::{CatalogSynchronizer, RefreshStatus, SyncState};

#[cfg(test)]
mod tests;
