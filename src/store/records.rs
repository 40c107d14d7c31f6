//! Record retrieval from the document store.
//!
//! This module owns the MongoDB connection and the trailing-window query
//! that selects the records a report run covers.

use crate::config::{self, StoreConfig};
use crate::error::Error;
use crate::models::CallRecord;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::{Client, Collection};
use tracing::{debug, info};

/// How far back a report run looks for records.
pub const WINDOW_HOURS: i64 = 24;

/// Handle to the collection of enrichment call records.
pub struct RecordStore {
    collection: Collection<CallRecord>,
}

impl RecordStore {
    /// Connect to the configured store and verify it is reachable.
    ///
    /// Fails with [`Error::Configuration`] when a connection setting is
    /// missing and [`Error::SourceUnavailable`] when the server cannot be
    /// reached, so the run aborts before producing any output.
    pub async fn connect(cfg: &StoreConfig) -> Result<Self, Error> {
        let uri = config::required(&cfg.uri, "MONGO_URI")?;
        let database = config::required(&cfg.database, "DB_NAME")?;
        let collection = config::required(&cfg.collection, "COLLECTION_NAME")?;

        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);

        // Round-trip a ping so an unreachable server fails here, not
        // halfway through the run.
        db.run_command(doc! { "ping": 1 }).await?;
        debug!("Connected to {}.{}", database, collection);

        Ok(Self {
            collection: db.collection(collection),
        })
    }

    /// Fetch every record created inside the trailing window.
    ///
    /// Result ordering is whatever the server returns; the aggregation pass
    /// does not depend on it.
    pub async fn fetch_window(&self, now: DateTime<Utc>) -> Result<Vec<CallRecord>, Error> {
        let records: Vec<CallRecord> = self
            .collection
            .find(window_filter(now))
            .await?
            .try_collect()
            .await?;

        info!(
            "Fetched {} records from the last {} hours",
            records.len(),
            WINDOW_HOURS
        );
        Ok(records)
    }
}

/// Build the filter selecting records created at or after `now - 24h`.
///
/// The upstream writer stores `created_at` inconsistently, as either a
/// native datetime or its ISO-8601 string encoding, so the filter matches
/// both representations. The string arm uses the microsecond RFC 3339 form
/// with a `+00:00` offset, the exact shape the writer produces. The lower
/// bound is inclusive.
pub fn window_filter(now: DateTime<Utc>) -> Document {
    let cutoff = now - Duration::hours(WINDOW_HOURS);

    doc! {
        "$or": [
            { "created_at": { "$gte": BsonDateTime::from_millis(cutoff.timestamp_millis()) } },
            { "created_at": { "$gte": cutoff.to_rfc3339_opts(SecondsFormat::Micros, false) } },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::Bson;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 30, 45).unwrap()
    }

    fn filter_arms(filter: &Document) -> Vec<Document> {
        filter
            .get_array("$or")
            .unwrap()
            .iter()
            .map(|b| b.as_document().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_filter_matches_both_representations() {
        let arms = filter_arms(&window_filter(fixed_now()));
        assert_eq!(arms.len(), 2);

        let native = arms[0].get_document("created_at").unwrap();
        assert!(matches!(native.get("$gte"), Some(Bson::DateTime(_))));

        let string = arms[1].get_document("created_at").unwrap();
        assert!(matches!(string.get("$gte"), Some(Bson::String(_))));
    }

    #[test]
    fn test_cutoff_is_24_hours_before_now() {
        let arms = filter_arms(&window_filter(fixed_now()));

        let native = arms[0]
            .get_document("created_at")
            .unwrap()
            .get_datetime("$gte")
            .unwrap();
        let expected = fixed_now() - Duration::hours(24);
        assert_eq!(native.timestamp_millis(), expected.timestamp_millis());
    }

    #[test]
    fn test_string_cutoff_uses_writer_format() {
        let arms = filter_arms(&window_filter(fixed_now()));

        let string = arms[1]
            .get_document("created_at")
            .unwrap()
            .get_str("$gte")
            .unwrap();
        assert_eq!(string, "2024-05-09T12:30:45.000000+00:00");
    }

    #[test]
    fn test_window_bound_is_inclusive() {
        // Both arms must use $gte so a record created exactly at the
        // window boundary is selected.
        for arm in filter_arms(&window_filter(fixed_now())) {
            let created_at = arm.get_document("created_at").unwrap();
            assert!(created_at.contains_key("$gte"));
            assert!(!created_at.contains_key("$gt"));
        }
    }
}
