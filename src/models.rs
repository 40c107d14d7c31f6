//! Data models for the performance report.
//!
//! This module contains the typed view of the upstream call records and
//! the statistics structures produced by the aggregation pass.

use serde::Deserialize;
use std::collections::BTreeMap;

/// User bucket for records that carry no `user_name` field.
pub const UNKNOWN_USER: &str = "Unknown";

/// The provider tag the upstream writer uses for Apollo enrichments.
/// Any other value, including none at all, means the Lusha provider.
pub const APOLLO_SOURCE: &str = "APOLLO";

/// A single enrichment call document, as written by the upstream service.
///
/// The writer is loosely typed: any of these fields may be absent, and the
/// booleans are tri-state (`true` / `false` / absent). Absence is meaningful
/// to the counting rules, so every field stays an `Option` and the accessors
/// below encode the per-field policy. Fields this report never reads
/// (`_id`, `created_at`, ...) are ignored during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallRecord {
    /// Who triggered the call.
    #[serde(default)]
    pub user_name: Option<String>,

    /// Whether the enrichment API call succeeded.
    #[serde(default)]
    pub lusha_api_success: Option<bool>,

    /// Whether the call produced a phone number.
    #[serde(default)]
    pub phone_found: Option<bool>,

    /// Which provider handled the call.
    #[serde(default)]
    pub enrichment_source: Option<String>,
}

impl CallRecord {
    /// The user this call is attributed to, defaulting to `"Unknown"`.
    pub fn user(&self) -> &str {
        self.user_name.as_deref().unwrap_or(UNKNOWN_USER)
    }

    /// True only for an explicitly recorded success.
    pub fn is_success(&self) -> bool {
        self.lusha_api_success == Some(true)
    }

    /// True only for an explicitly recorded failure. A record with no
    /// outcome at all is neither a success nor a failure.
    pub fn is_failure(&self) -> bool {
        self.lusha_api_success == Some(false)
    }

    /// True only when the call explicitly reported a phone number.
    pub fn found_phone(&self) -> bool {
        self.phone_found == Some(true)
    }

    /// True only when the call explicitly reported no phone number.
    pub fn missed_phone(&self) -> bool {
        self.phone_found == Some(false)
    }

    /// Provider attribution: `"APOLLO"` exactly, everything else is Lusha.
    pub fn is_apollo(&self) -> bool {
        self.enrichment_source.as_deref() == Some(APOLLO_SOURCE)
    }
}

/// Aggregate counters across every record in the window.
///
/// Success/failed and phone found/not-found each count only the explicit
/// boolean values, so their sums can fall short of `total_calls` when
/// records omit those fields. Provider attribution is total:
/// `apollo_calls + lusha_calls == total_calls` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverallStats {
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub apollo_calls: usize,
    pub lusha_calls: usize,
    pub phone_found_total: usize,
    pub phone_not_found_total: usize,
    pub apollo_phone_found_total: usize,
    pub lusha_phone_found_total: usize,
}

/// Per-user counters, keyed by user name in [`AnalysisResult`].
///
/// Unlike the overall tally, `failed` here counts every call that was not an
/// explicit success, so `success + failed == total` per user. Likewise
/// `lusha_calls + apollo_calls == total`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub lusha_calls: usize,
    pub lusha_phone_found: usize,
    pub apollo_calls: usize,
    pub apollo_phone_found: usize,
    pub phone_found: usize,
}

/// The complete result of one aggregation pass.
///
/// Immutable after construction and discarded at the end of the run.
/// `user_stats` is a `BTreeMap` so iteration is lexicographically sorted by
/// user name, which keeps the rendered report deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Counters across all records.
    pub overall: OverallStats,

    /// Counters per user, sorted by user name.
    pub user_stats: BTreeMap<String, UserStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults_to_unknown() {
        let record = CallRecord::default();
        assert_eq!(record.user(), "Unknown");

        let named = CallRecord {
            user_name: Some("alice".to_string()),
            ..Default::default()
        };
        assert_eq!(named.user(), "alice");
    }

    #[test]
    fn test_tri_state_outcome() {
        let absent = CallRecord::default();
        assert!(!absent.is_success());
        assert!(!absent.is_failure());

        let success = CallRecord {
            lusha_api_success: Some(true),
            ..Default::default()
        };
        assert!(success.is_success());
        assert!(!success.is_failure());

        let failure = CallRecord {
            lusha_api_success: Some(false),
            ..Default::default()
        };
        assert!(!failure.is_success());
        assert!(failure.is_failure());
    }

    #[test]
    fn test_tri_state_phone() {
        let absent = CallRecord::default();
        assert!(!absent.found_phone());
        assert!(!absent.missed_phone());

        let found = CallRecord {
            phone_found: Some(true),
            ..Default::default()
        };
        assert!(found.found_phone());
        assert!(!found.missed_phone());
    }

    #[test]
    fn test_provider_attribution() {
        let apollo = CallRecord {
            enrichment_source: Some("APOLLO".to_string()),
            ..Default::default()
        };
        assert!(apollo.is_apollo());

        // Any other value falls through to Lusha, absence included.
        let lusha = CallRecord {
            enrichment_source: Some("LUSHA".to_string()),
            ..Default::default()
        };
        assert!(!lusha.is_apollo());
        assert!(!CallRecord::default().is_apollo());

        // The match is exact, not case-insensitive.
        let lowercase = CallRecord {
            enrichment_source: Some("apollo".to_string()),
            ..Default::default()
        };
        assert!(!lowercase.is_apollo());
    }

    #[test]
    fn test_record_deserializes_from_sparse_document() {
        let doc = mongodb::bson::doc! {
            "_id": "abc123",
            "created_at": "2024-05-09T12:00:00.000000+00:00",
            "user_name": "bob",
            "lusha_api_success": false,
        };

        let record: CallRecord = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(record.user(), "bob");
        assert!(record.is_failure());
        assert!(record.phone_found.is_none());
        assert!(record.enrichment_source.is_none());
    }
}
