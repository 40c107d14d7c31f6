//! Record aggregation and statistics.
//!
//! One linear pass over the fetched records produces the overall and
//! per-user counters. The pass is a pure function of its input: record
//! order is irrelevant and re-running it yields an identical result.

use crate::models::{AnalysisResult, CallRecord, UserStats};

/// Aggregate a record set into overall and per-user statistics.
///
/// Counting rules, which intentionally mirror how the upstream writer
/// records outcomes:
///
/// - The overall success and failed tallies count only explicit `true` /
///   `false` outcomes, so records with no outcome field land in neither
///   bucket and `successful_calls + failed_calls` can fall short of
///   `total_calls`. The same applies to the phone found / not-found pair.
/// - The per-user `failed` counter instead absorbs every non-success, which
///   keeps `success + failed == total` within each user bucket.
/// - Every record belongs to exactly one provider: `"APOLLO"` or Lusha.
///
/// An empty input produces all-zero overall counters and an empty user map.
pub fn analyze(records: &[CallRecord]) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    let overall = &mut result.overall;

    for record in records {
        let success = record.is_success();
        let phone_found = record.found_phone();
        let apollo = record.is_apollo();

        overall.total_calls += 1;
        if success {
            overall.successful_calls += 1;
        }
        if record.is_failure() {
            overall.failed_calls += 1;
        }
        if apollo {
            overall.apollo_calls += 1;
        } else {
            overall.lusha_calls += 1;
        }
        if phone_found {
            overall.phone_found_total += 1;
            if apollo {
                overall.apollo_phone_found_total += 1;
            } else {
                overall.lusha_phone_found_total += 1;
            }
        }
        if record.missed_phone() {
            overall.phone_not_found_total += 1;
        }

        let stats: &mut UserStats = result
            .user_stats
            .entry(record.user().to_string())
            .or_default();

        stats.total += 1;
        if success {
            stats.success += 1;
        } else {
            stats.failed += 1;
        }
        if phone_found {
            stats.phone_found += 1;
        }
        if apollo {
            stats.apollo_calls += 1;
            if phone_found {
                stats.apollo_phone_found += 1;
            }
        } else {
            stats.lusha_calls += 1;
            if phone_found {
                stats.lusha_phone_found += 1;
            }
        }
    }

    result
}
