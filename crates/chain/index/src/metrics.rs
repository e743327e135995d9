//! Metrics of the chain index.

/// Container for the metric names recorded by the chain index.
///
/// Recording goes through the `metrics` facade and is a no-op until the
/// embedding node installs a recorder.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Entries handed from the hot region to the finalization sink.
    pub const FINALIZED_ENTRIES_TOTAL: &'static str = "hotcold_finalized_entries_total";
    /// Non-finalized entries pruned from the hot region.
    pub const PRUNED_ENTRIES_TOTAL: &'static str = "hotcold_pruned_entries_total";
    /// Entries the finalization sink rejected.
    pub const SINK_FAILURES_TOTAL: &'static str = "hotcold_sink_failures_total";
    /// Entries currently held by the hot region, anchor included.
    pub const HOT_ENTRIES: &'static str = "hotcold_hot_entries";
    /// Latest slot of the cold region.
    pub const COLD_HEAD_SLOT: &'static str = "hotcold_cold_head_slot";
    /// Empty-slot transitions performed per `towards` call.
    pub const TOWARDS_TRANSITIONS: &'static str = "hotcold_towards_transitions";

    /// Describes and zeroes all metrics.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::FINALIZED_ENTRIES_TOTAL,
            metrics::Unit::Count,
            "Total number of entries handed to the finalization sink",
        );
        metrics::describe_counter!(
            Self::PRUNED_ENTRIES_TOTAL,
            metrics::Unit::Count,
            "Total number of non-finalized entries pruned from the hot chain",
        );
        metrics::describe_counter!(
            Self::SINK_FAILURES_TOTAL,
            metrics::Unit::Count,
            "Total number of entries rejected by the finalization sink",
        );
        metrics::describe_gauge!(
            Self::HOT_ENTRIES,
            metrics::Unit::Count,
            "Number of entries held by the hot chain",
        );
        metrics::describe_gauge!(
            Self::COLD_HEAD_SLOT,
            metrics::Unit::Count,
            "Latest slot ingested by the cold chain",
        );
        metrics::describe_histogram!(
            Self::TOWARDS_TRANSITIONS,
            metrics::Unit::Count,
            "Empty-slot transitions performed per towards call",
        );
    }

    fn zero() {
        metrics::counter!(Self::FINALIZED_ENTRIES_TOTAL).increment(0);
        metrics::counter!(Self::PRUNED_ENTRIES_TOTAL).increment(0);
        metrics::counter!(Self::SINK_FAILURES_TOTAL).increment(0);
        metrics::gauge!(Self::HOT_ENTRIES).set(0.0);
        metrics::gauge!(Self::COLD_HEAD_SLOT).set(0.0);
    }

    pub(crate) fn record_finalized(count: usize) {
        metrics::counter!(Self::FINALIZED_ENTRIES_TOTAL).increment(count as u64);
    }

    pub(crate) fn record_pruned(count: usize) {
        metrics::counter!(Self::PRUNED_ENTRIES_TOTAL).increment(count as u64);
    }

    pub(crate) fn record_sink_failure() {
        metrics::counter!(Self::SINK_FAILURES_TOTAL).increment(1);
    }

    pub(crate) fn set_hot_entries(count: usize) {
        metrics::gauge!(Self::HOT_ENTRIES).set(count as f64);
    }

    pub(crate) fn set_cold_head(slot: u64) {
        metrics::gauge!(Self::COLD_HEAD_SLOT).set(slot as f64);
    }

    pub(crate) fn record_towards(transitions: u64) {
        metrics::histogram!(Self::TOWARDS_TRANSITIONS).record(transitions as f64);
    }
}
