//! Two-threshold acceptance rule.

use dotqc_core::{ClassifierConfig, Label, Metrics};

/// Label a distribution from its largest cluster and its uniformity.
///
/// `A` iff `max_cluster < max_cluster_threshold` and
/// `uniformity >= uniformity_threshold`; a NaN uniformity is never acceptable.
#[must_use]
pub fn classify(max_cluster: usize, uniformity: f64, config: &ClassifierConfig) -> Label {
    if max_cluster < config.max_cluster_threshold && uniformity >= config.uniformity_threshold {
        Label::A
    } else {
        Label::B
    }
}

/// [`classify`] applied to a metrics record.
#[must_use]
pub fn classify_metrics(metrics: &Metrics, config: &ClassifierConfig) -> Label {
    classify(metrics.max_cluster, metrics.uniformity, config)
}
