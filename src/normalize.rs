use crate::detect::{assert_variant, classify, MatchPayload, SchemaVariant};
use crate::error::SummaryError;
use crate::legacy::normalize_legacy;
use crate::summary::MatchSummary;
use crate::unified::{normalize_unified, to_unified_value};
use serde_json::Value;

/// Normalizes a payload the caller has already classified. The shape is
/// re-checked, so passing the wrong variant fails instead of mis-mapping.
pub fn normalize(payload: &Value, variant: SchemaVariant) -> Result<MatchSummary, SummaryError> {
    normalize_classified(assert_variant(payload, variant)?)
}

/// Detects the wire shape and normalizes in one step.
pub fn normalize_payload(payload: &Value) -> Result<MatchSummary, SummaryError> {
    let classified = classify(payload).map_err(|err| {
        tracing::warn!("rejected match payload: {err}");
        err
    })?;
    normalize_classified(classified)
}

pub fn normalize_classified(payload: MatchPayload<'_>) -> Result<MatchSummary, SummaryError> {
    let result = match payload {
        MatchPayload::Legacy(value) => normalize_legacy(value),
        MatchPayload::Unified(value) => normalize_unified(value),
    };
    if let Err(err) = &result {
        tracing::warn!(variant = ?payload.variant(), "match payload failed validation: {err}");
    }
    result
}

/// Canonical summary written in the unified wire shape; feeding it back
/// through `normalize_payload` reproduces the same summary.
pub fn canonicalize(summary: &MatchSummary) -> Value {
    to_unified_value(summary)
}

/// Upgrades any accepted payload to the unified wire shape.
pub fn migrate_to_unified(payload: &Value) -> Result<Value, SummaryError> {
    normalize_payload(payload).map(|summary| canonicalize(&summary))
}
