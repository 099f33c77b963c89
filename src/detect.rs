use crate::error::SummaryError;
use crate::payload::Node;
use crate::summary::MatchType;
use serde::Serialize;
use serde_json::Value;

/// Wire shape of an incoming match payload, decided purely from its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaVariant {
    Legacy,
    Unified,
    Unrecognized,
}

/// A payload paired with the shape it was classified as. Only recognized
/// shapes can be built, so normalization never sees `Unrecognized`.
#[derive(Debug, Clone, Copy)]
pub enum MatchPayload<'a> {
    Legacy(&'a Value),
    Unified(&'a Value),
}

impl<'a> MatchPayload<'a> {
    pub fn variant(&self) -> SchemaVariant {
        match self {
            MatchPayload::Legacy(_) => SchemaVariant::Legacy,
            MatchPayload::Unified(_) => SchemaVariant::Unified,
        }
    }

    pub fn value(&self) -> &'a Value {
        match self {
            MatchPayload::Legacy(value) | MatchPayload::Unified(value) => *value,
        }
    }
}

/// Unified needs `participants` plus a `score.server.current` key; an
/// explicit `null` counts, a missing key does not.
pub fn is_unified(payload: &Value) -> bool {
    let root = Node::root(payload);
    root.opt("participants").is_some()
        && root
            .opt("score")
            .and_then(|score| score.opt("server"))
            .map(|server| server.has_key("current"))
            .unwrap_or(false)
}

/// Legacy needs a `meta.type` of `"Game"`/`"Tiebreak"` and no `participants`;
/// a `null` value counts as absent, matching `is_unified`.
pub fn is_legacy(payload: &Value) -> bool {
    let root = Node::root(payload);
    let has_point_type = root
        .opt("meta")
        .and_then(|meta| meta.opt("type"))
        .and_then(|kind| kind.value().as_str().map(|raw| raw == "Game" || raw == "Tiebreak"))
        .unwrap_or(false);
    has_point_type && root.opt("participants").is_none()
}

pub fn detect_variant(payload: &Value) -> SchemaVariant {
    let variant = if is_unified(payload) {
        SchemaVariant::Unified
    } else if is_legacy(payload) {
        SchemaVariant::Legacy
    } else {
        SchemaVariant::Unrecognized
    };
    tracing::debug!(?variant, "classified match payload");
    variant
}

/// Classifies and pairs the payload with its variant, rejecting unknown shapes.
pub fn classify(payload: &Value) -> Result<MatchPayload<'_>, SummaryError> {
    match detect_variant(payload) {
        SchemaVariant::Legacy => Ok(MatchPayload::Legacy(payload)),
        SchemaVariant::Unified => Ok(MatchPayload::Unified(payload)),
        SchemaVariant::Unrecognized => Err(unrecognized_reason(payload)),
    }
}

/// Pairs a payload with a caller-asserted variant, re-checking the shape so a
/// wrong assertion fails instead of being mapped.
pub fn assert_variant(payload: &Value, variant: SchemaVariant) -> Result<MatchPayload<'_>, SummaryError> {
    match variant {
        SchemaVariant::Legacy if is_legacy(payload) => Ok(MatchPayload::Legacy(payload)),
        SchemaVariant::Unified if is_unified(payload) => Ok(MatchPayload::Unified(payload)),
        SchemaVariant::Unrecognized => Err(unrecognized_reason(payload)),
        asserted => Err(SummaryError::unrecognized(format!(
            "payload does not have the {asserted:?} shape (detected {:?})",
            detect_variant(payload)
        ))),
    }
}

fn unrecognized_reason(payload: &Value) -> SummaryError {
    if !payload.is_object() {
        return SummaryError::unrecognized("payload is not an object");
    }
    let root = Node::root(payload);
    if root.opt("participants").is_some() {
        SummaryError::unrecognized("participants present but score.server.current is missing")
    } else {
        SummaryError::unrecognized("neither meta.type nor participants is present")
    }
}

/// Legacy match type: only the exact literal `"doubles"` selects doubles,
/// anything else (including absence) is singles.
pub fn legacy_match_type(payload: &Value) -> MatchType {
    let raw = Node::root(payload)
        .opt("meta")
        .and_then(|meta| meta.opt("matchType"))
        .and_then(|kind| kind.value().as_str());
    match raw {
        Some("doubles") => MatchType::Doubles,
        _ => MatchType::Singles,
    }
}
