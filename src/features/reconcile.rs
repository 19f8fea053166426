//! Feature Reconciler - request fields -> exact model row
//!
//! For each schema name, in order, the first matching rule wins:
//! 1. alias match (API field renamed at training time)
//! 2. direct numeric match
//! 3. one-hot reconstruction from a categorical string field
//! 4. named numeric default (`age`, `chronic_flag`)
//! 5. zero fallback
//!
//! Building never fails: anything unresolvable becomes `0.0`.

use super::layout::ModelSchema;
use super::request::PredictionRequest;
use super::vector::FeatureRow;

// ============================================================================
// STATIC TABLES
// ============================================================================

/// API field name -> fit-time feature name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAlias {
    pub api_field: &'static str,
    pub model_feature: &'static str,
}

/// Risk model renames
pub const RISK_FIELD_ALIASES: &[FieldAlias] = &[FieldAlias {
    api_field: "avg_length_of_stay_patient",
    model_feature: "avg_los_per_patient",
}];

/// Claim model renames
pub const CLAIM_FIELD_ALIASES: &[FieldAlias] = &[];

/// Optional clinical covariates some models were trained with
pub const NAMED_NUMERIC_DEFAULTS: &[&str] = &["age", "chronic_flag"];

// ============================================================================
// RECONCILIATION
// ============================================================================

/// Rule that produced a feature value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    Alias,
    Direct,
    OneHot,
    NamedDefault,
    ZeroFallback,
}

/// Build a row whose keys are exactly `schema`, in schema order
pub fn build(schema: &ModelSchema, request: &PredictionRequest, aliases: &[FieldAlias]) -> FeatureRow {
    let mut row = FeatureRow::with_capacity(schema.len());
    let mut one_hot = 0usize;
    let mut zero_filled = 0usize;

    for name in schema.iter() {
        let (value, source) = resolve_feature(name, request, aliases);
        match source {
            FeatureSource::OneHot => one_hot += 1,
            FeatureSource::ZeroFallback => zero_filled += 1,
            _ => {}
        }
        row.push(name, value);
    }

    tracing::debug!(
        features = row.len(),
        one_hot,
        zero_filled,
        "Reconciled request against model schema"
    );

    row
}

/// Degraded mode: every non-null request field, in key order
///
/// Numbers pass through, flags become 1.0/0.0, text becomes 0.0.
pub fn build_passthrough(request: &PredictionRequest) -> FeatureRow {
    let mut row = FeatureRow::with_capacity(request.len());
    for (name, value) in request.present() {
        row.push(name, value.coerce_numeric());
    }

    tracing::debug!(features = row.len(), "No model schema, passing raw request fields through");

    row
}

/// Resolve one schema name
pub fn resolve_feature(
    name: &str,
    request: &PredictionRequest,
    aliases: &[FieldAlias],
) -> (f64, FeatureSource) {
    // 1. renamed API field
    let aliased = aliases
        .iter()
        .filter(|a| a.model_feature == name)
        .find_map(|a| request.number(a.api_field));
    if let Some(value) = aliased {
        return (value, FeatureSource::Alias);
    }

    // 2. same name, numeric
    if let Some(value) = request.number(name) {
        return (value, FeatureSource::Direct);
    }

    // 3. prefix_suffix indicator
    if let Some(value) = one_hot(name, request) {
        return (value, FeatureSource::OneHot);
    }

    // 4. optional covariates
    if NAMED_NUMERIC_DEFAULTS.contains(&name) {
        let value = request
            .get(name)
            .and_then(|v| v.as_number_or_flag())
            .unwrap_or(0.0);
        return (value, FeatureSource::NamedDefault);
    }

    (0.0, FeatureSource::ZeroFallback)
}

/// One-hot value for `prefix_suffix`, if the request has a string `prefix`
///
/// Split points are tried from the rightmost underscore, so the longest
/// prefix naming a string field decides (`visit_type_Inpatient` checks
/// `visit_type` before `visit`).
fn one_hot(name: &str, request: &PredictionRequest) -> Option<f64> {
    name.char_indices()
        .rev()
        .filter(|&(_, c)| c == '_')
        .find_map(|(i, _)| {
            let (prefix, suffix) = (&name[..i], &name[i + 1..]);
            request.text(prefix).map(|value| {
                if normalize_category(suffix) == normalize_category(value) {
                    1.0
                } else {
                    0.0
                }
            })
        })
}

/// Lowercase, with underscores and spaces equivalent
pub fn normalize_category(s: &str) -> String {
    s.replace('_', " ").to_lowercase()
}
