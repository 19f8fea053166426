//! Label Normalizer - raw model label -> canonical vocabulary
//!
//! Total: every input maps to a member of the kind's vocabulary. Labels
//! outside the alias table fall to the least severe answer and are
//! reported with `recognized == false`.

use super::kind::{CanonicalLabel, ClaimStatus, ModelKind, RiskScore};

/// Normalized label plus whether the raw label was in the alias table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedLabel {
    pub label: CanonicalLabel,
    pub recognized: bool,
}

pub fn normalize(kind: ModelKind, raw: &str) -> NormalizedLabel {
    let s = raw.trim().to_lowercase();

    let matched = match kind {
        ModelKind::Risk => match s.as_str() {
            "high" | "2" => Some(CanonicalLabel::Risk(RiskScore::High)),
            "medium" | "mid" | "1" => Some(CanonicalLabel::Risk(RiskScore::Medium)),
            "low" | "0" => Some(CanonicalLabel::Risk(RiskScore::Low)),
            _ => None,
        },
        ModelKind::Claim => match s.as_str() {
            "rejected" | "reject" => Some(CanonicalLabel::Claim(ClaimStatus::Rejected)),
            "paid" | "accept" => Some(CanonicalLabel::Claim(ClaimStatus::Paid)),
            "pending" => Some(CanonicalLabel::Claim(ClaimStatus::Pending)),
            _ => None,
        },
    };

    match matched {
        Some(label) => NormalizedLabel { label, recognized: true },
        None => NormalizedLabel {
            label: kind.fallback_label(),
            recognized: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_alias_labels() {
        assert_eq!(normalize(ModelKind::Risk, "2").label, CanonicalLabel::Risk(RiskScore::High));
        assert_eq!(normalize(ModelKind::Risk, "1").label, CanonicalLabel::Risk(RiskScore::Medium));
        assert_eq!(normalize(ModelKind::Risk, "mid").label, CanonicalLabel::Risk(RiskScore::Medium));
        assert_eq!(normalize(ModelKind::Claim, "reject").label, CanonicalLabel::Claim(ClaimStatus::Rejected));
        assert_eq!(normalize(ModelKind::Claim, "accept").label, CanonicalLabel::Claim(ClaimStatus::Paid));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let n = normalize(ModelKind::Risk, "  HIGH\n");
        assert_eq!(n.label, CanonicalLabel::Risk(RiskScore::High));
        assert!(n.recognized);

        assert_eq!(normalize(ModelKind::Claim, "Paid ").label.as_str(), "Paid");
    }

    #[test]
    fn test_unrecognized_falls_back_and_is_flagged() {
        let n = normalize(ModelKind::Risk, "critical");
        assert_eq!(n.label, CanonicalLabel::Risk(RiskScore::Low));
        assert!(!n.recognized);

        let n = normalize(ModelKind::Claim, "2");
        assert_eq!(n.label, CanonicalLabel::Claim(ClaimStatus::Pending));
        assert!(!n.recognized);
    }

    #[test]
    fn test_genuine_low_is_recognized() {
        assert!(normalize(ModelKind::Risk, "Low").recognized);
        assert!(normalize(ModelKind::Risk, "0").recognized);
        assert!(normalize(ModelKind::Claim, "pending").recognized);
    }

    #[test]
    fn test_totality() {
        let inputs = ["", " ", "HIGH", "2.0", "null", "Rejected", "ünïcödé", "-1", "medium risk"];

        for kind in ModelKind::ALL {
            for raw in inputs {
                let n = normalize(kind, raw);
                assert_eq!(n.label.kind(), kind, "{:?} {:?}", kind, raw);
            }
        }
    }
}
