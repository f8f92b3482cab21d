use crate::boolean::BooleanParser;
use crate::error::RowViolation;
use crate::ingest::RawRow;
use crate::store::NewBusinessSymptom;

use super::{DiagnosticPolicy, RaggedRows};

pub const BUSINESS_ID: &str = "Business ID";
pub const BUSINESS_NAME: &str = "Business Name";
pub const SYMPTOM_CODE: &str = "Symptom Code";
pub const SYMPTOM_NAME: &str = "Symptom Name";
pub const SYMPTOM_DIAGNOSTIC: &str = "Symptom Diagnostic";

/// Required columns, in the order their violations are reported.
pub const REQUIRED: [&str; 4] = [BUSINESS_ID, BUSINESS_NAME, SYMPTOM_CODE, SYMPTOM_NAME];

const MAX_BUSINESS_NAME: usize = 30;
const MAX_SYMPTOM_CODE: usize = 15;
const MAX_SYMPTOM_NAME: usize = 30;

/// Per-row rules; everything a row broke is collected, not just the first.
pub struct RowValidator {
    pub parser: BooleanParser,
    pub diagnostic: DiagnosticPolicy,
    pub ragged_rows: RaggedRows,
}

impl RowValidator {
    pub fn validate(&self, row: &RawRow) -> Result<NewBusinessSymptom, Vec<RowViolation>> {
        let mut violations = Vec::new();

        if self.ragged_rows == RaggedRows::Reject && !row.is_complete() {
            violations.push(RowViolation::FieldCount {
                found: row.found,
                expected: row.expected,
            });
        }

        let field = |name: &str| row.get(name).map(str::trim).filter(|v| !v.is_empty());

        let [business_id, business_name, symptom_code, symptom_name] = REQUIRED.map(field);
        for (name, value) in REQUIRED
            .into_iter()
            .zip([business_id, business_name, symptom_code, symptom_name])
        {
            if value.is_none() {
                violations.push(RowViolation::MissingField(name));
            }
        }

        let business_id = business_id.and_then(|raw| match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                violations.push(RowViolation::InvalidBusinessId {
                    field: BUSINESS_ID,
                    value: raw.to_string(),
                });
                None
            }
        });

        for (name, value, max) in [
            (BUSINESS_NAME, business_name, MAX_BUSINESS_NAME),
            (SYMPTOM_CODE, symptom_code, MAX_SYMPTOM_CODE),
            (SYMPTOM_NAME, symptom_name, MAX_SYMPTOM_NAME),
        ] {
            if let Some(v) = value {
                let len = v.chars().count();
                if len > max {
                    violations.push(RowViolation::TooLong {
                        field: name,
                        len,
                        max,
                    });
                }
            }
        }

        let diagnostic = match field(SYMPTOM_DIAGNOSTIC) {
            Some(raw) => match self.parser.parse(raw) {
                Ok(parsed) => Some((raw.to_string(), parsed)),
                Err(source) => {
                    violations.push(RowViolation::UnrecognizedBoolean {
                        field: SYMPTOM_DIAGNOSTIC,
                        source,
                    });
                    None
                }
            },
            None => {
                if self.diagnostic == DiagnosticPolicy::Required {
                    violations.push(RowViolation::MissingField(SYMPTOM_DIAGNOSTIC));
                }
                None
            }
        };

        // every None above pushed a violation
        let (Some(business_id), Some(business_name), Some(symptom_code), Some(symptom_name), true) = (
            business_id,
            business_name,
            symptom_code,
            symptom_name,
            violations.is_empty(),
        ) else {
            return Err(violations);
        };

        let (symptom_diagnostic_raw, symptom_diagnostic) = match diagnostic {
            Some((raw, parsed)) => (Some(raw), Some(parsed)),
            None => (None, None),
        };
        Ok(NewBusinessSymptom {
            business_id,
            business_name: business_name.to_string(),
            symptom_code: symptom_code.to_string(),
            symptom_name: symptom_name.to_string(),
            symptom_diagnostic_raw,
            symptom_diagnostic,
        })
    }
}

/// The per-row message surfaced to callers: where the row was, what it held,
/// and every rule it broke.
pub fn format_row_error(row: &RawRow, violations: &[RowViolation]) -> String {
    let listed = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!("row {}: {}: {}", row.line, row, listed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::BooleanVocabulary;

    fn row(values: &[(&str, &str)], expected: usize) -> RawRow {
        RawRow {
            line: 2,
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            found: values.len(),
            expected,
        }
    }

    fn full(diag: &str) -> RawRow {
        row(
            &[
                (BUSINESS_ID, "1004"),
                (BUSINESS_NAME, " Acme Bakery "),
                (SYMPTOM_CODE, "SYMPT01"),
                (SYMPTOM_NAME, "Stale Bread"),
                (SYMPTOM_DIAGNOSTIC, diag),
            ],
            5,
        )
    }

    fn validator(vocabulary: BooleanVocabulary, diagnostic: DiagnosticPolicy) -> RowValidator {
        RowValidator {
            parser: BooleanParser::new(vocabulary),
            diagnostic,
            ragged_rows: RaggedRows::Reject,
        }
    }

    #[test]
    fn valid_row_becomes_record() {
        let v = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Required);
        let rec = v.validate(&full("Yes")).unwrap();
        assert_eq!(rec.business_id, 1004);
        assert_eq!(rec.business_name, "Acme Bakery");
        assert_eq!(rec.symptom_diagnostic_raw.as_deref(), Some("Yes"));
        assert_eq!(rec.symptom_diagnostic, Some(true));
    }

    #[test]
    fn collects_every_missing_field() {
        let v = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Required);
        let r = row(
            &[
                (BUSINESS_ID, "1004"),
                (BUSINESS_NAME, ""),
                (SYMPTOM_CODE, "  "),
                (SYMPTOM_NAME, "Stale Bread"),
                (SYMPTOM_DIAGNOSTIC, "maybe"),
            ],
            5,
        );
        let errs = v.validate(&r).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0], RowViolation::MissingField(BUSINESS_NAME));
        assert_eq!(errs[1], RowViolation::MissingField(SYMPTOM_CODE));
        assert!(matches!(errs[2], RowViolation::UnrecognizedBoolean { .. }));

        let msg = format_row_error(&r, &errs);
        assert!(msg.starts_with("row 2: {Business ID: 1004, "), "{msg}");
        assert!(msg.contains("does not contain Business Name"), "{msg}");
        assert!(msg.contains("does not contain Symptom Code"), "{msg}");
    }

    #[test]
    fn bad_is_only_valid_in_extended_vocabulary() {
        let standard = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Required);
        let extended = validator(BooleanVocabulary::Extended, DiagnosticPolicy::Required);
        assert!(standard.validate(&full("Bad")).is_err());
        assert_eq!(
            extended.validate(&full("Bad")).unwrap().symptom_diagnostic,
            Some(true)
        );
    }

    #[test]
    fn missing_diagnostic_depends_on_policy() {
        let r = row(
            &[
                (BUSINESS_ID, "7"),
                (BUSINESS_NAME, "Acme"),
                (SYMPTOM_CODE, "S1"),
                (SYMPTOM_NAME, "Cough"),
            ],
            4,
        );
        let required = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Required);
        assert_eq!(
            required.validate(&r).unwrap_err(),
            vec![RowViolation::MissingField(SYMPTOM_DIAGNOSTIC)]
        );

        let optional = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Optional);
        let rec = optional.validate(&r).unwrap();
        assert_eq!(rec.symptom_diagnostic, None);
        assert_eq!(rec.symptom_diagnostic_raw, None);
    }

    #[test]
    fn business_id_and_lengths_are_checked() {
        let v = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Required);
        let r = row(
            &[
                (BUSINESS_ID, "10x4"),
                (BUSINESS_NAME, "Acme"),
                (SYMPTOM_CODE, "A-VERY-LONG-SYMPTOM-CODE"),
                (SYMPTOM_NAME, "Cough"),
                (SYMPTOM_DIAGNOSTIC, "no"),
            ],
            5,
        );
        let errs = v.validate(&r).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(matches!(errs[0], RowViolation::InvalidBusinessId { .. }));
        assert_eq!(
            errs[1],
            RowViolation::TooLong {
                field: SYMPTOM_CODE,
                len: 24,
                max: 15
            }
        );
    }

    #[test]
    fn bad_business_id_is_the_only_violation() {
        let v = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Required);
        let mut r = full("yes");
        r.values[0].1 = "abc".to_string();
        assert_eq!(
            v.validate(&r).unwrap_err(),
            vec![RowViolation::InvalidBusinessId {
                field: BUSINESS_ID,
                value: "abc".to_string()
            }]
        );
    }

    #[test]
    fn ragged_policy() {
        let short = row(
            &[
                (BUSINESS_ID, "7"),
                (BUSINESS_NAME, "Acme"),
                (SYMPTOM_CODE, "S1"),
                (SYMPTOM_NAME, "Cough"),
            ],
            5,
        );
        let mut v = validator(BooleanVocabulary::Standard, DiagnosticPolicy::Optional);
        assert_eq!(
            v.validate(&short).unwrap_err(),
            vec![RowViolation::FieldCount {
                found: 4,
                expected: 5
            }]
        );

        v.ragged_rows = RaggedRows::Pad;
        assert!(v.validate(&short).is_ok());
    }
}
