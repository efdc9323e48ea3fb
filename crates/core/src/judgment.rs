//! Reviewer judgments: a rating choice plus a relation code.
//!
//! Ratings are the strings `"0"` through `"4"`. Relations are the single-letter
//! codes E(xact), S(ubstitute), C(omplement), I(rrelevant); the full words are
//! accepted case-insensitively and normalized to the letter code.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// All valid rating strings, in ascending order.
pub const VALID_RATINGS: &[&str] = &["0", "1", "2", "3", "4"];

/// Reviewer rating on the 0..=4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 4;

    /// Parse a rating from its string form. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        match VALID_RATINGS.iter().position(|r| *r == trimmed) {
            Some(idx) => Ok(Self(idx as u8)),
            None => Err(CoreError::Validation(format!(
                "rating must be one of {VALID_RATINGS:?}, got '{trimmed}'"
            ))),
        }
    }

    /// Build a rating from an integer, rejecting anything outside 0..=4.
    pub fn from_number(n: i64) -> Result<Self, CoreError> {
        if (0..=i64::from(Self::MAX)).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(CoreError::Validation(format!(
                "rating must be 0..{}, got {n}",
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The wire form sent as the backend choice.
    pub fn as_str(self) -> &'static str {
        VALID_RATINGS[self.0 as usize]
    }
}

impl Serialize for Rating {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// Relation between a query and an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Exact,
    Substitute,
    Complement,
    Irrelevant,
}

/// All valid relation codes.
pub const VALID_RELATION_CODES: &[&str] = &["E", "S", "C", "I"];

impl Relation {
    /// Single-letter code used on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Self::Exact => "E",
            Self::Substitute => "S",
            Self::Complement => "C",
            Self::Irrelevant => "I",
        }
    }

    /// Parse a relation from a code or full word, case-insensitively.
    ///
    /// Unrecognized input is rejected; there is no default relation.
    pub fn normalize(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "E" | "EXACT" => Ok(Self::Exact),
            "S" | "SUBSTITUTE" => Ok(Self::Substitute),
            "C" | "COMPLEMENT" => Ok(Self::Complement),
            "I" | "IRRELEVANT" => Ok(Self::Irrelevant),
            other => Err(CoreError::Validation(format!(
                "relation must be one of {VALID_RELATION_CODES:?}, got '{other}'"
            ))),
        }
    }
}

impl Serialize for Relation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Normalize a relation string to its single-letter code.
pub fn normalize_relation(s: &str) -> Result<&'static str, CoreError> {
    Relation::normalize(s).map(Relation::code)
}

// ---------------------------------------------------------------------------
// Judgment
// ---------------------------------------------------------------------------

/// A validated rating/relation pair, ready to be written to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Judgment {
    pub rating: Rating,
    pub relation: Relation,
}

impl Judgment {
    /// Validate raw reviewer input. The rating is checked first.
    pub fn parse(rating: &str, relation: &str) -> Result<Self, CoreError> {
        Ok(Self {
            rating: Rating::parse(rating)?,
            relation: Relation::normalize(relation)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_exactly_zero_through_four() {
        for (i, s) in VALID_RATINGS.iter().enumerate() {
            let rating = Rating::parse(s).unwrap();
            assert_eq!(rating.value() as usize, i);
            assert_eq!(rating.as_str(), *s);
        }
    }

    #[test]
    fn rating_rejects_out_of_range_and_garbage() {
        for bad in ["5", "-1", "abc", "", "1.0", "04"] {
            assert!(Rating::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rating_ignores_surrounding_whitespace() {
        assert_eq!(Rating::parse(" 3 ").unwrap().as_str(), "3");
    }

    #[test]
    fn rating_from_number_bounds() {
        assert!(Rating::from_number(0).is_ok());
        assert!(Rating::from_number(4).is_ok());
        assert!(Rating::from_number(5).is_err());
        assert!(Rating::from_number(-1).is_err());
    }

    #[test]
    fn relation_normalization_is_case_insensitive() {
        assert_eq!(normalize_relation("exact").unwrap(), "E");
        assert_eq!(normalize_relation("EXACT").unwrap(), "E");
        assert_eq!(normalize_relation("E").unwrap(), "E");
        assert_eq!(normalize_relation("e").unwrap(), "E");
        assert_eq!(normalize_relation("Substitute").unwrap(), "S");
        assert_eq!(normalize_relation("complement").unwrap(), "C");
        assert_eq!(normalize_relation(" irrelevant ").unwrap(), "I");
    }

    #[test]
    fn relation_normalization_is_idempotent() {
        for code in VALID_RELATION_CODES {
            let once = normalize_relation(code).unwrap();
            assert_eq!(normalize_relation(once).unwrap(), once);
        }
    }

    #[test]
    fn unknown_relation_is_rejected() {
        let err = normalize_relation("related").unwrap_err();
        assert!(err.to_string().contains("relation must be one of"));
        assert!(normalize_relation("").is_err());
        assert!(normalize_relation("X").is_err());
    }

    #[test]
    fn judgment_serializes_to_wire_codes() {
        let judgment = Judgment::parse("2", "substitute").unwrap();
        let json = serde_json::to_value(judgment).unwrap();
        assert_eq!(json, serde_json::json!({"rating": "2", "relation": "S"}));
    }
}
