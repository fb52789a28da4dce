//! Hierarchical basin matching
//!
//! Ottobacia codes nest by digits: each extra digit of a basin code
//! subdivides its parent, and a tributary's reach code starts with the code
//! of the watercourse it drains into. A catchment is upstream of (or equal
//! to) the seed when its reach code extends the seed's and its basin code,
//! compared at the seed's digit length, is not smaller.

use ottobasin_core::{Error, Result};

/// Truncate or right-pad (with `'0'`) a basin code to `length` digits and
/// parse it.
///
/// Surrounding whitespace is ignored. Normalizing a code that already has
/// `length` digits returns its plain integer value.
///
/// # Errors
/// `Error::InvalidBasinCode` when `length` is zero, the code contains a
/// non-digit within the compared prefix, or the value overflows `u64`.
pub fn normalize_basin_code(code: &str, length: usize, record: usize) -> Result<u64> {
    let invalid = |reason: String| Error::InvalidBasinCode {
        record,
        code: code.to_string(),
        reason,
    };

    if length == 0 {
        return Err(invalid("zero-length comparison".to_string()));
    }

    let mut digits: String = code.trim().chars().take(length).collect();
    let width = digits.chars().count();
    digits.extend(std::iter::repeat('0').take(length - width));

    if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(invalid(format!("non-digit character '{}'", c)));
    }

    digits
        .parse::<u64>()
        .map_err(|e| invalid(e.to_string()))
}

/// The catchment that contains the outlet, with its parsed codes
#[derive(Debug, Clone, PartialEq)]
pub struct SeedMatch {
    /// Position of the seed in the record source
    pub record: usize,
    pub reach_code: String,
    pub basin_code: String,
    /// `basin_code` as an integer
    pub basin_value: u64,
    /// Digit length every candidate basin code is normalized to
    pub code_length: usize,
    /// Area attribute of the seed itself, when an area field was requested
    pub area: Option<f64>,
}

impl SeedMatch {
    /// Build a seed from its raw codes.
    ///
    /// # Errors
    /// `Error::InvalidBasinCode` if the basin code is empty or not numeric.
    pub fn new(record: usize, reach_code: String, basin_code: String) -> Result<Self> {
        let basin_code = basin_code.trim().to_string();
        let code_length = basin_code.chars().count();
        let basin_value = normalize_basin_code(&basin_code, code_length, record)?;
        Ok(Self {
            record,
            reach_code,
            basin_code,
            basin_value,
            code_length,
            area: None,
        })
    }

    pub fn with_area(mut self, area: Option<f64>) -> Self {
        self.area = area;
        self
    }

    /// Whether a candidate catchment belongs to the seed's basin.
    ///
    /// The basin code is only parsed once the reach prefix matches, so
    /// unrelated records with odd basin codes do not raise errors.
    pub fn matches(&self, reach_code: &str, basin_code: &str, record: usize) -> Result<bool> {
        if !reach_code.starts_with(self.reach_code.as_str()) {
            return Ok(false);
        }
        let value = normalize_basin_code(basin_code, self.code_length, record)?;
        Ok(value >= self.basin_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(reach: &str, basin: &str) -> SeedMatch {
        SeedMatch::new(0, reach.to_string(), basin.to_string()).unwrap()
    }

    #[test]
    fn test_normalize_same_length_is_identity() {
        assert_eq!(normalize_basin_code("7614", 4, 0).unwrap(), 7614);
        let once = normalize_basin_code("0761", 4, 0).unwrap();
        assert_eq!(once, 761);
        assert_eq!(normalize_basin_code(&format!("{:04}", once), 4, 0).unwrap(), once);
    }

    #[test]
    fn test_normalize_truncates_longer_codes() {
        assert_eq!(normalize_basin_code("761459", 4, 0).unwrap(), 7614);
    }

    #[test]
    fn test_normalize_pads_shorter_codes() {
        assert_eq!(normalize_basin_code("76", 4, 0).unwrap(), 7600);
        assert_eq!(normalize_basin_code(" 76 ", 4, 0).unwrap(), 7600);
    }

    #[test]
    fn test_normalize_rejects_non_digits() {
        assert!(matches!(
            normalize_basin_code("76a4", 4, 3),
            Err(Error::InvalidBasinCode { record: 3, .. })
        ));
        // Junk beyond the compared prefix is never looked at
        assert_eq!(normalize_basin_code("7614-x", 4, 0).unwrap(), 7614);
    }

    #[test]
    fn test_normalize_rejects_zero_length_and_overflow() {
        assert!(normalize_basin_code("1", 0, 0).is_err());
        assert!(normalize_basin_code("99999999999999999999", 20, 0).is_err());
    }

    #[test]
    fn test_seed_rejects_empty_basin_code() {
        assert!(SeedMatch::new(0, "10".into(), "  ".into()).is_err());
    }

    #[test]
    fn test_matcher_reflexive() {
        let s = seed("7614", "76141");
        assert!(s.matches("7614", "76141", 0).unwrap());
    }

    #[test]
    fn test_matcher_requires_reach_prefix() {
        let s = seed("10", "100");
        assert!(s.matches("1012", "200", 1).unwrap());
        assert!(!s.matches("99", "500", 2).unwrap());
        assert!(!s.matches("1", "500", 3).unwrap());
    }

    #[test]
    fn test_matcher_basin_order() {
        let s = seed("10", "100");
        assert!(s.matches("10", "200", 1).unwrap());
        assert!(s.matches("10", "1001", 1).unwrap());
        assert!(!s.matches("10", "050", 1).unwrap());
        assert!(!s.matches("10", "0999", 1).unwrap());
    }

    #[test]
    fn test_matcher_zero_padding_ambiguity() {
        // "1" pads to "100" and is treated as equal to the seed
        let s = seed("10", "100");
        assert!(s.matches("10", "1", 1).unwrap());
    }

    #[test]
    fn test_matcher_skips_basin_parse_for_other_reaches() {
        let s = seed("10", "100");
        assert!(!s.matches("20", "not-a-code", 5).unwrap());
        assert!(s.matches("10", "not-a-code", 5).is_err());
    }
}
