//! Band selection

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which bands of a frame an operation works on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BandSelection {
    /// Every band, in frame order
    #[default]
    All,
    /// These bands, in this order
    Names(Vec<String>),
    /// Bands whose whole name matches a regular expression, in frame order
    Pattern(String),
}

impl BandSelection {
    /// Select a list of bands by name
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BandSelection::Names(names.into_iter().map(Into::into).collect())
    }

    /// Select a single band
    pub fn one(name: impl Into<String>) -> Self {
        BandSelection::Names(vec![name.into()])
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        BandSelection::Pattern(pattern.into())
    }

    /// Resolve the selection against the bands a frame carries.
    ///
    /// Explicit names must all exist; a pattern must match at least one band.
    pub fn resolve(&self, available: &[String]) -> Result<Vec<String>> {
        match self {
            BandSelection::All => Ok(available.to_vec()),
            BandSelection::Names(names) => {
                for name in names {
                    if !available.contains(name) {
                        return Err(Error::invalid_band(name.clone(), available.to_vec()));
                    }
                }
                Ok(names.clone())
            }
            BandSelection::Pattern(pattern) => {
                let matched = self.matching(available)?;
                if matched.is_empty() {
                    return Err(Error::invalid_band(pattern.clone(), available.to_vec()));
                }
                Ok(matched)
            }
        }
    }

    /// Like [`BandSelection::resolve`], but a pattern may match nothing
    pub fn matching(&self, available: &[String]) -> Result<Vec<String>> {
        let BandSelection::Pattern(pattern) = self else {
            return self.resolve(available);
        };
        let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| Error::InvalidParameter {
            name: "pattern",
            value: pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(available
            .iter()
            .filter(|name| re.is_match(name))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landsat_bands() -> Vec<String> {
        ["SR_B1", "SR_B2", "SR_B10", "ST_B10", "QA_PIXEL"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_all_keeps_order() {
        let bands = landsat_bands();
        assert_eq!(BandSelection::All.resolve(&bands).unwrap(), bands);
    }

    #[test]
    fn test_pattern_is_anchored() {
        let bands = landsat_bands();
        let optical = BandSelection::pattern("SR_B.").resolve(&bands).unwrap();
        assert_eq!(optical, vec!["SR_B1", "SR_B2"]);

        let thermal = BandSelection::pattern("ST_B.*").resolve(&bands).unwrap();
        assert_eq!(thermal, vec!["ST_B10"]);
    }

    #[test]
    fn test_missing_name() {
        let err = BandSelection::one("NDVI").resolve(&landsat_bands()).unwrap_err();
        assert!(matches!(err, Error::InvalidBand { ref band, .. } if band == "NDVI"));
    }

    #[test]
    fn test_pattern_without_match() {
        assert!(BandSelection::pattern("B.*").resolve(&landsat_bands()).is_err());
        assert!(BandSelection::pattern("(").resolve(&landsat_bands()).is_err());
        assert!(BandSelection::pattern("B.*").matching(&landsat_bands()).unwrap().is_empty());
        assert!(BandSelection::pattern("(").matching(&landsat_bands()).is_err());
    }
}
