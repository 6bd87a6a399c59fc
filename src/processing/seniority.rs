//! Seniority signals from years of experience and title keywords

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_PLAUSIBLE_YEARS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityTier {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl SeniorityTier {
    pub fn rank(self) -> u8 {
        match self {
            SeniorityTier::Entry => 0,
            SeniorityTier::Mid => 1,
            SeniorityTier::Senior => 2,
            SeniorityTier::Lead => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeniorityTier::Entry => "entry",
            SeniorityTier::Mid => "mid",
            SeniorityTier::Senior => "senior",
            SeniorityTier::Lead => "lead",
        }
    }

    /// `thresholds` are the years at which mid, senior and lead start
    pub fn from_years(years: u32, thresholds: [u32; 3]) -> Self {
        if years >= thresholds[2] {
            SeniorityTier::Lead
        } else if years >= thresholds[1] {
            SeniorityTier::Senior
        } else if years >= thresholds[0] {
            SeniorityTier::Mid
        } else {
            SeniorityTier::Entry
        }
    }
}

impl fmt::Display for SeniorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenioritySignal {
    /// Combined tier, the higher of the keyword and years readings
    pub tier: Option<SeniorityTier>,
    pub years: Option<u32>,
    pub keyword_tier: Option<SeniorityTier>,
}

impl SenioritySignal {
    pub fn is_empty(&self) -> bool {
        self.tier.is_none()
    }

    /// Strongest reading of both signals
    pub fn merge(self, other: SenioritySignal) -> SenioritySignal {
        SenioritySignal {
            tier: self.tier.max(other.tier),
            years: self.years.max(other.years),
            keyword_tier: self.keyword_tier.max(other.keyword_tier),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeniorityDetector {
    years_pattern: Regex,
    tier_patterns: Vec<(SeniorityTier, Regex)>,
    year_thresholds: [u32; 3],
}

impl SeniorityDetector {
    pub fn new(year_thresholds: [u32; 3]) -> Self {
        let tier_patterns = vec![
            (
                SeniorityTier::Lead,
                Regex::new(r"(?i)\b(?:lead|staff|principal|architect|head\s+of|director|vp)\b")
                    .expect("valid lead regex"),
            ),
            (
                SeniorityTier::Senior,
                Regex::new(r"(?i)\b(?:senior|sr|expert)\b").expect("valid senior regex"),
            ),
            (
                SeniorityTier::Mid,
                Regex::new(r"(?i)\b(?:mid|mid-level|intermediate)\b").expect("valid mid regex"),
            ),
            (
                SeniorityTier::Entry,
                Regex::new(r"(?i)\b(?:junior|jr|entry[\s-]level|graduate|intern|internship)\b")
                    .expect("valid entry regex"),
            ),
        ];

        Self {
            years_pattern: Regex::new(
                r"(?i)\b(\d{1,2})\s*\+?\s*(?:-\s*\d{1,2}\s*)?(?:years?|yrs?)\b",
            )
            .expect("valid years regex"),
            tier_patterns,
            year_thresholds,
        }
    }

    pub fn detect(&self, text: &str) -> SenioritySignal {
        let years = self
            .years_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .filter(|&y| y > 0 && y <= MAX_PLAUSIBLE_YEARS)
            .max();

        let keyword_tier = self
            .tier_patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(tier, _)| *tier);

        let years_tier = years.map(|y| SeniorityTier::from_years(y, self.year_thresholds));

        SenioritySignal {
            tier: keyword_tier.max(years_tier),
            years,
            keyword_tier,
        }
    }
}

impl Default for SeniorityDetector {
    fn default() -> Self {
        Self::new([2, 5, 8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_years_map_to_tiers() {
        let thresholds = [2, 5, 8];
        assert_eq!(SeniorityTier::from_years(0, thresholds), SeniorityTier::Entry);
        assert_eq!(SeniorityTier::from_years(3, thresholds), SeniorityTier::Mid);
        assert_eq!(SeniorityTier::from_years(5, thresholds), SeniorityTier::Senior);
        assert_eq!(SeniorityTier::from_years(12, thresholds), SeniorityTier::Lead);
    }

    #[test]
    fn test_detect_years_takes_maximum() {
        let detector = SeniorityDetector::default();
        let signal = detector.detect("3 years of Python, 6+ yrs of backend work, 2-4 years Go");
        assert_eq!(signal.years, Some(6));
        assert_eq!(signal.tier, Some(SeniorityTier::Senior));
    }

    #[test]
    fn test_detect_keywords() {
        let detector = SeniorityDetector::default();
        assert_eq!(
            detector.detect("Staff Engineer, platform").keyword_tier,
            Some(SeniorityTier::Lead)
        );
        assert_eq!(
            detector.detect("Sr. Backend Developer").keyword_tier,
            Some(SeniorityTier::Senior)
        );
        assert_eq!(
            detector.detect("Junior developer role").tier,
            Some(SeniorityTier::Entry)
        );
    }

    #[test]
    fn test_keyword_and_years_take_higher_tier() {
        let detector = SeniorityDetector::default();
        let signal = detector.detect("Junior engineer with 6 years of experience");
        assert_eq!(signal.keyword_tier, Some(SeniorityTier::Entry));
        assert_eq!(signal.tier, Some(SeniorityTier::Senior));
    }

    #[test]
    fn test_no_signal() {
        let detector = SeniorityDetector::default();
        let signal = detector.detect("We build software with Rust and Python.");
        assert!(signal.is_empty());
        assert_eq!(signal.years, None);
    }

    #[test]
    fn test_implausible_years_ignored() {
        let detector = SeniorityDetector::default();
        assert_eq!(detector.detect("Founded 99 years ago").years, None);
    }

    #[test]
    fn test_merge_keeps_strongest() {
        let a = SenioritySignal {
            tier: Some(SeniorityTier::Mid),
            years: Some(3),
            keyword_tier: None,
        };
        let b = SenioritySignal {
            tier: Some(SeniorityTier::Senior),
            years: None,
            keyword_tier: Some(SeniorityTier::Senior),
        };
        let merged = a.merge(b);
        assert_eq!(merged.tier, Some(SeniorityTier::Senior));
        assert_eq!(merged.years, Some(3));
    }
}
