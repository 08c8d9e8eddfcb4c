use crate::domain::model::TimeValue;
use crate::utils::error::{ImportError, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// 支援的五種時間粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeDomain {
    #[default]
    Year,
    Decade,
    QuarterCentury,
    HalfCentury,
    Century,
}

impl TimeDomain {
    pub const ALL: [TimeDomain; 5] = [
        TimeDomain::Year,
        TimeDomain::Decade,
        TimeDomain::QuarterCentury,
        TimeDomain::HalfCentury,
        TimeDomain::Century,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeDomain::Year => "year",
            TimeDomain::Decade => "decade",
            TimeDomain::QuarterCentury => "quarter century",
            TimeDomain::HalfCentury => "half century",
            TimeDomain::Century => "century",
        }
    }
}

impl fmt::Display for TimeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeDomain {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "year" => Ok(TimeDomain::Year),
            "decade" => Ok(TimeDomain::Decade),
            "quarter century" => Ok(TimeDomain::QuarterCentury),
            "half century" => Ok(TimeDomain::HalfCentury),
            "century" => Ok(TimeDomain::Century),
            _ => Err(ImportError::InvalidConfigValueError {
                field: "time_domain".to_string(),
                value: s.to_string(),
                reason: "Expected one of: year, decade, quarter century, half century, century"
                    .to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TimeDomain {
    type Error = ImportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeDomain> for String {
    fn from(value: TimeDomain) -> Self {
        value.as_str().to_string()
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-]?\d+)(?:\.0+)?\s*(bce|bc|ad|ce)?$").expect("valid year regex"))
}

fn decade_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(-?\d+)(?:\.0+)?(?:'?s)?$").expect("valid decade regex"))
}

fn century_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:the\s+)?(\d+)(?:st|nd|rd|th)?(?:\s+century)?$").expect("valid century regex")
    })
}

fn quarter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(1st|2nd|3rd|4th|first|second|third|fourth)\s+quarter\s+of\s+(?:the\s+)?(\d+)(?:st|nd|rd|th)?\s+century$",
        )
        .expect("valid quarter century regex")
    })
}

fn half_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(1st|2nd|first|second)\s+half\s+of\s+(?:the\s+)?(\d+)(?:st|nd|rd|th)?\s+century$")
            .expect("valid half century regex")
    })
}

fn ordinal_index(word: &str) -> i32 {
    match word {
        "1st" | "first" => 1,
        "2nd" | "second" => 2,
        "3rd" | "third" => 3,
        _ => 4,
    }
}

fn label_error(label: &str, domain: TimeDomain, reason: impl Into<String>) -> ImportError {
    ImportError::TimeLabelError {
        label: label.to_string(),
        domain: domain.to_string(),
        reason: reason.into(),
    }
}

// chrono 支援的年份約在 ±262143 之內
const MAX_ABS_NUMBER: i32 = 300_000;

fn parse_number(label: &str, domain: TimeDomain, digits: &str) -> Result<i32> {
    digits
        .parse::<i32>()
        .ok()
        .filter(|n| n.abs() <= MAX_ABS_NUMBER)
        .ok_or_else(|| label_error(label, domain, "number is out of range"))
}

fn format_date(label: &str, domain: TimeDomain, year: i32, month: u32, day: u32) -> Result<String> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| label_error(label, domain, format!("year {} is outside the supported calendar", year)))
}

/// 將起訖年份轉為 TimeValue，d 等於起始日期
fn period(label: &str, domain: TimeDomain, start_year: i32, end_year: i32) -> Result<TimeValue> {
    let sd = format_date(label, domain, start_year, 1, 1)?;
    let ed = format_date(label, domain, end_year, 12, 31)?;
    Ok(TimeValue {
        d: sd.clone(),
        l: label.to_string(),
        sd: Some(sd),
        ed: Some(ed),
        td: domain.to_string(),
    })
}

fn century_start(label: &str, domain: TimeDomain, digits: &str) -> Result<i32> {
    let century = parse_number(label, domain, digits)?;
    if century < 1 {
        return Err(label_error(label, domain, "centuries are counted from 1"));
    }
    Ok((century - 1) * 100)
}

/// Checks `label` against `domain` and buckets it into a start/end date pair.
pub fn validate_time(label: &str, domain: TimeDomain) -> Result<TimeValue> {
    let original = label.trim();
    if original.is_empty() {
        return Err(label_error(label, domain, "time label is empty"));
    }
    let normalized = original.to_lowercase();

    match domain {
        TimeDomain::Year => {
            let caps = year_re()
                .captures(&normalized)
                .ok_or_else(|| label_error(original, domain, "expected a year such as 1990 or 500 BC"))?;
            let mut year = parse_number(original, domain, caps[1].trim_start_matches('+'))?;
            match caps.get(2).map(|m| m.as_str()) {
                Some("bc") | Some("bce") => {
                    if year <= 0 {
                        return Err(label_error(original, domain, "BC years must be positive"));
                    }
                    year = -year;
                }
                Some(_) if year <= 0 => {
                    return Err(label_error(original, domain, "AD years must be positive"));
                }
                _ => {}
            }
            period(original, domain, year, year)
        }
        TimeDomain::Decade => {
            let caps = decade_re()
                .captures(&normalized)
                .ok_or_else(|| label_error(original, domain, "expected a decade such as 1990s"))?;
            let start = parse_number(original, domain, &caps[1])?;
            if start % 10 != 0 {
                return Err(label_error(original, domain, "decades start on a year divisible by 10"));
            }
            period(original, domain, start, start + 9)
        }
        TimeDomain::QuarterCentury => {
            let caps = quarter_re().captures(&normalized).ok_or_else(|| {
                label_error(original, domain, "expected a label such as '2nd quarter of the 20th century'")
            })?;
            let quarter = ordinal_index(&caps[1]);
            let start = century_start(original, domain, &caps[2])? + (quarter - 1) * 25;
            period(original, domain, start, start + 24)
        }
        TimeDomain::HalfCentury => {
            let caps = half_re().captures(&normalized).ok_or_else(|| {
                label_error(original, domain, "expected a label such as '1st half of the 20th century'")
            })?;
            let half = ordinal_index(&caps[1]);
            let start = century_start(original, domain, &caps[2])? + (half - 1) * 50;
            period(original, domain, start, start + 49)
        }
        TimeDomain::Century => {
            let caps = century_re()
                .captures(&normalized)
                .ok_or_else(|| label_error(original, domain, "expected a century such as '20th century'"))?;
            let start = century_start(original, domain, &caps[1])?;
            period(original, domain, start, start + 99)
        }
    }
}

/// True when `label` is a valid label in at least one domain.
pub fn is_time_label(label: &str) -> bool {
    TimeDomain::ALL
        .iter()
        .any(|domain| validate_time(label, *domain).is_ok())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeLabelIssue {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct TimeValidationReport {
    pub values: Vec<TimeValue>,
    pub errors: Vec<TimeLabelIssue>,
}

impl TimeValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 以原始標籤為 key 建立查詢表
    pub fn by_label(&self) -> HashMap<String, TimeValue> {
        self.values
            .iter()
            .map(|value| (value.l.clone(), value.clone()))
            .collect()
    }

    pub fn into_result(self, domain: TimeDomain) -> Result<HashMap<String, TimeValue>> {
        if self.is_valid() {
            return Ok(self.by_label());
        }

        let details: Vec<String> = self
            .errors
            .iter()
            .take(10)
            .map(|issue| format!("'{}' ({})", issue.label, issue.reason))
            .collect();
        let more = self.errors.len().saturating_sub(details.len());
        let mut message = format!(
            "{} time label(s) are not valid for domain '{}': {}",
            self.errors.len(),
            domain,
            details.join(", ")
        );
        if more > 0 {
            message.push_str(&format!(" and {} more", more));
        }
        Err(ImportError::ValidationError { message })
    }
}

/// Validates every label, collecting all failures instead of stopping at the first.
pub fn validate_time_labels<S: AsRef<str>>(labels: &[S], domain: TimeDomain) -> TimeValidationReport {
    let mut report = TimeValidationReport::default();
    for label in labels {
        match validate_time(label.as_ref(), domain) {
            Ok(value) => report.values.push(value),
            Err(ImportError::TimeLabelError { label, reason, .. }) => {
                report.errors.push(TimeLabelIssue { label, reason })
            }
            Err(other) => report.errors.push(TimeLabelIssue {
                label: label.as_ref().to_string(),
                reason: other.to_string(),
            }),
        }
    }
    tracing::debug!(
        "Validated {} time label(s) for domain '{}': {} invalid",
        labels.len(),
        domain,
        report.errors.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(value: &TimeValue) -> (String, String) {
        (value.sd.clone().unwrap(), value.ed.clone().unwrap())
    }

    #[test]
    fn test_time_domain_parsing() {
        assert_eq!("year".parse::<TimeDomain>().unwrap(), TimeDomain::Year);
        assert_eq!(" Quarter Century ".parse::<TimeDomain>().unwrap(), TimeDomain::QuarterCentury);
        assert_eq!("half_century".parse::<TimeDomain>().unwrap(), TimeDomain::HalfCentury);
        assert_eq!("half-century".parse::<TimeDomain>().unwrap(), TimeDomain::HalfCentury);
        assert!("month".parse::<TimeDomain>().is_err());
        assert_eq!(TimeDomain::QuarterCentury.to_string(), "quarter century");
    }

    #[test]
    fn test_year_labels() {
        let value = validate_time("1990", TimeDomain::Year).unwrap();
        assert_eq!(value.d, "1990-01-01");
        assert_eq!(value.l, "1990");
        assert_eq!(value.td, "year");
        assert_eq!(range(&value), ("1990-01-01".to_string(), "1990-12-31".to_string()));

        assert_eq!(validate_time("1990.0", TimeDomain::Year).unwrap().d, "1990-01-01");
        assert_eq!(validate_time("500 BC", TimeDomain::Year).unwrap().d, "-0500-01-01");
        assert_eq!(validate_time("-500", TimeDomain::Year).unwrap().d, "-0500-01-01");
        assert_eq!(validate_time("1066 AD", TimeDomain::Year).unwrap().d, "1066-01-01");

        assert!(validate_time("nineteen ninety", TimeDomain::Year).is_err());
        assert!(validate_time("1990.5", TimeDomain::Year).is_err());
        assert!(validate_time("0 BC", TimeDomain::Year).is_err());
        assert!(validate_time("", TimeDomain::Year).is_err());
    }

    #[test]
    fn test_decade_labels() {
        let value = validate_time("1990s", TimeDomain::Decade).unwrap();
        assert_eq!(range(&value), ("1990-01-01".to_string(), "1999-12-31".to_string()));
        assert_eq!(value.d, "1990-01-01");
        assert!(validate_time("1990", TimeDomain::Decade).is_ok());
        assert!(validate_time("1990's", TimeDomain::Decade).is_ok());
        assert!(validate_time("1990'", TimeDomain::Decade).is_err());
        assert!(validate_time("1995s", TimeDomain::Decade).is_err());
    }

    #[test]
    fn test_quarter_and_half_century_labels() {
        let value = validate_time("2nd quarter of the 20th century", TimeDomain::QuarterCentury).unwrap();
        assert_eq!(range(&value), ("1925-01-01".to_string(), "1949-12-31".to_string()));

        let value = validate_time("Fourth quarter of 19th century", TimeDomain::QuarterCentury).unwrap();
        assert_eq!(range(&value), ("1875-01-01".to_string(), "1899-12-31".to_string()));

        let value = validate_time("2nd half of the 20th century", TimeDomain::HalfCentury).unwrap();
        assert_eq!(range(&value), ("1950-01-01".to_string(), "1999-12-31".to_string()));

        assert!(validate_time("3rd half of the 20th century", TimeDomain::HalfCentury).is_err());
        assert!(validate_time("5th quarter of the 20th century", TimeDomain::QuarterCentury).is_err());
    }

    #[test]
    fn test_century_labels() {
        let value = validate_time("20th century", TimeDomain::Century).unwrap();
        assert_eq!(range(&value), ("1900-01-01".to_string(), "1999-12-31".to_string()));
        assert_eq!(validate_time("21", TimeDomain::Century).unwrap().sd.unwrap(), "2000-01-01");
        assert!(validate_time("0th century", TimeDomain::Century).is_err());
        assert!(validate_time("99999999th century", TimeDomain::Century).is_err());
        assert!(validate_time("modern era", TimeDomain::Century).is_err());
    }

    #[test]
    fn test_is_time_label() {
        assert!(is_time_label("1990"));
        assert!(is_time_label("1990s"));
        assert!(is_time_label("1st half of the 20th century"));
        assert!(!is_time_label("France"));
        assert!(!is_time_label("Country"));
    }

    #[test]
    fn test_validate_time_labels_collects_every_error() {
        let labels = vec!["1990", "abc", "2000", "xyz"];
        let report = validate_time_labels(&labels, TimeDomain::Year);
        assert_eq!(report.values.len(), 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].label, "abc");
        assert_eq!(report.errors[1].label, "xyz");

        let err = report.into_result(TimeDomain::Year).unwrap_err();
        assert!(err.to_string().contains("2 time label(s)"));
    }

    #[test]
    fn test_validate_time_labels_by_label() {
        let report = validate_time_labels(&["1990s", "2000s"], TimeDomain::Decade);
        let map = report.into_result(TimeDomain::Decade).unwrap();
        assert_eq!(map["2000s"].ed.as_deref(), Some("2009-12-31"));
    }
}
