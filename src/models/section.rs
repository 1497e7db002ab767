use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel for section-name fields the regexes fail to match.
pub const UNKNOWN: &str = "Unknown";

/// A course section with fields parsed out of its free-text display name,
/// e.g. `"CMPSC 5A - W 12:00 PM [Jane Doe]"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub section_id: i64,
    pub name: String,
    pub section_time: String,
    pub section_day: String,
    pub section_ta: String,
    pub members: Vec<SectionEnrollment>,
}

/// One enrollment row within a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEnrollment {
    pub user_id: i64,
    pub role: String,
    pub user_name: Option<String>,
    pub perm: Option<String>,
}

impl SectionRecord {
    pub fn new(section_id: i64, name: &str, members: Vec<SectionEnrollment>) -> Self {
        let fields = parse_section_name(name);
        Self {
            section_id,
            name: name.to_string(),
            section_time: fields.time,
            section_day: fields.day,
            section_ta: fields.ta,
            members,
        }
    }

    /// The meeting time in its short display form, e.g. `"noon"` or `"1pm"`.
    pub fn nice_time(&self) -> String {
        nice_time(&self.section_time)
    }
}

pub struct SectionNameFields {
    pub time: String,
    pub day: String,
    pub ta: String,
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}:\d{2}\s*[AP]M").unwrap())
}

fn day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[MTWRF]\b").unwrap())
}

fn ta_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap())
}

/// Extract meeting time, meeting day, and TA name from a section display
/// name. Any field whose pattern does not match becomes `"Unknown"`.
pub fn parse_section_name(name: &str) -> SectionNameFields {
    let time = time_re()
        .find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let day = day_re()
        .find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let ta = ta_re()
        .find(name)
        .map(|m| m.as_str().trim_matches(|c| c == '[' || c == ']').trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    SectionNameFields { time, day, ta }
}

/// Normalize a parsed meeting time to the short form used in group and
/// space names: `"12:00 PM"` becomes `"noon"`, `"1:00 PM"` becomes `"1pm"`,
/// `"9:00 AM"` becomes `"9am"`. Anything unparseable passes through as-is.
pub fn nice_time(time: &str) -> String {
    let compact = time.replace(' ', "");
    let Some((clock, suffix)) = compact
        .strip_suffix("AM")
        .map(|c| (c, "am"))
        .or_else(|| compact.strip_suffix("PM").map(|c| (c, "pm")))
    else {
        return time.to_string();
    };
    let Some((hour, minutes)) = clock.split_once(':') else {
        return time.to_string();
    };
    if hour == "12" && minutes == "00" && suffix == "pm" {
        return "noon".to_string();
    }
    if minutes == "00" {
        format!("{}{}", hour, suffix)
    } else {
        format!("{}:{}{}", hour, minutes, suffix)
    }
}
