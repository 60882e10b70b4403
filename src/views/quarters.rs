//! Fiscal-quarter grouping of sprints.
//!
//! Sprint names carry the fiscal period as free text. Labels are derived in order:
//!
//! 1. Name contains `FY25`: `Q4 FY25`.
//! 2. Name contains `FY26`, or is an untagged `S<n>` name (current-year sprints are
//!    stored without a tag): the sprint number maps `1-7` to `Q1 FY26`, `8-14` to
//!    `Q2 FY26`, `15-20` to `Q3 FY26`, `21-26` to `Q4 FY26`. Any other number is `Other`.
//! 3. Name starts with `Q<1-4> <yyyy>`: that prefix.
//! 4. Otherwise `Other`.
//!
//! Out-of-range numbers land in `Other` silently.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Sprint;

pub const OTHER_QUARTER: &str = "Other";

static CALENDAR_QUARTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Q[1-4])\s+(\d{4})").expect("calendar quarter pattern"));
static FISCAL_QUARTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Q([1-4])\s+FY(\d{2})").expect("fiscal quarter pattern"));
static UNTAGGED_SPRINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S\d+\s*$").expect("untagged sprint pattern"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern"));

/// Quarter label for a sprint name.
pub fn quarter_label(name: &str) -> String {
    if name.contains("FY25") {
        return "Q4 FY25".to_string();
    }

    if name.contains("FY26") || UNTAGGED_SPRINT.is_match(name) {
        return fy26_quarter(name).unwrap_or(OTHER_QUARTER).to_string();
    }

    if let Some(caps) = CALENDAR_QUARTER.captures(name) {
        return format!("{} {}", &caps[1], &caps[2]);
    }

    OTHER_QUARTER.to_string()
}

/// Bracket the sprint number of an FY26 sprint name into its quarter.
fn fy26_quarter(name: &str) -> Option<&'static str> {
    let untagged = name.replace("FY26", "");
    let number: u32 = DIGITS.find(&untagged)?.as_str().parse().ok()?;
    match number {
        1..=7 => Some("Q1 FY26"),
        8..=14 => Some("Q2 FY26"),
        15..=20 => Some("Q3 FY26"),
        21..=26 => Some("Q4 FY26"),
        _ => None,
    }
}

/// Sort key for a quarter label. Variant order is the column order.
///
/// This is a total order, so fiscal labels always precede calendar labels:
/// `Q4 FY25` sorts before `Q3 2025`. A plain string comparison fallback would
/// put `Q3 2025` first and is not transitive once mixed with fiscal labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum QuarterKey<'a> {
    Fiscal { year: u32, quarter: u32 },
    Named(&'a str),
    Other,
}

impl<'a> QuarterKey<'a> {
    fn of(label: &'a str) -> Self {
        if label == OTHER_QUARTER {
            return Self::Other;
        }
        if let Some(caps) = FISCAL_QUARTER.captures(label) {
            if let (Ok(quarter), Ok(year)) = (caps[1].parse(), caps[2].parse::<u32>()) {
                return Self::Fiscal {
                    year: 2000 + year,
                    quarter,
                };
            }
        }
        Self::Named(label)
    }
}

/// Column order of two quarter labels: fiscal labels by (year, quarter), then any
/// other label lexicographically, then `Other`.
pub fn compare_quarter_labels(a: &str, b: &str) -> Ordering {
    QuarterKey::of(a).cmp(&QuarterKey::of(b))
}

pub fn sort_quarter_labels<S: AsRef<str>>(labels: &mut [S]) {
    labels.sort_by(|a, b| compare_quarter_labels(a.as_ref(), b.as_ref()));
}

/// Sprints sharing a quarter label, in their original relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterGroup<'a> {
    pub label: String,
    pub sprints: Vec<&'a Sprint>,
}

/// Group sprints by quarter label and order the groups left to right.
pub fn group_sprints_by_quarter(sprints: &[Sprint]) -> Vec<QuarterGroup<'_>> {
    let mut groups: Vec<QuarterGroup<'_>> = Vec::new();

    for sprint in sprints {
        let label = quarter_label(&sprint.name);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.sprints.push(sprint),
            None => groups.push(QuarterGroup {
                label,
                sprints: vec![sprint],
            }),
        }
    }

    groups.sort_by(|a, b| compare_quarter_labels(&a.label, &b.label));
    groups
}
