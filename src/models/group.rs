use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One group member, identity shared with the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub student_id: i64,
    pub name: String,
    pub login_id: Option<String>,
    pub email: String,
    pub perm: Option<String>,
}

/// A student group within a group category. `name` is mutable external
/// state: it gets renamed over time to embed section info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub group_id: i64,
    pub name: String,
    pub leader_id: Option<i64>,
    pub members: Vec<Member>,
}

/// A set-valued view of a per-member attribute, collapsed to the scalar
/// when all members agree. `Mixed` is the signal for cross-section groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Rollup<T: Ord> {
    Empty,
    Single(T),
    Mixed(BTreeSet<T>),
}

impl<T: Ord + Clone> Rollup<T> {
    pub fn from_values<I: IntoIterator<Item = T>>(values: I) -> Self {
        let set: BTreeSet<T> = values.into_iter().collect();
        match set.len() {
            0 => Rollup::Empty,
            1 => Rollup::Single(set.into_iter().next().unwrap()),
            _ => Rollup::Mixed(set),
        }
    }

    pub fn single(&self) -> Option<&T> {
        match self {
            Rollup::Single(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Ord + std::fmt::Display> Rollup<T> {
    /// Scalar display for `Single`, `{a, b}` for `Mixed`, empty for `Empty`.
    pub fn display(&self) -> String {
        match self {
            Rollup::Empty => String::new(),
            Rollup::Single(v) => v.to_string(),
            Rollup::Mixed(set) => {
                let items: Vec<String> = set.iter().map(|v| v.to_string()).collect();
                format!("{{{}}}", items.join(", "))
            }
        }
    }
}

/// A group annotated with roster-derived section attributes.
#[derive(Debug, Clone, Serialize)]
pub struct MergedGroup {
    pub group: Group,
    pub section_ids: Rollup<i64>,
    pub section_names: Rollup<String>,
    pub section_times: Rollup<String>,
    pub section_days: Rollup<String>,
    pub section_tas: Rollup<String>,
}

fn group_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").unwrap())
}

/// The numeric suffix used for group ordering, e.g. `"Group 12"` -> `12`.
pub fn group_number(group_name: &str) -> Option<u64> {
    group_number_re()
        .captures(group_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Sort key for group names: numeric, with unparsable names last. Ties
/// break on the full name so reruns process groups in the same order.
pub fn group_sort_key(group_name: &str) -> (u64, String) {
    (
        group_number(group_name).unwrap_or(u64::MAX),
        group_name.to_string(),
    )
}

/// Sort group names in place by `group_sort_key`.
pub fn sort_group_names(names: &mut [String]) {
    names.sort_by_key(|n| group_sort_key(n));
}
