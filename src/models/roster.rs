use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One student as fetched from the course roster. `perm` is the
/// integration/permanent ID, absent for some accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    pub student_name: String,
    pub login_id: String,
    pub email: String,
    pub perm: Option<String>,
}

/// Section fields attached to a roster entry during the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInfo {
    pub section_id: i64,
    pub section_name: String,
    pub section_time: String,
    pub section_day: String,
    pub section_ta: String,
}

/// Group fields attached to a roster entry during the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_id: i64,
    pub group_name: String,
    pub leader_id: Option<i64>,
    pub leader_name: Option<String>,
    pub leader_email: Option<String>,
}

/// A merged roster record. Section and group blocks are `None` when the
/// student has no section enrollment or no group; the fields are always
/// present, never missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student_id: i64,
    pub student_name: String,
    pub login_id: String,
    pub email: String,
    pub perm: Option<String>,
    pub section: Option<SectionInfo>,
    pub group: Option<GroupInfo>,
}

impl RosterEntry {
    pub fn from_student(student: &Student) -> Self {
        Self {
            student_id: student.student_id,
            student_name: student.student_name.clone(),
            login_id: student.login_id.clone(),
            email: student.email.clone(),
            perm: student.perm.clone(),
            section: None,
            group: None,
        }
    }
}

/// Snapshot roster keyed by student ID, ordered for reproducible output.
pub type Roster = BTreeMap<i64, RosterEntry>;
