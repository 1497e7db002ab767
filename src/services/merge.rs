//! The cross-system merge: one pass that combines students, sections, and
//! groups into a canonical roster-plus-group view. Inconsistencies are
//! logged as warnings and never fail the merge.

use tracing::warn;

use crate::models::{
    group_sort_key, Group, GroupInfo, MergedGroup, Roster, RosterEntry, Rollup, SectionInfo,
    SectionRecord, Student,
};

pub struct MergePolicy {
    /// Name of the LMS test account; its enrollments never warn.
    pub test_student_name: String,
}

/// Merge students, sections, and groups into a roster and annotated groups.
///
/// Ordering matters: the roster is built from students first, section
/// fields are attached second, and groups are merged last so leader
/// resolution can look leaders up in the partially built roster.
pub fn merge(
    students: &[Student],
    sections: &[SectionRecord],
    groups: &[Group],
    policy: &MergePolicy,
) -> (Roster, Vec<MergedGroup>) {
    let mut roster: Roster = students
        .iter()
        .map(|s| (s.student_id, RosterEntry::from_student(s)))
        .collect();

    for section in sections {
        for enrollment in &section.members {
            let Some(entry) = roster.get_mut(&enrollment.user_id) else {
                warn_unless_test_student_or_ta(section, enrollment, policy);
                continue;
            };
            entry.section = Some(SectionInfo {
                section_id: section.section_id,
                section_name: section.name.clone(),
                section_time: section.section_time.clone(),
                section_day: section.section_day.clone(),
                section_ta: section.section_ta.clone(),
            });
            // Section enrollment data is treated as the authoritative
            // source for perm, even when it carries none.
            entry.perm = enrollment.perm.clone();
        }
    }

    let mut merged_groups = Vec::new();
    for group in groups {
        let leader = resolve_leader(group, &roster);

        let group_info = GroupInfo {
            group_id: group.group_id,
            group_name: group.name.clone(),
            leader_id: leader.as_ref().map(|l| l.0),
            leader_name: leader.as_ref().map(|l| l.1.clone()),
            leader_email: leader.as_ref().map(|l| l.2.clone()),
        };

        let mut member_sections = Vec::new();
        for member in &group.members {
            match roster.get_mut(&member.student_id) {
                Some(entry) => {
                    entry.group = Some(group_info.clone());
                    if let Some(section) = &entry.section {
                        member_sections.push(section.clone());
                    } else {
                        warn!(
                            "Group {} member {} has no section in the roster",
                            group.name, member.name
                        );
                    }
                }
                None => {
                    warn!(
                        "Group {} member {} ({}) not found in roster",
                        group.name, member.name, member.student_id
                    );
                }
            }
        }

        merged_groups.push(MergedGroup {
            group: group.clone(),
            section_ids: Rollup::from_values(member_sections.iter().map(|s| s.section_id)),
            section_names: Rollup::from_values(
                member_sections.iter().map(|s| s.section_name.clone()),
            ),
            section_times: Rollup::from_values(
                member_sections.iter().map(|s| s.section_time.clone()),
            ),
            section_days: Rollup::from_values(
                member_sections.iter().map(|s| s.section_day.clone()),
            ),
            section_tas: Rollup::from_values(member_sections.iter().map(|s| s.section_ta.clone())),
        });
    }

    merged_groups.sort_by_key(|m| group_sort_key(&m.group.name));
    (roster, merged_groups)
}

fn resolve_leader(group: &Group, roster: &Roster) -> Option<(i64, String, String)> {
    let leader_id = group.leader_id?;
    match roster.get(&leader_id) {
        Some(entry) => Some((leader_id, entry.student_name.clone(), entry.email.clone())),
        None => {
            warn!(
                "Group {} leader {} not found in roster",
                group.name, leader_id
            );
            None
        }
    }
}

fn warn_unless_test_student_or_ta(
    section: &SectionRecord,
    enrollment: &crate::models::SectionEnrollment,
    policy: &MergePolicy,
) {
    if enrollment.role != "StudentEnrollment" {
        return;
    }
    if enrollment.user_name.as_deref() == Some(policy.test_student_name.as_str()) {
        return;
    }
    warn!(
        "Student {} (user {}) enrolled in section {} but not found in roster",
        enrollment.user_name.as_deref().unwrap_or("<unnamed>"),
        enrollment.user_id,
        section.name
    );
}
