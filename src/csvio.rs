//! The CSV artifacts produced and consumed between runs. These files are the
//! only durable local state; later commands read them back as the on-disk
//! join key between the external systems.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Group, GroupFolder, Roster, StudentMessage};

/// Row contract for `roster.csv`.
#[derive(Debug, Serialize, Deserialize)]
struct RosterRow {
    #[serde(rename = "Student ID")]
    student_id: i64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Login ID")]
    login_id: String,
    #[serde(rename = "Perm")]
    perm: String,
    #[serde(rename = "Section ID")]
    section_id: String,
    #[serde(rename = "Section Name")]
    section_name: String,
    #[serde(rename = "Section Time")]
    section_time: String,
    #[serde(rename = "Section Day")]
    section_day: String,
    #[serde(rename = "Section TA")]
    section_ta: String,
    #[serde(rename = "Group ID")]
    group_id: String,
    #[serde(rename = "Group Name")]
    group_name: String,
    #[serde(rename = "Leader ID")]
    leader_id: String,
    #[serde(rename = "Leader Name")]
    leader_name: String,
    #[serde(rename = "Leader Email")]
    leader_email: String,
}

pub fn write_roster(path: &Path, roster: &Roster) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in roster.values() {
        let section = entry.section.as_ref();
        let group = entry.group.as_ref();
        writer.serialize(RosterRow {
            student_id: entry.student_id,
            name: entry.student_name.clone(),
            email: entry.email.clone(),
            login_id: entry.login_id.clone(),
            perm: entry.perm.clone().unwrap_or_default(),
            section_id: section.map(|s| s.section_id.to_string()).unwrap_or_default(),
            section_name: section.map(|s| s.section_name.clone()).unwrap_or_default(),
            section_time: section.map(|s| s.section_time.clone()).unwrap_or_default(),
            section_day: section.map(|s| s.section_day.clone()).unwrap_or_default(),
            section_ta: section.map(|s| s.section_ta.clone()).unwrap_or_default(),
            group_id: group.map(|g| g.group_id.to_string()).unwrap_or_default(),
            group_name: group.map(|g| g.group_name.clone()).unwrap_or_default(),
            leader_id: group
                .and_then(|g| g.leader_id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
            leader_name: group
                .and_then(|g| g.leader_name.clone())
                .unwrap_or_default(),
            leader_email: group
                .and_then(|g| g.leader_email.clone())
                .unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Row contract for `group_export_{category}.csv`, the chat sync input.
#[derive(Debug, Serialize, Deserialize)]
struct GroupExportRow {
    group_name: String,
    email: String,
}

pub fn write_group_export(path: &Path, groups: &[Group]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for group in groups {
        for member in &group.members {
            writer.serialize(GroupExportRow {
                group_name: group.name.clone(),
                email: member.email.clone(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read the chat sync input back into a group-name-to-emails map, preserving
/// member order within each group.
pub fn read_group_emails(path: &Path) -> Result<BTreeMap<String, Vec<String>>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: GroupExportRow = row?;
        if row.group_name.is_empty() {
            continue;
        }
        groups.entry(row.group_name).or_default().push(row.email);
    }
    Ok(groups)
}

/// Row contract for `group_folders_{category}.csv` and its with-chat
/// superset. The space columns are empty until the chat sync fills them.
#[derive(Debug, Serialize, Deserialize)]
struct GroupFolderRow {
    #[serde(rename = "Group Name")]
    group_name: String,
    #[serde(rename = "Folder URL")]
    folder_url: String,
    #[serde(rename = "Space Name", default)]
    space_name: String,
    #[serde(rename = "Space Display Name", default)]
    space_display_name: String,
    #[serde(rename = "Space URL", default)]
    space_url: String,
}

pub fn write_group_folders(
    path: &Path,
    folders: &BTreeMap<String, GroupFolder>,
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for (group_name, folder) in folders {
        writer.serialize(GroupFolderRow {
            group_name: group_name.clone(),
            folder_url: folder.folder_url.clone(),
            space_name: folder.space_name.clone().unwrap_or_default(),
            space_display_name: folder.space_display_name.clone().unwrap_or_default(),
            space_url: folder.space_url.clone().unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_group_folders(path: &Path) -> Result<BTreeMap<String, GroupFolder>, AppError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut folders = BTreeMap::new();
    for row in reader.deserialize() {
        let row: GroupFolderRow = row?;
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        folders.insert(
            row.group_name,
            GroupFolder {
                folder_url: row.folder_url,
                sheet_id: None,
                space_name: non_empty(row.space_name),
                space_display_name: non_empty(row.space_display_name),
                space_url: non_empty(row.space_url),
            },
        );
    }
    Ok(folders)
}

/// Row contract for the staff file: one staff email per section token.
#[derive(Debug, Serialize, Deserialize)]
struct StaffRow {
    section: String,
    email: String,
}

/// Read a plain staff email list, one address per line; blank lines are
/// skipped.
pub fn read_email_list(path: &Path) -> Result<Vec<String>, AppError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

pub fn read_staff(path: &Path) -> Result<BTreeMap<String, Vec<String>>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut staff: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: StaffRow = row?;
        staff.entry(row.section).or_default().push(row.email);
    }
    Ok(staff)
}

pub fn write_messages(path: &Path, messages: &[StudentMessage]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for message in messages {
        writer.serialize(message)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_messages(path: &Path) -> Result<Vec<StudentMessage>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut messages = Vec::new();
    for row in reader.deserialize() {
        messages.push(row?);
    }
    Ok(messages)
}
