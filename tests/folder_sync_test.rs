use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use course_sync::drive::{DriveClient, DriveFile, FOLDER_MIME, SPREADSHEET_MIME};
use course_sync::error::AppError;
use course_sync::models::{Group, Member};
use course_sync::pace::NoDelay;
use course_sync::services::GroupFolderSynchronizer;

#[derive(Clone)]
struct FakeFile {
    id: String,
    name: String,
    mime: String,
    parent: Option<String>,
}

#[derive(Default)]
struct DriveState {
    files: Vec<FakeFile>,
    // (spreadsheet id, tab title) -> values
    values: BTreeMap<(String, String), Vec<Vec<String>>>,
    tabs: BTreeMap<String, Vec<String>>,
    shares: Vec<(String, String)>,
    next_id: u64,
}

impl DriveState {
    fn add_file(&mut self, name: &str, mime: &str, parent: Option<&str>) -> String {
        self.next_id += 1;
        let id = format!("file-{}", self.next_id);
        self.files.push(FakeFile {
            id: id.clone(),
            name: name.to_string(),
            mime: mime.to_string(),
            parent: parent.map(|p| p.to_string()),
        });
        id
    }

    fn find(&self, name: &str, mime: &str, parent: Option<&str>) -> Option<String> {
        self.files
            .iter()
            .find(|f| {
                f.name == name && f.mime == mime && f.parent.as_deref() == parent
            })
            .map(|f| f.id.clone())
    }
}

struct FakeDrive {
    state: Mutex<DriveState>,
}

impl FakeDrive {
    fn new() -> Self {
        Self {
            state: Mutex::new(DriveState::default()),
        }
    }

    fn file_count(&self, mime: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .filter(|f| f.mime == mime)
            .count()
    }

    fn shares(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().shares.clone()
    }
}

// Range strings look like "Sheet1!A1" or "'Members_1'!A1" or "'Sheet1'";
// the fake only cares about the tab title.
fn tab_of(range: &str) -> String {
    range
        .split('!')
        .next()
        .unwrap_or(range)
        .trim_matches('\'')
        .to_string()
}

#[async_trait]
impl DriveClient for FakeDrive {
    async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        Ok(self.state.lock().unwrap().find(name, FOLDER_MIME, parent_id))
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, AppError> {
        Ok(self.state.lock().unwrap().add_file(name, FOLDER_MIME, parent_id))
    }

    async fn share_writer(&self, file_id: &str, email: &str) -> Result<(), AppError> {
        self.state
            .lock()
            .unwrap()
            .shares
            .push((file_id.to_string(), email.to_string()));
        Ok(())
    }

    async fn find_spreadsheet(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .find(name, SPREADSHEET_MIME, Some(parent_id)))
    }

    async fn create_spreadsheet(&self, name: &str, parent_id: &str) -> Result<String, AppError> {
        let mut state = self.state.lock().unwrap();
        let id = state.add_file(name, SPREADSHEET_MIME, Some(parent_id));
        state.tabs.insert(id.clone(), vec!["Sheet1".to_string()]);
        Ok(id)
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .values
            .get(&(spreadsheet_id.to_string(), tab_of(range)))
            .cloned()
            .unwrap_or_default())
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), AppError> {
        self.state
            .lock()
            .unwrap()
            .values
            .insert((spreadsheet_id.to_string(), tab_of(range)), values.to_vec());
        Ok(())
    }

    async fn list_tab_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tabs
            .get(spreadsheet_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_tab(&self, spreadsheet_id: &str, title: &str) -> Result<(), AppError> {
        self.state
            .lock()
            .unwrap()
            .tabs
            .entry(spreadsheet_id.to_string())
            .or_default()
            .push(title.to_string());
        Ok(())
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .iter()
            .filter(|f| f.parent.as_deref() == Some(folder_id))
            .map(|f| DriveFile {
                id: f.id.clone(),
                name: f.name.clone(),
                mime_type: Some(f.mime.clone()),
            })
            .collect())
    }

    async fn copy_file(
        &self,
        file_id: &str,
        new_name: &str,
        parent_id: &str,
    ) -> Result<String, AppError> {
        let mut state = self.state.lock().unwrap();
        let mime = state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.mime.clone())
            .unwrap_or_default();
        Ok(state.add_file(new_name, &mime, Some(parent_id)))
    }
}

fn group(id: i64, name: &str, members: &[(&str, &str)]) -> Group {
    Group {
        group_id: id,
        name: name.to_string(),
        leader_id: None,
        members: members
            .iter()
            .map(|(name, email)| Member {
                student_id: 0,
                name: name.to_string(),
                login_id: None,
                email: email.to_string(),
                perm: None,
            })
            .collect(),
    }
}

fn synchronizer(drive: Arc<FakeDrive>) -> GroupFolderSynchronizer {
    GroupFolderSynchronizer::new(drive, Arc::new(NoDelay))
}

#[tokio::test]
async fn first_run_creates_folders_sheets_and_shares() {
    let drive = Arc::new(FakeDrive::new());
    let groups = vec![
        group(1, "Group 1", &[("Ada Lovelace", "ada@ucsb.edu")]),
        group(2, "Group 2", &[("Alan Turing", "alan@ucsb.edu")]),
    ];

    let (folders, stats) = synchronizer(drive.clone())
        .ensure_group_folders(&groups, "Course Projects")
        .await
        .unwrap();

    // Root folder plus one per group.
    assert_eq!(drive.file_count(FOLDER_MIME), 3);
    assert_eq!(stats.folders_created, 2);
    assert_eq!(stats.sheets_created, 2);
    assert_eq!(stats.groups_failed, 0);
    assert_eq!(folders.len(), 2);
    assert!(folders["Group 1"].folder_url.starts_with("https://drive.google.com/drive/folders/"));
    assert!(folders["Group 1"].sheet_id.is_some());
    assert_eq!(drive.shares().len(), 2);
}

#[tokio::test]
async fn second_run_creates_nothing_when_membership_is_unchanged() {
    let drive = Arc::new(FakeDrive::new());
    let groups = vec![group(1, "Group 1", &[("Ada Lovelace", "ada@ucsb.edu")])];

    synchronizer(drive.clone())
        .ensure_group_folders(&groups, "Course Projects")
        .await
        .unwrap();
    let (_, stats) = synchronizer(drive.clone())
        .ensure_group_folders(&groups, "Course Projects")
        .await
        .unwrap();

    assert_eq!(stats.folders_created, 0);
    assert_eq!(stats.folders_reused, 1);
    assert_eq!(stats.sheets_created, 0);
    assert_eq!(stats.sheets_unchanged, 1);
    assert_eq!(stats.tabs_appended, 0);
    assert_eq!(drive.file_count(FOLDER_MIME), 2);
    assert_eq!(drive.file_count(SPREADSHEET_MIME), 1);
}

#[tokio::test]
async fn membership_change_appends_a_tab_instead_of_overwriting() {
    let drive = Arc::new(FakeDrive::new());
    let before = vec![group(1, "Group 1", &[("Ada Lovelace", "ada@ucsb.edu")])];
    let after = vec![group(
        1,
        "Group 1",
        &[("Ada Lovelace", "ada@ucsb.edu"), ("Alan Turing", "alan@ucsb.edu")],
    )];

    synchronizer(drive.clone())
        .ensure_group_folders(&before, "Course Projects")
        .await
        .unwrap();
    let (_, stats) = synchronizer(drive.clone())
        .ensure_group_folders(&after, "Course Projects")
        .await
        .unwrap();

    assert_eq!(stats.tabs_appended, 1);
    assert_eq!(stats.sheets_created, 0);

    // The original Sheet1 snapshot is untouched.
    let state = drive.state.lock().unwrap();
    let sheet_id = state
        .files
        .iter()
        .find(|f| f.mime == SPREADSHEET_MIME)
        .map(|f| f.id.clone())
        .unwrap();
    let original = &state.values[&(sheet_id.clone(), "Sheet1".to_string())];
    assert_eq!(original.len(), 2);
    let appended = &state.values[&(sheet_id, "Members_1".to_string())];
    assert_eq!(appended.len(), 3);
    assert_eq!(appended[0], vec!["Name".to_string(), "Email".to_string()]);
}

#[tokio::test]
async fn notebook_copies_are_seeded_once_per_member() {
    let drive = Arc::new(FakeDrive::new());
    {
        let mut state = drive.state.lock().unwrap();
        let root = state.add_file("Course Projects", FOLDER_MIME, None);
        let initial = state.add_file("Initial Contents", FOLDER_MIME, Some(&root));
        state.add_file("worksheet.ipynb", "application/octet-stream", Some(&initial));
    }
    let groups = vec![group(
        1,
        "Group 1",
        &[("Ada Lovelace", "ada@ucsb.edu"), ("Alan Turing", "alan@ucsb.edu")],
    )];

    let (folders, stats) = synchronizer(drive.clone())
        .ensure_group_folders(&groups, "Course Projects")
        .await
        .unwrap();
    // FINAL copy plus one per member.
    assert_eq!(stats.notebooks_copied, 3);
    assert_eq!(folders.len(), 1);

    let (_, stats) = synchronizer(drive.clone())
        .ensure_group_folders(&groups, "Course Projects")
        .await
        .unwrap();
    assert_eq!(stats.notebooks_copied, 0);

    let state = drive.state.lock().unwrap();
    let names: Vec<&str> = state.files.iter().map(|f| f.name.as_str()).collect();
    assert!(names.contains(&"worksheet_FINAL.ipynb"));
    assert!(names.contains(&"worksheet_Ada_Lovelace.ipynb"));
    assert!(names.contains(&"worksheet_Alan_Turing.ipynb"));
}
