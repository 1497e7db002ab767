//! Idempotent Drive folder synchronization: one shared folder, one members
//! spreadsheet, and seeded notebook copies per group. Lookup-then-create
//! throughout, so reruns create nothing new when nothing changed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::drive::DriveClient;
use crate::error::AppError;
use crate::models::{group_sort_key, Group, GroupFolder};
use crate::pace::Pacer;

const INITIAL_CONTENTS_FOLDER: &str = "Initial Contents";
const SHEET_HEADER: [&str; 2] = ["Name", "Email"];

pub struct GroupFolderSynchronizer {
    drive: Arc<dyn DriveClient>,
    pacer: Arc<dyn Pacer>,
}

#[derive(Debug, Default, Serialize)]
pub struct FolderSyncStats {
    pub folders_created: usize,
    pub folders_reused: usize,
    pub sheets_created: usize,
    pub sheets_unchanged: usize,
    pub tabs_appended: usize,
    pub notebooks_copied: usize,
    pub groups_failed: usize,
}

struct NotebookSource {
    file_id: String,
    file_name: String,
}

impl GroupFolderSynchronizer {
    pub fn new(drive: Arc<dyn DriveClient>, pacer: Arc<dyn Pacer>) -> Self {
        Self { drive, pacer }
    }

    /// Ensure one folder, membership sharing, and members spreadsheet per
    /// group under `root_folder_name`. A failing group is skipped; the
    /// remaining groups are still processed.
    pub async fn ensure_group_folders(
        &self,
        groups: &[Group],
        root_folder_name: &str,
    ) -> Result<(BTreeMap<String, GroupFolder>, FolderSyncStats), AppError> {
        let root_id = self.find_or_create_folder(root_folder_name, None).await?.0;
        let notebook = self.locate_notebook(&root_id).await?;

        let mut sorted: Vec<&Group> = groups.iter().collect();
        sorted.sort_by_key(|g| group_sort_key(&g.name));

        let mut folders = BTreeMap::new();
        let mut stats = FolderSyncStats::default();

        for group in sorted {
            if group.name.is_empty() {
                continue;
            }
            info!("Processing folder for group: {}", group.name);
            match self
                .sync_one_group(group, &root_id, notebook.as_ref(), &mut stats)
                .await
            {
                Ok(folder) => {
                    folders.insert(group.name.clone(), folder);
                }
                Err(e) => {
                    warn!("Failed to sync folder for group {}: {}", group.name, e);
                    stats.groups_failed += 1;
                }
            }
        }

        info!(
            "Folder sync done: {} created, {} reused, {} failed",
            stats.folders_created, stats.folders_reused, stats.groups_failed
        );
        Ok((folders, stats))
    }

    async fn sync_one_group(
        &self,
        group: &Group,
        root_id: &str,
        notebook: Option<&NotebookSource>,
        stats: &mut FolderSyncStats,
    ) -> Result<GroupFolder, AppError> {
        let (folder_id, created) = self.find_or_create_folder(&group.name, Some(root_id)).await?;
        if created {
            stats.folders_created += 1;
        } else {
            stats.folders_reused += 1;
        }

        // Permission grants are idempotent at the API layer; an existing
        // grant is a harmless duplicate. Individual failures do not stop
        // the rest of the group.
        for member in &group.members {
            if member.email.is_empty() {
                continue;
            }
            if let Err(e) = self.drive.share_writer(&folder_id, &member.email).await {
                warn!(
                    "Failed to share {} with {}: {}",
                    group.name, member.email, e
                );
            }
            self.pacer.pace().await;
        }

        let sheet_id = self.ensure_members_sheet(group, &folder_id, stats).await?;

        if let Some(notebook) = notebook {
            self.seed_notebook_copies(group, &folder_id, notebook, stats)
                .await?;
        }

        Ok(GroupFolder {
            folder_url: format!("https://drive.google.com/drive/folders/{}", folder_id),
            sheet_id: Some(sheet_id),
            space_name: None,
            space_display_name: None,
            space_url: None,
        })
    }

    async fn find_or_create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<(String, bool), AppError> {
        if let Some(id) = self.drive.find_folder(name, parent_id).await? {
            return Ok((id, false));
        }
        let id = self.drive.create_folder(name, parent_id).await?;
        self.pacer.pace().await;
        Ok((id, true))
    }

    /// Ensure the `<group>_members` spreadsheet. Absent: create it with a
    /// header row plus one row per member. Present: no-op when the current
    /// values match, otherwise append a uniquely-named tab; prior
    /// snapshots are never overwritten.
    async fn ensure_members_sheet(
        &self,
        group: &Group,
        folder_id: &str,
        stats: &mut FolderSyncStats,
    ) -> Result<String, AppError> {
        let sheet_name = format!("{}_members", group.name);
        let values = member_values(group);

        let Some(sheet_id) = self.drive.find_spreadsheet(&sheet_name, folder_id).await? else {
            let sheet_id = self.drive.create_spreadsheet(&sheet_name, folder_id).await?;
            self.pacer.pace().await;
            self.drive
                .write_values(&sheet_id, "Sheet1!A1", &values)
                .await?;
            self.pacer.pace().await;
            stats.sheets_created += 1;
            return Ok(sheet_id);
        };

        let titles = self.drive.list_tab_titles(&sheet_id).await?;
        let current_tab = titles.last().cloned().unwrap_or_else(|| "Sheet1".to_string());
        let current = self
            .drive
            .read_values(&sheet_id, &format!("'{}'", current_tab))
            .await?;

        if current == values {
            stats.sheets_unchanged += 1;
            return Ok(sheet_id);
        }

        let mut version = 1;
        let mut new_tab = format!("Members_{}", version);
        while titles.contains(&new_tab) {
            version += 1;
            new_tab = format!("Members_{}", version);
        }

        self.drive.add_tab(&sheet_id, &new_tab).await?;
        self.pacer.pace().await;
        self.drive
            .write_values(&sheet_id, &format!("'{}'!A1", new_tab), &values)
            .await?;
        self.pacer.pace().await;
        stats.tabs_appended += 1;
        info!("Appended tab {} to {}", new_tab, sheet_name);
        Ok(sheet_id)
    }

    /// Find the seed notebook: the first `.ipynb` inside the root's
    /// `Initial Contents` folder. Its absence is a warning, not an error.
    async fn locate_notebook(&self, root_id: &str) -> Result<Option<NotebookSource>, AppError> {
        let Some(initial_id) = self
            .drive
            .find_folder(INITIAL_CONTENTS_FOLDER, Some(root_id))
            .await?
        else {
            warn!("No '{}' folder found, skipping notebook seeding", INITIAL_CONTENTS_FOLDER);
            return Ok(None);
        };

        let files = self.drive.list_files(&initial_id).await?;
        let notebook = files.into_iter().find(|f| f.name.ends_with(".ipynb"));
        match notebook {
            Some(file) => {
                info!("Found seed notebook: {}", file.name);
                Ok(Some(NotebookSource {
                    file_id: file.id,
                    file_name: file.name,
                }))
            }
            None => {
                warn!("No notebook file found in '{}'", INITIAL_CONTENTS_FOLDER);
                Ok(None)
            }
        }
    }

    /// Copy the seed notebook into the group folder as a FINAL copy plus
    /// one copy per member. Copies whose target name already exists are
    /// skipped, so reruns add nothing.
    async fn seed_notebook_copies(
        &self,
        group: &Group,
        folder_id: &str,
        notebook: &NotebookSource,
        stats: &mut FolderSyncStats,
    ) -> Result<(), AppError> {
        let existing: Vec<String> = self
            .drive
            .list_files(folder_id)
            .await?
            .into_iter()
            .map(|f| f.name)
            .collect();

        let mut targets = vec![notebook.file_name.replace(".ipynb", "_FINAL.ipynb")];
        for member in &group.members {
            let name_with_underscores = member.name.replace(' ', "_");
            targets.push(
                notebook
                    .file_name
                    .replace(".ipynb", &format!("_{}.ipynb", name_with_underscores)),
            );
        }

        for target in targets {
            if existing.contains(&target) {
                continue;
            }
            match self
                .drive
                .copy_file(&notebook.file_id, &target, folder_id)
                .await
            {
                Ok(_) => stats.notebooks_copied += 1,
                Err(e) => warn!("Failed to copy {} into {}: {}", target, group.name, e),
            }
            self.pacer.pace().await;
        }
        Ok(())
    }
}

fn member_values(group: &Group) -> Vec<Vec<String>> {
    let mut values = vec![SHEET_HEADER.iter().map(|s| s.to_string()).collect()];
    for member in &group.members {
        values.push(vec![member.name.clone(), member.email.clone()]);
    }
    values
}
