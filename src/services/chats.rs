//! Idempotent chat space synchronization: one space per group, members
//! invited, and a welcome message posted at most once per template text.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chat::{ChatClient, PeopleClient};
use crate::dedup::DuplicateCheck;
use crate::error::AppError;
use crate::models::{group_sort_key, GroupFolder, Space};
use crate::pace::Pacer;

/// Literal name-shortening rules applied to computed space display names.
const NAME_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("Week-4-Lecture-Group ", "Group "),
    ("MidtermProject", ""),
];

/// Compute a group's space display name from the activity name, applying
/// the shortening substitutions.
pub fn space_display_name(activity_name: &str, group_name: &str) -> String {
    let mut name = format!("{} - {}", activity_name, group_name);
    for (from, to) in NAME_SUBSTITUTIONS {
        name = name.replace(from, to);
    }
    name
}

/// The welcome message body, per activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeTemplate {
    Lecture,
    Project,
}

impl WelcomeTemplate {
    pub fn body(&self, space_display_name: &str, group_name: &str, folder_url: &str) -> String {
        match self {
            WelcomeTemplate::Lecture => format!(
                "This chat channel is for your group: {}\n\n\
                 Your group folder is at this link: {}\n\n\
                 You should find files with your own name in that folder, \
                 as well as a FINAL file.\n\n\
                 Do your own work in the file with your name. \
                 There should also be a FINAL file. You need to coordinate \
                 with your fellow team members to update that file. You can \
                 use this chat (or any other way of communicating) to make \
                 sure only one person edits that at a time.",
                space_display_name, folder_url
            ),
            WelcomeTemplate::Project => format!(
                "This chat channel is for your group: {}\n\n\
                 Your group folder is at this link: {}\n\n\
                 More instructions for using this chat channel will be \
                 posted shortly.",
                group_name, folder_url
            ),
        }
    }
}

/// The full list of existing spaces, fetched once and carried for the
/// duration of one synchronization pass. Never refreshed within a pass;
/// spaces created during the pass are inserted by hand.
pub struct SpaceDirectory {
    spaces: Vec<Space>,
}

impl SpaceDirectory {
    pub async fn load(chat: &dyn ChatClient) -> Result<Self, AppError> {
        let spaces = chat.list_spaces().await?;
        info!("Loaded {} existing spaces", spaces.len());
        Ok(Self { spaces })
    }

    pub fn from_spaces(spaces: Vec<Space>) -> Self {
        Self { spaces }
    }

    pub fn find(&self, display_name: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.display_name == display_name)
    }

    pub fn insert(&mut self, space: Space) {
        self.spaces.push(space);
    }
}

pub struct ChatSpaceSynchronizer {
    chat: Arc<dyn ChatClient>,
    people: Arc<dyn PeopleClient>,
    pacer: Arc<dyn Pacer>,
    dedup: Arc<dyn DuplicateCheck>,
    email_domain: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ChatSyncStats {
    pub spaces_created: usize,
    pub spaces_reused: usize,
    pub members_invited: usize,
    pub messages_sent: usize,
    pub messages_skipped: usize,
    pub groups_failed: usize,
}

impl ChatSpaceSynchronizer {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        people: Arc<dyn PeopleClient>,
        pacer: Arc<dyn Pacer>,
        dedup: Arc<dyn DuplicateCheck>,
        email_domain: &str,
    ) -> Self {
        Self {
            chat,
            people,
            pacer,
            dedup,
            email_domain: email_domain.to_string(),
        }
    }

    /// Ensure one space per group, invite missing members, and post the
    /// welcome message unless an identical one already exists. Fills the
    /// space fields of `folders` as it goes.
    pub async fn ensure_group_chats(
        &self,
        group_emails: &BTreeMap<String, Vec<String>>,
        folders: &mut BTreeMap<String, GroupFolder>,
        activity_name: &str,
        template: WelcomeTemplate,
        directory: &mut SpaceDirectory,
    ) -> Result<ChatSyncStats, AppError> {
        let mut group_names: Vec<String> = group_emails.keys().cloned().collect();
        group_names.sort_by_key(|n| group_sort_key(n));

        let mut stats = ChatSyncStats::default();

        for group_name in &group_names {
            if group_name.is_empty() {
                continue;
            }
            let display_name = space_display_name(activity_name, group_name);
            info!("Processing chat for group: {}", display_name);

            let emails = &group_emails[group_name];
            match self
                .sync_one_space(group_name, &display_name, emails, folders, template, directory, &mut stats)
                .await
            {
                Ok(()) => {}
                Err(e) => {
                    warn!("Failed to sync chat for group {}: {}", group_name, e);
                    stats.groups_failed += 1;
                }
            }
        }

        info!(
            "Chat sync done: {} created, {} reused, {} invited, {} messages sent",
            stats.spaces_created, stats.spaces_reused, stats.members_invited, stats.messages_sent
        );
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    async fn sync_one_space(
        &self,
        group_name: &str,
        display_name: &str,
        emails: &[String],
        folders: &mut BTreeMap<String, GroupFolder>,
        template: WelcomeTemplate,
        directory: &mut SpaceDirectory,
        stats: &mut ChatSyncStats,
    ) -> Result<(), AppError> {
        let space = match directory.find(display_name) {
            Some(space) => {
                stats.spaces_reused += 1;
                space.clone()
            }
            None => {
                let space = self.chat.create_space(display_name).await?;
                self.pacer.pace().await;
                info!("Created space {}: {}", display_name, space.name);
                directory.insert(space.clone());
                stats.spaces_created += 1;
                space
            }
        };

        let existing_emails = self.resolve_member_emails(&space).await?;

        for email in emails {
            if existing_emails.contains(email) {
                continue;
            }
            match self.chat.invite_member(&space.name, email).await {
                Ok(()) => {
                    info!("Added {} to {}", email, display_name);
                    stats.members_invited += 1;
                }
                Err(e) => warn!("Failed to add {} to {}: {}", email, display_name, e),
            }
            self.pacer.pace().await;
        }

        if let Some(folder) = folders.get_mut(group_name) {
            let body = template.body(display_name, group_name, &folder.folder_url);
            self.send_unless_sent(&space, &body, stats).await?;
            folder.space_name = Some(space.name.clone());
            folder.space_display_name = Some(space.display_name.clone());
            folder.space_url = Some(space.url());
        } else {
            warn!("No group folder known for {}, welcome message skipped", group_name);
        }

        Ok(())
    }

    /// Post `body` only if no recent message has exactly the same text.
    async fn send_unless_sent(
        &self,
        space: &Space,
        body: &str,
        stats: &mut ChatSyncStats,
    ) -> Result<(), AppError> {
        let recent = self.chat.list_recent_messages(&space.name).await?;
        let texts: Vec<String> = recent.into_iter().map(|m| m.text).collect();

        if self.dedup.is_duplicate(body, &texts) {
            info!("Message already sent to {}", space.display_name);
            stats.messages_skipped += 1;
            return Ok(());
        }

        info!("Sending welcome message to {}", space.display_name);
        self.chat.send_message(&space.name, body).await?;
        self.pacer.pace().await;
        stats.messages_sent += 1;
        Ok(())
    }

    /// Resolve the space's opaque member IDs to course-domain emails. Each
    /// person lookup is paced; members without a course email are ignored.
    async fn resolve_member_emails(&self, space: &Space) -> Result<Vec<String>, AppError> {
        let ids = self.chat.list_member_ids(&space.name).await?;
        let mut emails = Vec::new();
        for id in ids {
            let person = self.people.lookup_person(&id).await?;
            self.pacer.pace().await;
            if let Some(email) = person.email_in_domain(&self.email_domain) {
                emails.push(email);
            }
        }
        Ok(emails)
    }

    /// Invite per-section staff into each group's space. The section token
    /// is the last word of the space display name, parentheses stripped.
    pub async fn invite_staff(
        &self,
        folders: &BTreeMap<String, GroupFolder>,
        section_to_staff: &BTreeMap<String, Vec<String>>,
        directory: &SpaceDirectory,
    ) -> Result<usize, AppError> {
        let mut group_names: Vec<String> = folders.keys().cloned().collect();
        group_names.sort_by_key(|n| group_sort_key(n));

        let mut invited = 0;
        for group_name in &group_names {
            let folder = &folders[group_name];
            let Some(display_name) = folder.space_display_name.as_deref() else {
                warn!("No space recorded for group {}, staff skipped", group_name);
                continue;
            };
            let Some(space) = directory.find(display_name) else {
                warn!("Space {} not found, staff skipped", display_name);
                continue;
            };

            let section = display_name
                .replace(['(', ')'], "")
                .split(' ')
                .next_back()
                .unwrap_or_default()
                .to_string();
            let Some(staff_emails) = section_to_staff.get(&section) else {
                warn!("No staff known for section {} ({})", section, display_name);
                continue;
            };

            let existing_emails = self.resolve_member_emails(space).await?;
            for email in staff_emails {
                if existing_emails.contains(email) {
                    continue;
                }
                match self.chat.invite_member(&space.name, email).await {
                    Ok(()) => {
                        info!("Added staff {} to {}", email, display_name);
                        invited += 1;
                    }
                    Err(e) => warn!("Failed to add staff {} to {}: {}", email, display_name, e),
                }
                self.pacer.pace().await;
            }
        }
        Ok(invited)
    }
}
