use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::chat::{ChatClient, PeopleClient};
use crate::error::AppError;
use crate::models::{group_sort_key, GroupFolder, StudentMessage};
use crate::pace::Pacer;

/// Reads each group's space messages and attributes them to students by
/// resolved email, in API return order (assumed chronological).
pub struct MessageReader {
    chat: Arc<dyn ChatClient>,
    people: Arc<dyn PeopleClient>,
    pacer: Arc<dyn Pacer>,
    email_domain: String,
    instructor_emails: Vec<String>,
}

impl MessageReader {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        people: Arc<dyn PeopleClient>,
        pacer: Arc<dyn Pacer>,
        email_domain: &str,
        instructor_emails: &[String],
    ) -> Self {
        Self {
            chat,
            people,
            pacer,
            email_domain: email_domain.to_string(),
            instructor_emails: instructor_emails.to_vec(),
        }
    }

    /// Read messages from every group space recorded in `folders`, joined
    /// on the stable space resource name.
    pub async fn read_group_messages(
        &self,
        folders: &BTreeMap<String, GroupFolder>,
    ) -> Result<Vec<StudentMessage>, AppError> {
        let mut group_names: Vec<String> = folders.keys().cloned().collect();
        group_names.sort_by_key(|n| group_sort_key(n));

        let mut result = Vec::new();
        for group_name in &group_names {
            if group_name.is_empty() {
                continue;
            }
            let Some(space_name) = folders[group_name].space_name.as_deref() else {
                warn!("No space recorded for group {}, messages skipped", group_name);
                continue;
            };

            info!("Reading messages from {}", space_name);
            let messages = self.chat.list_recent_messages(space_name).await?;

            for message in messages {
                if message.sender_id.is_empty() {
                    continue;
                }
                let person = self.people.lookup_person(&message.sender_id).await?;
                self.pacer.pace().await;

                let Some(email) = person.email_in_domain(&self.email_domain) else {
                    warn!(
                        "No course email for sender {} in {}",
                        message.sender_id, space_name
                    );
                    continue;
                };
                if self.instructor_emails.contains(&email) {
                    continue;
                }

                result.push(StudentMessage {
                    group_name: group_name.clone(),
                    email,
                    display_name: person.display_name.unwrap_or_default(),
                    create_time: message.create_time,
                    text: message.text,
                });
            }
        }

        info!("Collected {} student messages", result.len());
        Ok(result)
    }
}

/// Group messages per student email, preserving message order.
pub fn summarize_by_email(messages: &[StudentMessage]) -> BTreeMap<String, Vec<StudentMessage>> {
    let mut by_email: BTreeMap<String, Vec<StudentMessage>> = BTreeMap::new();
    for message in messages {
        by_email
            .entry(message.email.clone())
            .or_default()
            .push(message.clone());
    }
    by_email
}
