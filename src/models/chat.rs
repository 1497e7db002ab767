use serde::{Deserialize, Serialize};

/// A chat space. `name` is the stable resource name (`spaces/XXXX`);
/// `display_name` is the human-visible title matched during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub name: String,
    pub display_name: String,
}

impl Space {
    /// Browser URL for the space, derived from the resource name.
    pub fn url(&self) -> String {
        let id = self.name.split('/').nth(1).unwrap_or(&self.name);
        format!("https://chat.google.com/room/{}", id)
    }
}

/// One message in a space, identified by its resource name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub name: String,
    pub sender_id: String,
    pub text: String,
    pub create_time: String,
}

/// A person resolved from an opaque chat member ID.
#[derive(Debug, Clone, Default)]
pub struct Person {
    pub display_name: Option<String>,
    pub emails: Vec<String>,
}

impl Person {
    /// The first email under the course domain, if any.
    pub fn email_in_domain(&self, domain: &str) -> Option<String> {
        let suffix = format!("@{}", domain);
        self.emails.iter().find(|e| e.ends_with(&suffix)).cloned()
    }
}

/// One chat message attributed to a student, as summarized per group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentMessage {
    pub group_name: String,
    pub email: String,
    pub display_name: String,
    pub create_time: String,
    pub text: String,
}
