use serde::{Deserialize, Serialize};

/// External resources associated with one group, keyed by the group's
/// current display name. Space fields are filled in by the chat sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupFolder {
    pub folder_url: String,
    pub sheet_id: Option<String>,
    pub space_name: Option<String>,
    pub space_display_name: Option<String>,
    pub space_url: Option<String>,
}
