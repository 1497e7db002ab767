pub mod chats;
pub mod feedback;
pub mod folders;
pub mod groups;
pub mod merge;
pub mod messages;
pub mod rename;
pub mod roster;
pub mod submissions;

pub use chats::{
    space_display_name, ChatSpaceSynchronizer, ChatSyncStats, SpaceDirectory, WelcomeTemplate,
};
pub use feedback::{
    build_feedback_html, locate_assignment, AlwaysConfirm, Confirm, FeedbackOutcome,
    FeedbackPoster, StdinConfirm,
};
pub use folders::{FolderSyncStats, GroupFolderSynchronizer};
pub use groups::GroupStore;
pub use merge::{merge, MergePolicy};
pub use messages::{summarize_by_email, MessageReader};
pub use rename::{section_suffix, GroupRenamer, RenameStats};
pub use roster::RosterStore;
pub use submissions::{
    drive_file_id, summarize_by_url, ShareStats, SubmissionSharer, UrlSubmitters,
};
