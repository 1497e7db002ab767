//! Sharing URL-type assignment submissions with course staff: each distinct
//! submitted Drive URL is resolved to its file ID and the staff list is
//! granted writer access on it, with a per-URL summary of who submitted it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::canvas::{CanvasClient, CanvasUrlSubmission};
use crate::drive::DriveClient;
use crate::error::AppError;
use crate::models::Roster;
use crate::pace::Pacer;

/// The submitters of one distinct URL.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UrlSubmitters {
    pub student_names: Vec<String>,
    pub unknown_user_ids: Vec<i64>,
}

#[derive(Debug, Default, Serialize)]
pub struct ShareStats {
    pub urls_shared: usize,
    pub urls_skipped: usize,
    pub grants_made: usize,
}

fn file_id_res() -> &'static [Regex] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"/d/([a-zA-Z0-9_-]+)").unwrap(),
            Regex::new(r"id=([a-zA-Z0-9_-]+)").unwrap(),
            Regex::new(r"/drive/([a-zA-Z0-9_-]+)").unwrap(),
        ]
    })
    .as_slice()
}

/// Extract the Drive file ID from a submitted file URL. Non-Drive URLs and
/// URLs with no recognizable ID segment yield `None`.
pub fn drive_file_id(url: &str) -> Option<String> {
    if !url.contains("google.com") {
        return None;
    }
    file_id_res()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Group submission rows by their submitted URL, resolving submitters
/// against the roster. Rows without a URL are ignored; submitters missing
/// from the roster are kept as unknown user IDs.
pub fn summarize_by_url(
    submissions: &[CanvasUrlSubmission],
    roster: &Roster,
) -> BTreeMap<String, UrlSubmitters> {
    let mut by_url: BTreeMap<String, UrlSubmitters> = BTreeMap::new();
    for submission in submissions {
        let Some(url) = &submission.url else {
            continue;
        };
        let entry = by_url.entry(url.clone()).or_default();
        match roster.get(&submission.user_id) {
            Some(student) => entry.student_names.push(student.student_name.clone()),
            None => entry.unknown_user_ids.push(submission.user_id),
        }
    }
    by_url
}

/// Grants staff writer access on each distinct submitted Drive file.
pub struct SubmissionSharer {
    canvas: Arc<dyn CanvasClient>,
    drive: Arc<dyn DriveClient>,
    pacer: Arc<dyn Pacer>,
}

impl SubmissionSharer {
    pub fn new(
        canvas: Arc<dyn CanvasClient>,
        drive: Arc<dyn DriveClient>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            canvas,
            drive,
            pacer,
        }
    }

    /// Share every distinct submitted Drive URL of `assignment_id` with
    /// `staff_emails`. Unparseable URLs and individual grant failures are
    /// logged and skipped; the remaining URLs still proceed.
    pub async fn share_url_submissions(
        &self,
        assignment_id: i64,
        roster: &Roster,
        staff_emails: &[String],
    ) -> Result<ShareStats, AppError> {
        let submissions = self.canvas.list_assignment_submissions(assignment_id).await?;
        let by_url = summarize_by_url(&submissions, roster);

        let mut stats = ShareStats::default();
        for (url, submitters) in &by_url {
            info!(
                "URL {} submitted by: {}",
                url,
                submitters.student_names.join(", ")
            );
            if !submitters.unknown_user_ids.is_empty() {
                warn!(
                    "URL {} has submitters missing from the roster: {:?}",
                    url, submitters.unknown_user_ids
                );
            }

            let Some(file_id) = drive_file_id(url) else {
                warn!("Could not extract a Drive file ID from {}, skipped", url);
                stats.urls_skipped += 1;
                continue;
            };

            for email in staff_emails {
                match self.drive.share_writer(&file_id, email).await {
                    Ok(()) => stats.grants_made += 1,
                    Err(e) => warn!("Failed to share {} with {}: {}", url, email, e),
                }
                self.pacer.pace().await;
            }
            stats.urls_shared += 1;
        }

        info!(
            "Submission sharing done: {} URLs shared, {} skipped, {} grants",
            stats.urls_shared, stats.urls_skipped, stats.grants_made
        );
        Ok(stats)
    }
}
