//! Posting feedback as submission comments, with duplicate detection and a
//! human confirmation gate. A missed or duplicated grade comment is a
//! correctness issue, so lookup and post errors propagate to the caller.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{info, warn};

use crate::canvas::{CanvasAssignment, CanvasClient};
use crate::dedup::DuplicateCheck;
use crate::error::AppError;
use crate::models::StudentMessage;
use crate::pace::Pacer;

/// The interactive gate in front of an irreversible, student-visible post.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool, AppError>;
}

/// Blocks on console input; `y`/`yes` confirms.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, AppError> {
        print!("{} [y/N] ", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let answer = line.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Confirms everything; for non-interactive runs.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool, AppError> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Posted,
    AlreadyPosted,
    Declined,
}

pub struct FeedbackPoster {
    canvas: Arc<dyn CanvasClient>,
    dedup: Arc<dyn DuplicateCheck>,
    confirm: Arc<dyn Confirm>,
    pacer: Arc<dyn Pacer>,
}

impl FeedbackPoster {
    pub fn new(
        canvas: Arc<dyn CanvasClient>,
        dedup: Arc<dyn DuplicateCheck>,
        confirm: Arc<dyn Confirm>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            canvas,
            dedup,
            confirm,
            pacer,
        }
    }

    /// Post `html_comment` on the student's submission unless an equal
    /// (after trim) comment already exists. Existing comments come from
    /// the GraphQL endpoint first; the REST endpoint is consulted only
    /// when GraphQL returns none, with a diagnostic comparison log.
    pub async fn post_feedback_unless_duplicate(
        &self,
        assignment_id: i64,
        student_id: i64,
        html_comment: &str,
    ) -> Result<FeedbackOutcome, AppError> {
        let graphql_comments = self
            .canvas
            .graphql_submission_comments(assignment_id, student_id)
            .await?;

        let existing = if graphql_comments.is_empty() {
            let rest_comments = self
                .canvas
                .list_submission_comments(assignment_id, student_id)
                .await?;
            info!(
                "GraphQL returned no comments for student {}; REST returned {}",
                student_id,
                rest_comments.len()
            );
            rest_comments
        } else {
            graphql_comments
        };

        if self.dedup.is_duplicate(html_comment, &existing) {
            info!(
                "Comment already posted for student {} on assignment {}",
                student_id, assignment_id
            );
            return Ok(FeedbackOutcome::AlreadyPosted);
        }

        let prompt = format!(
            "Post comment to student {} on assignment {}?",
            student_id, assignment_id
        );
        if !self.confirm.confirm(&prompt)? {
            warn!("Skipped posting to student {} (not confirmed)", student_id);
            return Ok(FeedbackOutcome::Declined);
        }

        self.canvas
            .post_submission_comment(assignment_id, student_id, html_comment)
            .await?;
        self.pacer.pace().await;
        info!(
            "Posted comment for student {} on assignment {}",
            student_id, assignment_id
        );
        Ok(FeedbackOutcome::Posted)
    }
}

/// Find an assignment by name. Absence is a configuration error: the run
/// cannot produce meaningful output without it.
pub async fn locate_assignment(
    canvas: &dyn CanvasClient,
    name: &str,
) -> Result<CanvasAssignment, AppError> {
    let assignments = canvas.list_assignments().await?;
    assignments
        .into_iter()
        .find(|a| a.name == name)
        .ok_or_else(|| AppError::Config(format!("Assignment not found: {}", name)))
}

/// Render a student's chat activity as the HTML feedback body.
pub fn build_feedback_html(activity_name: &str, messages: &[StudentMessage]) -> String {
    let mut html = format!(
        "<p>Chat messages we have recorded from you for {}:</p>\n<ul>\n",
        escape_html(activity_name)
    );
    for message in messages {
        html.push_str(&format!(
            "<li>[{}] {}</li>\n",
            escape_html(&message.create_time),
            escape_html(&message.text)
        ));
    }
    html.push_str("</ul>");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
