use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use course_sync::canvas::{
    CanvasAssignment, CanvasClient, CanvasEnrollment, CanvasGroup, CanvasSection, CanvasUser,
    CanvasUrlSubmission,
};
use course_sync::dedup::ExactTrimMatch;
use course_sync::error::AppError;
use course_sync::models::StudentMessage;
use course_sync::pace::{NoDelay, Pacer};
use course_sync::services::{
    build_feedback_html, locate_assignment, AlwaysConfirm, Confirm, FeedbackOutcome,
    FeedbackPoster,
};

#[derive(Default)]
struct CanvasState {
    graphql_comments: Vec<String>,
    rest_comments: Vec<String>,
    posted: Vec<(i64, i64, String)>,
    rest_calls: usize,
}

#[derive(Default)]
struct FakeCanvas {
    state: Mutex<CanvasState>,
}

#[async_trait]
impl CanvasClient for FakeCanvas {
    async fn list_students(&self) -> Result<Vec<CanvasUser>, AppError> {
        Ok(vec![])
    }

    async fn list_sections(&self) -> Result<Vec<CanvasSection>, AppError> {
        Ok(vec![])
    }

    async fn list_section_enrollments(
        &self,
        _section_id: i64,
    ) -> Result<Vec<CanvasEnrollment>, AppError> {
        Ok(vec![])
    }

    async fn list_groups(&self, _group_category_id: &str) -> Result<Vec<CanvasGroup>, AppError> {
        Ok(vec![])
    }

    async fn list_group_members(&self, _group_id: i64) -> Result<Vec<CanvasUser>, AppError> {
        Ok(vec![])
    }

    async fn rename_group(&self, _group_id: i64, _new_name: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_assignments(&self) -> Result<Vec<CanvasAssignment>, AppError> {
        Ok(vec![
            CanvasAssignment {
                id: 10,
                name: "Week 4 Chat".to_string(),
            },
            CanvasAssignment {
                id: 11,
                name: "Week 5 Chat".to_string(),
            },
        ])
    }

    async fn list_assignment_submissions(
        &self,
        _assignment_id: i64,
    ) -> Result<Vec<CanvasUrlSubmission>, AppError> {
        Ok(vec![])
    }

    async fn list_submission_comments(
        &self,
        _assignment_id: i64,
        _user_id: i64,
    ) -> Result<Vec<String>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.rest_calls += 1;
        Ok(state.rest_comments.clone())
    }

    async fn graphql_submission_comments(
        &self,
        _assignment_id: i64,
        _user_id: i64,
    ) -> Result<Vec<String>, AppError> {
        Ok(self.state.lock().unwrap().graphql_comments.clone())
    }

    async fn post_submission_comment(
        &self,
        assignment_id: i64,
        user_id: i64,
        comment: &str,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let record = (assignment_id, user_id, comment.to_string());
        state.posted.push(record);
        state.graphql_comments.push(comment.to_string());
        Ok(())
    }
}

struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool, AppError> {
        Ok(false)
    }
}

fn poster(canvas: Arc<FakeCanvas>, confirm: Arc<dyn Confirm>) -> FeedbackPoster {
    FeedbackPoster::new(canvas, Arc::new(ExactTrimMatch), confirm, Arc::new(NoDelay))
}

#[derive(Default)]
struct CountingPacer {
    calls: Mutex<usize>,
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pace(&self) {
        *self.calls.lock().unwrap() += 1;
    }
}

#[tokio::test]
async fn posts_once_then_detects_the_duplicate() {
    let canvas = Arc::new(FakeCanvas::default());
    let poster = poster(canvas.clone(), Arc::new(AlwaysConfirm));

    let outcome = poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(outcome, FeedbackOutcome::Posted);

    let outcome = poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(outcome, FeedbackOutcome::AlreadyPosted);

    assert_eq!(canvas.state.lock().unwrap().posted.len(), 1);
}

#[tokio::test]
async fn whitespace_variants_count_as_duplicates() {
    let canvas = Arc::new(FakeCanvas::default());
    canvas.state.lock().unwrap().graphql_comments =
        vec!["  <p>feedback</p>\n".to_string()];
    let poster = poster(canvas.clone(), Arc::new(AlwaysConfirm));

    let outcome = poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(outcome, FeedbackOutcome::AlreadyPosted);
    assert!(canvas.state.lock().unwrap().posted.is_empty());
}

#[tokio::test]
async fn rest_comments_are_consulted_only_when_graphql_is_empty() {
    let canvas = Arc::new(FakeCanvas::default());
    canvas.state.lock().unwrap().rest_comments = vec!["<p>feedback</p>".to_string()];
    let poster = poster(canvas.clone(), Arc::new(AlwaysConfirm));

    let outcome = poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(outcome, FeedbackOutcome::AlreadyPosted);
    assert_eq!(canvas.state.lock().unwrap().rest_calls, 1);

    // With GraphQL data present the REST endpoint stays untouched.
    canvas.state.lock().unwrap().graphql_comments = vec!["other".to_string()];
    let outcome = poster
        .post_feedback_unless_duplicate(10, 2, "<p>new feedback</p>")
        .await
        .unwrap();
    assert_eq!(outcome, FeedbackOutcome::Posted);
    assert_eq!(canvas.state.lock().unwrap().rest_calls, 1);
}

#[tokio::test]
async fn posting_is_paced_but_skips_are_not() {
    let canvas = Arc::new(FakeCanvas::default());
    let pacer = Arc::new(CountingPacer::default());
    let poster = FeedbackPoster::new(
        canvas.clone(),
        Arc::new(ExactTrimMatch),
        Arc::new(AlwaysConfirm),
        pacer.clone(),
    );

    poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(*pacer.calls.lock().unwrap(), 1);

    // The duplicate path makes no mutating call, so no pause follows.
    poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(*pacer.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn declined_confirmation_posts_nothing() {
    let canvas = Arc::new(FakeCanvas::default());
    let poster = poster(canvas.clone(), Arc::new(NeverConfirm));

    let outcome = poster
        .post_feedback_unless_duplicate(10, 1, "<p>feedback</p>")
        .await
        .unwrap();
    assert_eq!(outcome, FeedbackOutcome::Declined);
    assert!(canvas.state.lock().unwrap().posted.is_empty());
}

#[tokio::test]
async fn locate_assignment_matches_by_exact_name() {
    let canvas = FakeCanvas::default();
    let assignment = locate_assignment(&canvas, "Week 5 Chat").await.unwrap();
    assert_eq!(assignment.id, 11);

    let err = locate_assignment(&canvas, "Week 6 Chat").await.unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn feedback_html_lists_messages_and_escapes_markup() {
    let messages = vec![
        StudentMessage {
            group_name: "Group 1".to_string(),
            email: "ada@ucsb.edu".to_string(),
            display_name: "Ada Lovelace".to_string(),
            create_time: "2024-01-01T00:00:00Z".to_string(),
            text: "we should use <b> tags & stuff".to_string(),
        },
        StudentMessage {
            group_name: "Group 1".to_string(),
            email: "ada@ucsb.edu".to_string(),
            display_name: "Ada Lovelace".to_string(),
            create_time: "2024-01-01T00:05:00Z".to_string(),
            text: "done".to_string(),
        },
    ];

    let html = build_feedback_html("Week 4 Chat", &messages);
    assert!(html.starts_with("<p>"));
    assert_eq!(html.matches("<li>").count(), 2);
    assert!(html.contains("we should use &lt;b&gt; tags &amp; stuff"));
    assert!(html.contains("Week 4 Chat"));
}
