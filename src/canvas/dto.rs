use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub integration_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasSection {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasEnrollment {
    pub user_id: i64,
    pub role: String,
    #[serde(default)]
    pub user: Option<CanvasEnrollmentUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasEnrollmentUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub integration_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub leader: Option<CanvasGroupLeader>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasGroupLeader {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasAssignment {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasSubmission {
    #[serde(default)]
    pub submission_comments: Vec<CanvasSubmissionComment>,
}

/// One row of an assignment's submission list. `url` is present only for
/// URL-type submissions.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasUrlSubmission {
    pub user_id: i64,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasSubmissionComment {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlEnvelope {
    #[serde(default)]
    pub data: Option<GraphQlData>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlData {
    #[serde(default)]
    pub submission: Option<GraphQlSubmission>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlSubmission {
    #[serde(default)]
    pub comments_connection: Option<GraphQlComments>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlComments {
    #[serde(default)]
    pub nodes: Vec<GraphQlCommentNode>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlCommentNode {
    #[serde(default)]
    pub comment: Option<String>,
}
