pub mod dto;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub use dto::*;

/// The LMS endpoints the reconciliation core consumes. List operations
/// return all pages as one flat, ordered Vec.
#[async_trait]
pub trait CanvasClient: Send + Sync {
    async fn list_students(&self) -> Result<Vec<CanvasUser>, AppError>;
    async fn list_sections(&self) -> Result<Vec<CanvasSection>, AppError>;
    async fn list_section_enrollments(
        &self,
        section_id: i64,
    ) -> Result<Vec<CanvasEnrollment>, AppError>;
    async fn list_groups(&self, group_category_id: &str) -> Result<Vec<CanvasGroup>, AppError>;
    async fn list_group_members(&self, group_id: i64) -> Result<Vec<CanvasUser>, AppError>;
    async fn rename_group(&self, group_id: i64, new_name: &str) -> Result<(), AppError>;
    async fn list_assignments(&self) -> Result<Vec<CanvasAssignment>, AppError>;
    /// All submission rows of one assignment.
    async fn list_assignment_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<CanvasUrlSubmission>, AppError>;
    /// Existing submission comments via the REST endpoint.
    async fn list_submission_comments(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Vec<String>, AppError>;
    /// Existing submission comments via the GraphQL endpoint.
    async fn graphql_submission_comments(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Vec<String>, AppError>;
    async fn post_submission_comment(
        &self,
        assignment_id: i64,
        user_id: i64,
        comment: &str,
    ) -> Result<(), AppError>;
}

pub struct CanvasHttpClient {
    client: Client,
    base_url: String,
    token: String,
    course_id: String,
}

impl CanvasHttpClient {
    pub fn new(base_url: &str, token: &str, course_id: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            course_id: course_id.to_string(),
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Fetch every page of a list endpoint, following the `Link` header's
    /// `rel="next"` relation until it disappears.
    async fn get_paginated<T: DeserializeOwned>(&self, first_url: String) -> Result<Vec<T>, AppError> {
        let mut all = Vec::new();
        let mut url = Some(first_url);

        while let Some(page_url) = url {
            let response = self
                .client
                .get(&page_url)
                .header("Authorization", format!("Bearer {}", self.token))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(AppError::from_response("Canvas", response).await);
            }

            let next = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let page: Vec<T> = response.json().await?;
            all.extend(page);
            url = next;
        }

        Ok(all)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, AppError> {
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Canvas", response).await);
        }

        Ok(response.json::<T>().await?)
    }

    async fn put_json(&self, url: String, body: &serde_json::Value) -> Result<(), AppError> {
        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Canvas", response).await);
        }

        Ok(())
    }
}

/// Extract the `rel="next"` URL from an RFC 5988 `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    for part in header.split(',') {
        let mut segments = part.split(';');
        let url = segments.next()?.trim();
        let is_next = segments
            .any(|s| s.trim() == "rel=\"next\"" || s.trim() == "rel=next");
        if is_next {
            return Some(url.trim_matches(|c| c == '<' || c == '>').to_string());
        }
    }
    None
}

#[async_trait]
impl CanvasClient for CanvasHttpClient {
    async fn list_students(&self) -> Result<Vec<CanvasUser>, AppError> {
        let url = self.rest_url(&format!(
            "courses/{}/users?enrollment_type[]=student&per_page=100",
            self.course_id
        ));
        self.get_paginated(url).await
    }

    async fn list_sections(&self) -> Result<Vec<CanvasSection>, AppError> {
        let url = self.rest_url(&format!("courses/{}/sections?per_page=100", self.course_id));
        self.get_paginated(url).await
    }

    async fn list_section_enrollments(
        &self,
        section_id: i64,
    ) -> Result<Vec<CanvasEnrollment>, AppError> {
        let url = self.rest_url(&format!("sections/{}/enrollments?per_page=100", section_id));
        self.get_paginated(url).await
    }

    async fn list_groups(&self, group_category_id: &str) -> Result<Vec<CanvasGroup>, AppError> {
        let url = self.rest_url(&format!(
            "group_categories/{}/groups?per_page=100",
            group_category_id
        ));
        self.get_paginated(url).await
    }

    async fn list_group_members(&self, group_id: i64) -> Result<Vec<CanvasUser>, AppError> {
        let url = self.rest_url(&format!("groups/{}/users?per_page=100", group_id));
        self.get_paginated(url).await
    }

    async fn rename_group(&self, group_id: i64, new_name: &str) -> Result<(), AppError> {
        let url = self.rest_url(&format!("groups/{}", group_id));
        let body = serde_json::json!({ "name": new_name });
        self.put_json(url, &body).await
    }

    async fn list_assignments(&self) -> Result<Vec<CanvasAssignment>, AppError> {
        let url = self.rest_url(&format!(
            "courses/{}/assignments?per_page=100",
            self.course_id
        ));
        self.get_paginated(url).await
    }

    async fn list_assignment_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<CanvasUrlSubmission>, AppError> {
        let url = self.rest_url(&format!(
            "courses/{}/assignments/{}/submissions?per_page=100",
            self.course_id, assignment_id
        ));
        self.get_paginated(url).await
    }

    async fn list_submission_comments(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Vec<String>, AppError> {
        let url = self.rest_url(&format!(
            "courses/{}/assignments/{}/submissions/{}?include[]=submission_comments",
            self.course_id, assignment_id, user_id
        ));
        let submission: CanvasSubmission = self.get_json(url).await?;
        Ok(submission
            .submission_comments
            .into_iter()
            .map(|c| c.comment)
            .collect())
    }

    async fn graphql_submission_comments(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Vec<String>, AppError> {
        let url = format!("{}/api/graphql", self.base_url);
        let request = GraphQlRequest {
            query: "query($assignmentId: ID!, $userId: ID!) { \
                    submission(assignmentId: $assignmentId, userId: $userId) { \
                    commentsConnection { nodes { comment } } } }"
                .to_string(),
            variables: serde_json::json!({
                "assignmentId": assignment_id.to_string(),
                "userId": user_id.to_string(),
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Canvas", response).await);
        }

        let envelope: GraphQlEnvelope = response.json().await?;
        let nodes = envelope
            .data
            .and_then(|d| d.submission)
            .and_then(|s| s.comments_connection)
            .map(|c| c.nodes)
            .unwrap_or_default();

        Ok(nodes.into_iter().filter_map(|n| n.comment).collect())
    }

    async fn post_submission_comment(
        &self,
        assignment_id: i64,
        user_id: i64,
        comment: &str,
    ) -> Result<(), AppError> {
        let url = self.rest_url(&format!(
            "courses/{}/assignments/{}/submissions/{}",
            self.course_id, assignment_id, user_id
        ));
        let body = serde_json::json!({ "comment": { "text_comment": comment } });
        self.put_json(url, &body).await
    }
}
