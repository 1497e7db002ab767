use std::env;
use std::fs;

use crate::error::AppError;

/// Runtime configuration for one synchronization run.
///
/// Bearer tokens are read from local token files; OAuth acquisition and
/// refresh happen outside this tool.
#[derive(Clone, Debug)]
pub struct Config {
    pub canvas_api_url: String,
    pub canvas_token: String,
    pub course_id: String,
    pub group_category_id: String,
    pub google_token: String,
    pub projects_folder_name: String,
    pub activity_name: String,
    pub test_student_name: String,
    pub email_domain: String,
    pub instructor_emails: Vec<String>,
    pub sleep_ms: u64,
}

impl Config {
    pub fn new_from_env() -> Result<Self, AppError> {
        let canvas_api_url = env::var("CANVAS_API_URL")
            .map_err(|_| AppError::Config("CANVAS_API_URL is not set".to_string()))?;
        let canvas_token = read_token_file(
            &env::var("CANVAS_TOKEN_FILE").unwrap_or_else(|_| "CANVAS_API_TOKEN".to_string()),
        )?;
        let course_id = env::var("COURSE_ID")
            .map_err(|_| AppError::Config("COURSE_ID is not set".to_string()))?;
        let group_category_id = env::var("GROUP_CATEGORY_ID")
            .map_err(|_| AppError::Config("GROUP_CATEGORY_ID is not set".to_string()))?;
        let google_token = read_token_file(
            &env::var("GOOGLE_TOKEN_FILE").unwrap_or_else(|_| "GOOGLE_API_TOKEN".to_string()),
        )?;
        let projects_folder_name = env::var("PROJECTS_FOLDER_NAME")
            .map_err(|_| AppError::Config("PROJECTS_FOLDER_NAME is not set".to_string()))?;
        let activity_name = env::var("ACTIVITY_NAME")
            .map_err(|_| AppError::Config("ACTIVITY_NAME is not set".to_string()))?;

        let test_student_name =
            env::var("TEST_STUDENT_NAME").unwrap_or_else(|_| "Test Student".to_string());
        let email_domain = env::var("EMAIL_DOMAIN").unwrap_or_else(|_| "ucsb.edu".to_string());
        let instructor_emails = env::var("INSTRUCTOR_EMAILS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let sleep_ms = env::var("API_SLEEP_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1100);

        Ok(Self {
            canvas_api_url,
            canvas_token,
            course_id,
            group_category_id,
            google_token,
            projects_folder_name,
            activity_name,
            test_student_name,
            email_domain,
            instructor_emails,
            sleep_ms,
        })
    }
}

fn read_token_file(path: &str) -> Result<String, AppError> {
    let token = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read token file {}: {}", path, e)))?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(AppError::Config(format!("Token file {} is empty", path)));
    }
    Ok(token)
}
