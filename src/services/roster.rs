use std::sync::Arc;

use tracing::{info, warn};

use crate::canvas::CanvasClient;
use crate::error::AppError;
use crate::models::{SectionEnrollment, SectionRecord, Student};

/// Fetches and assembles the per-student and per-section inputs of the
/// merge: course students and sections with parsed name fields and
/// enrollment lists.
pub struct RosterStore {
    canvas: Arc<dyn CanvasClient>,
    test_student_name: String,
    email_domain: String,
}

impl RosterStore {
    pub fn new(
        canvas: Arc<dyn CanvasClient>,
        test_student_name: &str,
        email_domain: &str,
    ) -> Self {
        Self {
            canvas,
            test_student_name: test_student_name.to_string(),
            email_domain: email_domain.to_string(),
        }
    }

    /// All course students, minus the designated test account. Students
    /// without a login ID cannot be given an email and are skipped with a
    /// warning.
    pub async fn load_students(&self) -> Result<Vec<Student>, AppError> {
        let users = self.canvas.list_students().await?;
        let mut students = Vec::new();

        for user in users {
            if user.name == self.test_student_name {
                continue;
            }
            let Some(login_id) = user.login_id else {
                warn!("Student {} ({}) has no login ID, skipping", user.name, user.id);
                continue;
            };
            students.push(Student {
                student_id: user.id,
                student_name: user.name,
                email: format!("{}@{}", login_id, self.email_domain),
                login_id,
                perm: user.integration_id,
            });
        }

        info!("Found {} students", students.len());
        Ok(students)
    }

    /// All course sections with time/day/TA parsed out of the display name
    /// and the section's enrollment rows attached.
    pub async fn load_sections(&self) -> Result<Vec<SectionRecord>, AppError> {
        let sections = self.canvas.list_sections().await?;
        let mut records = Vec::new();

        for section in sections {
            let enrollments = self.canvas.list_section_enrollments(section.id).await?;
            let members = enrollments
                .into_iter()
                .map(|e| SectionEnrollment {
                    user_id: e.user_id,
                    role: e.role,
                    user_name: e.user.as_ref().and_then(|u| u.name.clone()),
                    perm: e.user.and_then(|u| u.integration_id),
                })
                .collect();
            records.push(SectionRecord::new(section.id, &section.name, members));
        }

        info!("Found {} sections", records.len());
        Ok(records)
    }
}
