use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use course_sync::canvas::{
    CanvasAssignment, CanvasClient, CanvasEnrollment, CanvasGroup, CanvasSection, CanvasUser,
    CanvasUrlSubmission,
};
use course_sync::error::AppError;
use course_sync::models::{Group, MergedGroup, Rollup};
use course_sync::pace::NoDelay;
use course_sync::services::GroupRenamer;

#[derive(Default)]
struct RenameRecorder {
    renamed: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl CanvasClient for RenameRecorder {
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

    async fn rename_group(&self, group_id: i64, new_name: &str) -> Result<(), AppError> {
        self.renamed
            .lock()
            .unwrap()
            .push((group_id, new_name.to_string()));
        Ok(())
    }

    async fn list_assignments(&self) -> Result<Vec<CanvasAssignment>, AppError> {
        Ok(vec![])
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
        Ok(vec![])
    }

    async fn graphql_submission_comments(
        &self,
        _assignment_id: i64,
        _user_id: i64,
    ) -> Result<Vec<String>, AppError> {
        Ok(vec![])
    }

    async fn post_submission_comment(
        &self,
        _assignment_id: i64,
        _user_id: i64,
        _comment: &str,
    ) -> Result<(), AppError> {
        Ok(())
    }
}

fn merged(id: i64, name: &str, day: Rollup<String>, time: Rollup<String>) -> MergedGroup {
    MergedGroup {
        group: Group {
            group_id: id,
            name: name.to_string(),
            leader_id: None,
            members: vec![],
        },
        section_ids: Rollup::Empty,
        section_names: Rollup::Empty,
        section_times: time,
        section_days: day,
        section_tas: Rollup::Empty,
    }
}

fn single(value: &str) -> Rollup<String> {
    Rollup::Single(value.to_string())
}

#[tokio::test]
async fn renames_single_section_groups_and_skips_the_rest() {
    let canvas = Arc::new(RenameRecorder::default());
    let groups = vec![
        merged(1, "Group 1", single("W"), single("12:00 PM")),
        merged(
            2,
            "Group 2",
            Rollup::from_values(vec!["W".to_string(), "F".to_string()]),
            single("12:00 PM"),
        ),
        merged(3, "Group 3", single("Unknown"), single("12:00 PM")),
        merged(4, "Group 4 (F 1pm)", single("F"), single("1:00 PM")),
    ];

    let renamer = GroupRenamer::new(canvas.clone(), Arc::new(NoDelay));
    let stats = renamer.embed_section_info(&groups).await.unwrap();

    assert_eq!(stats.renamed, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.unchanged, 1);

    let renamed = canvas.renamed.lock().unwrap();
    assert_eq!(renamed.as_slice(), &[(1, "Group 1 (W noon)".to_string())]);
}
