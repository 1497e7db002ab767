use std::sync::Arc;

use tracing::{info, warn};

use crate::canvas::CanvasClient;
use crate::error::AppError;
use crate::models::{group_sort_key, Group, Member};

/// Fetches the groups of one group category with their member lists and
/// leader IDs, in group-number order.
pub struct GroupStore {
    canvas: Arc<dyn CanvasClient>,
    group_category_id: String,
    email_domain: String,
}

impl GroupStore {
    pub fn new(canvas: Arc<dyn CanvasClient>, group_category_id: &str, email_domain: &str) -> Self {
        Self {
            canvas,
            group_category_id: group_category_id.to_string(),
            email_domain: email_domain.to_string(),
        }
    }

    pub async fn load_groups(&self) -> Result<Vec<Group>, AppError> {
        let canvas_groups = self.canvas.list_groups(&self.group_category_id).await?;
        let mut groups = Vec::new();

        for canvas_group in canvas_groups {
            let users = self.canvas.list_group_members(canvas_group.id).await?;
            let mut members = Vec::new();
            for user in users {
                let email = match &user.login_id {
                    Some(login_id) => format!("{}@{}", login_id, self.email_domain),
                    None => {
                        warn!(
                            "Group {} member {} has no login ID, no email derived",
                            canvas_group.name, user.name
                        );
                        String::new()
                    }
                };
                members.push(Member {
                    student_id: user.id,
                    name: user.name,
                    login_id: user.login_id,
                    email,
                    perm: user.integration_id,
                });
            }
            groups.push(Group {
                group_id: canvas_group.id,
                name: canvas_group.name,
                leader_id: canvas_group.leader.map(|l| l.id),
                members,
            });
        }

        groups.sort_by_key(|g| group_sort_key(&g.name));
        info!("Found {} groups", groups.len());
        Ok(groups)
    }
}
