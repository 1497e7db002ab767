use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::canvas::CanvasClient;
use crate::error::AppError;
use crate::models::section::{nice_time, UNKNOWN};
use crate::models::MergedGroup;
use crate::pace::Pacer;

/// Renames groups to embed their section meeting info, e.g.
/// `"Group 3"` becomes `"Group 3 (W noon)"`. Only groups whose members all
/// share one section are renamed; cross-section groups are left alone.
pub struct GroupRenamer {
    canvas: Arc<dyn CanvasClient>,
    pacer: Arc<dyn Pacer>,
}

#[derive(Debug, Default, Serialize)]
pub struct RenameStats {
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl GroupRenamer {
    pub fn new(canvas: Arc<dyn CanvasClient>, pacer: Arc<dyn Pacer>) -> Self {
        Self { canvas, pacer }
    }

    pub async fn embed_section_info(
        &self,
        groups: &[MergedGroup],
    ) -> Result<RenameStats, AppError> {
        let mut stats = RenameStats::default();

        for merged in groups {
            let Some(suffix) = section_suffix(merged) else {
                info!(
                    "Group {} spans sections or has unknown meeting info, not renamed",
                    merged.group.name
                );
                stats.skipped += 1;
                continue;
            };

            if merged.group.name.ends_with(&suffix) {
                stats.unchanged += 1;
                continue;
            }

            let new_name = format!("{} {}", merged.group.name, suffix);
            match self
                .canvas
                .rename_group(merged.group.group_id, &new_name)
                .await
            {
                Ok(()) => {
                    info!("Renamed group {} -> {}", merged.group.name, new_name);
                    stats.renamed += 1;
                }
                Err(e) => warn!("Failed to rename group {}: {}", merged.group.name, e),
            }
            self.pacer.pace().await;
        }

        Ok(stats)
    }
}

/// The `"(DAY TIME)"` suffix for a group, when its section day and time
/// both collapse to a single known value.
pub fn section_suffix(merged: &MergedGroup) -> Option<String> {
    let day = merged.section_days.single()?;
    let time = merged.section_times.single()?;
    if day == UNKNOWN || time == UNKNOWN {
        return None;
    }
    Some(format!("({} {})", day, nice_time(time)))
}
