use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_sync::canvas::CanvasHttpClient;
use course_sync::chat::{ChatHttpClient, PeopleHttpClient};
use course_sync::config::Config;
use course_sync::csvio;
use course_sync::dedup::ExactTrimMatch;
use course_sync::drive::DriveHttpClient;
use course_sync::error::AppError;
use course_sync::models::Roster;
use course_sync::pace::FixedDelay;
use course_sync::services::{
    build_feedback_html, locate_assignment, merge, summarize_by_email, AlwaysConfirm,
    ChatSpaceSynchronizer, Confirm, FeedbackPoster, GroupFolderSynchronizer, GroupRenamer,
    GroupStore, MergePolicy, MessageReader, RosterStore, SpaceDirectory, StdinConfirm,
    SubmissionSharer, WelcomeTemplate,
};

#[derive(Parser)]
#[command(name = "course-sync", about = "Course roster, folder, and chat sync tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the merged roster and export roster.csv
    Roster,
    /// Export the group membership CSV used by the chat sync
    ExportGroups,
    /// Ensure one Drive folder and members sheet per group
    Folders,
    /// Ensure one chat space per group, invite members, post welcomes
    Chats {
        #[arg(long, value_enum, default_value = "lecture")]
        template: TemplateArg,
        /// Staff CSV (columns: section,email) to invite per-section staff
        #[arg(long)]
        staff: Option<PathBuf>,
    },
    /// Read group chat messages into a per-student summary CSV
    Messages,
    /// Post chat-activity feedback as submission comments
    Feedback {
        /// Assignment name to post comments on
        #[arg(long)]
        assignment: String,
        /// Skip the interactive confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Rename groups to embed section day/time
    RenameGroups,
    /// Share URL-type assignment submissions with course staff
    ShareSubmissions {
        /// Assignment whose submissions to share
        #[arg(long)]
        assignment: String,
        /// Staff email list, one address per line
        #[arg(long)]
        staff: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateArg {
    Lecture,
    Project,
}

impl From<TemplateArg> for WelcomeTemplate {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Lecture => WelcomeTemplate::Lecture,
            TemplateArg::Project => WelcomeTemplate::Project,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "course_sync=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::new_from_env()?;

    match cli.command {
        Command::Roster => run_roster(&config).await?,
        Command::ExportGroups => run_export_groups(&config).await?,
        Command::Folders => run_folders(&config).await?,
        Command::Chats { template, staff } => {
            run_chats(&config, template.into(), staff.as_deref()).await?
        }
        Command::Messages => run_messages(&config).await?,
        Command::Feedback { assignment, yes } => run_feedback(&config, &assignment, yes).await?,
        Command::RenameGroups => run_rename_groups(&config).await?,
        Command::ShareSubmissions { assignment, staff } => {
            run_share_submissions(&config, &assignment, &staff).await?
        }
    }

    Ok(())
}

fn canvas_client(config: &Config) -> Result<Arc<CanvasHttpClient>, AppError> {
    Ok(Arc::new(CanvasHttpClient::new(
        &config.canvas_api_url,
        &config.canvas_token,
        &config.course_id,
    )?))
}

async fn build_merged_roster(
    config: &Config,
    canvas: Arc<CanvasHttpClient>,
) -> Result<(Roster, Vec<course_sync::models::MergedGroup>), AppError> {
    let roster_store = RosterStore::new(
        canvas.clone(),
        &config.test_student_name,
        &config.email_domain,
    );
    let group_store = GroupStore::new(
        canvas,
        &config.group_category_id,
        &config.email_domain,
    );

    let students = roster_store.load_students().await?;
    let sections = roster_store.load_sections().await?;
    let groups = group_store.load_groups().await?;

    let policy = MergePolicy {
        test_student_name: config.test_student_name.clone(),
    };
    Ok(merge(&students, &sections, &groups, &policy))
}

async fn run_roster(config: &Config) -> Result<(), AppError> {
    let canvas = canvas_client(config)?;
    let (roster, _) = build_merged_roster(config, canvas).await?;

    let no_perm = roster.values().filter(|e| e.perm.is_none()).count();
    info!("{} roster entries, {} without a perm", roster.len(), no_perm);

    csvio::write_roster(Path::new("roster.csv"), &roster)?;
    info!("Roster exported to roster.csv");
    Ok(())
}

async fn run_export_groups(config: &Config) -> Result<(), AppError> {
    let canvas = canvas_client(config)?;
    let group_store = GroupStore::new(canvas, &config.group_category_id, &config.email_domain);
    let groups = group_store.load_groups().await?;

    let path = format!("group_export_{}.csv", config.group_category_id);
    csvio::write_group_export(Path::new(&path), &groups)?;
    info!("Group export saved to {}", path);
    Ok(())
}

async fn run_folders(config: &Config) -> Result<(), AppError> {
    let canvas = canvas_client(config)?;
    let group_store = GroupStore::new(canvas, &config.group_category_id, &config.email_domain);
    let groups = group_store.load_groups().await?;

    let drive = Arc::new(DriveHttpClient::new(&config.google_token)?);
    let pacer = Arc::new(FixedDelay::from_millis(config.sleep_ms));
    let synchronizer = GroupFolderSynchronizer::new(drive, pacer);

    let (folders, stats) = synchronizer
        .ensure_group_folders(&groups, &config.projects_folder_name)
        .await?;
    info!("Folder sync stats: {:?}", stats);

    let path = format!("group_folders_{}.csv", config.group_category_id);
    csvio::write_group_folders(Path::new(&path), &folders)?;
    info!("Group folders written to {}", path);
    Ok(())
}

async fn run_chats(
    config: &Config,
    template: WelcomeTemplate,
    staff: Option<&Path>,
) -> Result<(), AppError> {
    let folders_path = format!("group_folders_{}.csv", config.group_category_id);
    let mut folders = csvio::read_group_folders(Path::new(&folders_path))?;

    let export_path = format!("group_export_{}.csv", config.group_category_id);
    let group_emails = csvio::read_group_emails(Path::new(&export_path))?;

    let chat = Arc::new(ChatHttpClient::new(&config.google_token)?);
    let people = Arc::new(PeopleHttpClient::new(&config.google_token)?);
    let pacer = Arc::new(FixedDelay::from_millis(config.sleep_ms));
    let synchronizer = ChatSpaceSynchronizer::new(
        chat.clone(),
        people,
        pacer,
        Arc::new(ExactTrimMatch),
        &config.email_domain,
    );

    let mut directory = SpaceDirectory::load(chat.as_ref()).await?;
    let stats = synchronizer
        .ensure_group_chats(
            &group_emails,
            &mut folders,
            &config.activity_name,
            template,
            &mut directory,
        )
        .await?;
    info!("Chat sync stats: {:?}", stats);

    if let Some(staff_path) = staff {
        let section_to_staff = csvio::read_staff(staff_path)?;
        let invited = synchronizer
            .invite_staff(&folders, &section_to_staff, &directory)
            .await?;
        info!("Invited {} staff members", invited);
    }

    let with_chat_path = format!(
        "group_folders_with_chat_groups_{}.csv",
        config.group_category_id
    );
    csvio::write_group_folders(Path::new(&with_chat_path), &folders)?;
    info!("Group folders with chat spaces written to {}", with_chat_path);
    Ok(())
}

async fn run_messages(config: &Config) -> Result<(), AppError> {
    let with_chat_path = format!(
        "group_folders_with_chat_groups_{}.csv",
        config.group_category_id
    );
    let folders = csvio::read_group_folders(Path::new(&with_chat_path))?;

    let chat = Arc::new(ChatHttpClient::new(&config.google_token)?);
    let people = Arc::new(PeopleHttpClient::new(&config.google_token)?);
    let pacer = Arc::new(FixedDelay::from_millis(config.sleep_ms));
    let reader = MessageReader::new(
        chat,
        people,
        pacer,
        &config.email_domain,
        &config.instructor_emails,
    );

    let messages = reader.read_group_messages(&folders).await?;

    let path = format!("chat_messages_{}.csv", config.group_category_id);
    csvio::write_messages(Path::new(&path), &messages)?;
    info!("Chat messages written to {}", path);
    Ok(())
}

async fn run_feedback(config: &Config, assignment_name: &str, yes: bool) -> Result<(), AppError> {
    let canvas = canvas_client(config)?;
    let assignment = locate_assignment(canvas.as_ref(), assignment_name).await?;
    info!("Posting feedback on assignment: {} ({})", assignment.name, assignment.id);

    let (roster, _) = build_merged_roster(config, canvas.clone()).await?;

    let messages_path = format!("chat_messages_{}.csv", config.group_category_id);
    let messages = csvio::read_messages(Path::new(&messages_path))?;
    let by_email = summarize_by_email(&messages);

    let confirm: Arc<dyn Confirm> = if yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirm)
    };
    let pacer = Arc::new(FixedDelay::from_millis(config.sleep_ms));
    let poster = FeedbackPoster::new(canvas, Arc::new(ExactTrimMatch), confirm, pacer);

    for (email, student_messages) in &by_email {
        let Some(entry) = roster.values().find(|e| &e.email == email) else {
            tracing::warn!("No roster entry for {}, feedback skipped", email);
            continue;
        };
        let html = build_feedback_html(&config.activity_name, student_messages);
        poster
            .post_feedback_unless_duplicate(assignment.id, entry.student_id, &html)
            .await?;
    }

    Ok(())
}

async fn run_share_submissions(
    config: &Config,
    assignment_name: &str,
    staff_path: &Path,
) -> Result<(), AppError> {
    let canvas = canvas_client(config)?;
    let assignment = locate_assignment(canvas.as_ref(), assignment_name).await?;
    info!("Sharing submissions of: {} ({})", assignment.name, assignment.id);

    let (roster, _) = build_merged_roster(config, canvas.clone()).await?;
    let staff_emails = csvio::read_email_list(staff_path)?;

    let drive = Arc::new(DriveHttpClient::new(&config.google_token)?);
    let pacer = Arc::new(FixedDelay::from_millis(config.sleep_ms));
    let sharer = SubmissionSharer::new(canvas, drive, pacer);

    let stats = sharer
        .share_url_submissions(assignment.id, &roster, &staff_emails)
        .await?;
    info!("Share stats: {:?}", stats);
    Ok(())
}

async fn run_rename_groups(config: &Config) -> Result<(), AppError> {
    let canvas = canvas_client(config)?;
    let (_, merged_groups) = build_merged_roster(config, canvas.clone()).await?;

    let pacer = Arc::new(FixedDelay::from_millis(config.sleep_ms));
    let renamer = GroupRenamer::new(canvas, pacer);
    let stats = renamer.embed_section_info(&merged_groups).await?;
    info!("Rename stats: {:?}", stats);
    Ok(())
}
