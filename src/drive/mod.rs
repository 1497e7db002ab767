pub mod dto;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;

pub use dto::*;

const DRIVE_BASE: &str = "https://www.googleapis.com/drive/v3";
const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// The file-storage and spreadsheet operations the folder synchronizer
/// needs. IDs are opaque Drive file IDs.
#[async_trait]
pub trait DriveClient: Send + Sync {
    async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, AppError>;
    async fn create_folder(&self, name: &str, parent_id: Option<&str>)
        -> Result<String, AppError>;
    /// Grant writer access by email, without a notification email.
    async fn share_writer(&self, file_id: &str, email: &str) -> Result<(), AppError>;
    async fn find_spreadsheet(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, AppError>;
    async fn create_spreadsheet(&self, name: &str, parent_id: &str) -> Result<String, AppError>;
    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, AppError>;
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), AppError>;
    async fn list_tab_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, AppError>;
    async fn add_tab(&self, spreadsheet_id: &str, title: &str) -> Result<(), AppError>;
    /// Non-trashed files directly inside a folder.
    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, AppError>;
    async fn copy_file(
        &self,
        file_id: &str,
        new_name: &str,
        parent_id: &str,
    ) -> Result<String, AppError>;
}

pub struct DriveHttpClient {
    client: Client,
    token: String,
}

impl DriveHttpClient {
    pub fn new(token: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            token: token.to_string(),
        })
    }

    async fn list_query(&self, query: &str) -> Result<Vec<DriveFile>, AppError> {
        let response = self
            .client
            .get(format!("{}/files", DRIVE_BASE))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[
                ("q", query),
                ("spaces", "drive"),
                ("fields", "files(id, name, mimeType)"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Drive", response).await);
        }

        let list: FileListResponse = response.json().await?;
        Ok(list.files)
    }

    async fn create_file(&self, metadata: &serde_json::Value) -> Result<String, AppError> {
        let response = self
            .client
            .post(format!("{}/files", DRIVE_BASE))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("fields", "id")])
            .json(metadata)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Drive", response).await);
        }

        let created: CreatedFile = response.json().await?;
        Ok(created.id)
    }

    fn name_query(name: &str, mime: &str, parent_id: Option<&str>) -> String {
        // Drive query literals escape single quotes with a backslash.
        let escaped = name.replace('\'', "\\'");
        let mut query = format!("name='{}' and mimeType='{}' and trashed = false", escaped, mime);
        if let Some(parent) = parent_id {
            query.push_str(&format!(" and '{}' in parents", parent));
        }
        query
    }
}

#[async_trait]
impl DriveClient for DriveHttpClient {
    async fn find_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let query = Self::name_query(name, FOLDER_MIME, parent_id);
        let files = self.list_query(&query).await?;
        Ok(files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, AppError> {
        let mut metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME,
        });
        if let Some(parent) = parent_id {
            metadata["parents"] = serde_json::json!([parent]);
        }
        self.create_file(&metadata).await
    }

    async fn share_writer(&self, file_id: &str, email: &str) -> Result<(), AppError> {
        let permission = serde_json::json!({
            "type": "user",
            "role": "writer",
            "emailAddress": email,
        });
        let response = self
            .client
            .post(format!("{}/files/{}/permissions", DRIVE_BASE, file_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("sendNotificationEmail", "false"), ("fields", "id")])
            .json(&permission)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Drive", response).await);
        }
        Ok(())
    }

    async fn find_spreadsheet(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, AppError> {
        let query = Self::name_query(name, SPREADSHEET_MIME, Some(parent_id));
        let files = self.list_query(&query).await?;
        Ok(files.into_iter().next().map(|f| f.id))
    }

    async fn create_spreadsheet(&self, name: &str, parent_id: &str) -> Result<String, AppError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": SPREADSHEET_MIME,
            "parents": [parent_id],
        });
        self.create_file(&metadata).await
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let response = self
            .client
            .get(format!("{}/{}/values/{}", SHEETS_BASE, spreadsheet_id, range))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Sheets", response).await);
        }

        let range: ValueRange = response.json().await?;
        Ok(range.values)
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), AppError> {
        let body = serde_json::json!({ "values": values });
        let response = self
            .client
            .put(format!("{}/{}/values/{}", SHEETS_BASE, spreadsheet_id, range))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Sheets", response).await);
        }
        Ok(())
    }

    async fn list_tab_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, AppError> {
        let response = self
            .client
            .get(format!("{}/{}", SHEETS_BASE, spreadsheet_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Sheets", response).await);
        }

        let meta: SpreadsheetMeta = response.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn add_tab(&self, spreadsheet_id: &str, title: &str) -> Result<(), AppError> {
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self
            .client
            .post(format!("{}/{}:batchUpdate", SHEETS_BASE, spreadsheet_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Sheets", response).await);
        }
        Ok(())
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, AppError> {
        let query = format!("'{}' in parents and trashed = false", folder_id);
        self.list_query(&query).await
    }

    async fn copy_file(
        &self,
        file_id: &str,
        new_name: &str,
        parent_id: &str,
    ) -> Result<String, AppError> {
        let body = serde_json::json!({
            "name": new_name,
            "parents": [parent_id],
        });
        let response = self
            .client
            .post(format!("{}/files/{}/copy", DRIVE_BASE, file_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Drive", response).await);
        }

        let created: CreatedFile = response.json().await?;
        Ok(created.id)
    }
}
