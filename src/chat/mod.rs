pub mod dto;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;
use crate::models::{ChatMessage, Person, Space};

use dto::*;

const CHAT_BASE: &str = "https://chat.googleapis.com/v1";
const PEOPLE_BASE: &str = "https://people.googleapis.com/v1";

/// Chat space operations. `space_name` arguments are resource names
/// (`spaces/XXXX`), never display names.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn list_spaces(&self) -> Result<Vec<Space>, AppError>;
    async fn create_space(&self, display_name: &str) -> Result<Space, AppError>;
    /// Opaque member user IDs of a space; resolution to emails goes
    /// through a `PeopleClient`.
    async fn list_member_ids(&self, space_name: &str) -> Result<Vec<String>, AppError>;
    async fn invite_member(&self, space_name: &str, email: &str) -> Result<(), AppError>;
    /// A bounded page of messages in creation-time order.
    async fn list_recent_messages(&self, space_name: &str) -> Result<Vec<ChatMessage>, AppError>;
    async fn send_message(&self, space_name: &str, text: &str) -> Result<(), AppError>;
}

/// Resolves opaque chat member IDs to names and emails.
#[async_trait]
pub trait PeopleClient: Send + Sync {
    async fn lookup_person(&self, user_id: &str) -> Result<Person, AppError>;
}

pub struct ChatHttpClient {
    client: Client,
    token: String,
}

impl ChatHttpClient {
    pub fn new(token: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            token: token.to_string(),
        })
    }

    fn space_from_resource(resource: SpaceResource) -> Space {
        Space {
            display_name: resource.display_name.unwrap_or_default(),
            name: resource.name,
        }
    }
}

#[async_trait]
impl ChatClient for ChatHttpClient {
    async fn list_spaces(&self) -> Result<Vec<Space>, AppError> {
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{}/spaces", CHAT_BASE))
                .header("Authorization", format!("Bearer {}", self.token))
                .query(&[("pageSize", "100")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(AppError::from_response("Chat", response).await);
            }

            let page: SpaceListResponse = response.json().await?;
            all.extend(page.spaces.into_iter().map(Self::space_from_resource));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all)
    }

    async fn create_space(&self, display_name: &str) -> Result<Space, AppError> {
        let payload = serde_json::json!({
            "spaceType": "SPACE",
            "displayName": display_name,
        });
        let response = self
            .client
            .post(format!("{}/spaces", CHAT_BASE))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Chat", response).await);
        }

        let resource: SpaceResource = response.json().await?;
        Ok(Self::space_from_resource(resource))
    }

    async fn list_member_ids(&self, space_name: &str) -> Result<Vec<String>, AppError> {
        let response = self
            .client
            .get(format!("{}/{}/members", CHAT_BASE, space_name))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Chat", response).await);
        }

        let list: MembershipListResponse = response.json().await?;
        let ids = list
            .memberships
            .into_iter()
            .filter_map(|m| m.member.and_then(|member| member.name))
            .filter_map(|name| name.split('/').next_back().map(|id| id.to_string()))
            .filter(|id| !id.is_empty())
            .collect();
        Ok(ids)
    }

    async fn invite_member(&self, space_name: &str, email: &str) -> Result<(), AppError> {
        let payload = serde_json::json!({
            "member": { "name": format!("users/{}", email), "type": "HUMAN" }
        });
        let response = self
            .client
            .post(format!("{}/{}/members", CHAT_BASE, space_name))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Chat", response).await);
        }
        Ok(())
    }

    async fn list_recent_messages(&self, space_name: &str) -> Result<Vec<ChatMessage>, AppError> {
        let response = self
            .client
            .get(format!("{}/{}/messages", CHAT_BASE, space_name))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("pageSize", "50"), ("orderBy", "createTime asc")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Chat", response).await);
        }

        let list: MessageListResponse = response.json().await?;
        let messages = list
            .messages
            .into_iter()
            .map(|m| ChatMessage {
                sender_id: m
                    .sender
                    .and_then(|s| s.name)
                    .and_then(|n| n.split('/').next_back().map(|id| id.to_string()))
                    .unwrap_or_default(),
                text: m.text.unwrap_or_default(),
                create_time: m.create_time.unwrap_or_default(),
                name: m.name,
            })
            .collect();
        Ok(messages)
    }

    async fn send_message(&self, space_name: &str, text: &str) -> Result<(), AppError> {
        let payload = serde_json::json!({ "text": text });
        let response = self
            .client
            .post(format!("{}/{}/messages", CHAT_BASE, space_name))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("Chat", response).await);
        }
        Ok(())
    }
}

pub struct PeopleHttpClient {
    client: Client,
    token: String,
}

impl PeopleHttpClient {
    pub fn new(token: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl PeopleClient for PeopleHttpClient {
    async fn lookup_person(&self, user_id: &str) -> Result<Person, AppError> {
        let response = self
            .client
            .get(format!("{}/people/{}", PEOPLE_BASE, user_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("personFields", "emailAddresses,names")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response("People", response).await);
        }

        let resource: PersonResource = response.json().await?;
        Ok(Person {
            display_name: resource.names.into_iter().find_map(|n| n.display_name),
            emails: resource
                .email_addresses
                .into_iter()
                .filter_map(|e| e.value)
                .collect(),
        })
    }
}
