use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceListResponse {
    #[serde(default)]
    pub spaces: Vec<SpaceResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceResource {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MembershipListResponse {
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub member: Option<MembershipMember>,
}

#[derive(Debug, Deserialize)]
pub struct MembershipMember {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<MessageResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResource {
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub sender: Option<MessageSender>,
}

#[derive(Debug, Deserialize)]
pub struct MessageSender {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResource {
    #[serde(default)]
    pub names: Vec<PersonName>,
    #[serde(default)]
    pub email_addresses: Vec<PersonEmail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonEmail {
    #[serde(default)]
    pub value: Option<String>,
}
