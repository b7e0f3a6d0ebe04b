use expensa_application::GroupRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

/// Incoming payload for group creation.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

/// Incoming payload for permission grants.
#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    pub permissions: Vec<String>,
}

/// API representation of a group and its grants.
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,
}

impl From<GroupRecord> for GroupResponse {
    fn from(value: GroupRecord) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            permissions: value
                .permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// Freshly issued API token. The raw value is shown once.
#[derive(Debug, Serialize)]
pub struct ApiTokenResponse {
    pub user_id: String,
    pub token: String,
}
