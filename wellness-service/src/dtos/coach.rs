use crate::models::{ModelMessage, UserProfile};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    pub user_id: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    /// Prior turns, oldest first, forwarded to the model as-is.
    #[serde(default)]
    pub conversation_history: Option<Vec<ModelMessage>>,
}
