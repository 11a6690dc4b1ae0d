use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Per-request session state, passed explicitly to every handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn require_user(&self) -> Result<&str, ServiceError> {
        self.user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ServiceError::Unauthenticated)
    }
}
