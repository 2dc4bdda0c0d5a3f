use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct AzureSubscription {
    pub id: String,
    pub subscription_name: String,
    pub is_internal: bool,
}
