use serde::{Deserialize, Serialize};

/// The slice of a user account the engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAccount {
    pub id: u64,
    pub tenant_id: u64,
    /// Live "currently clocked in" flag, kept in step with the open session.
    pub is_clocked_in: bool,
}
