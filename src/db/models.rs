use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

pub const IP_ADDRESS_MAX_LEN: usize = 50;
pub const USER_AGENT_MAX_LEN: usize = 200;

/// One recorded hit on the root endpoint. `timestamp` is naive UTC.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub ip_address: String,
    pub timestamp: NaiveDateTime,
    pub user_agent: String,
}
