use anyhow::Result;
use chrono::Utc;

use super::models::{Visit, IP_ADDRESS_MAX_LEN, USER_AGENT_MAX_LEN};
use super::Store;

/// Number of entries returned by the `/visits` listing.
pub const RECENT_VISITS_LIMIT: i64 = 10;

/// Appends one visit stamped with the current UTC time and returns the
/// stored row, including the id assigned by the store.
pub async fn record_visit(store: &Store, ip_address: &str, user_agent: &str) -> Result<Visit> {
    let ip_address = truncate_chars(ip_address, IP_ADDRESS_MAX_LEN);
    let user_agent = truncate_chars(user_agent, USER_AGENT_MAX_LEN);
    let now = Utc::now().naive_utc();

    let visit = match store {
        Store::Sqlite(pool) => {
            sqlx::query_as::<_, Visit>(
                "INSERT INTO visits (ip_address, timestamp, user_agent) VALUES (?, ?, ?) \
                 RETURNING id, ip_address, timestamp, user_agent",
            )
                .bind(ip_address)
                .bind(now)
                .bind(user_agent)
                .fetch_one(pool)
                .await?
        }
        Store::Postgres(pool) => {
            sqlx::query_as::<_, Visit>(
                "INSERT INTO visits (ip_address, timestamp, user_agent) VALUES ($1, $2, $3) \
                 RETURNING id, ip_address, timestamp, user_agent",
            )
                .bind(ip_address)
                .bind(now)
                .bind(user_agent)
                .fetch_one(pool)
                .await?
        }
    };

    Ok(visit)
}

pub async fn count_visits(store: &Store) -> Result<i64> {
    let total = match store {
        Store::Sqlite(pool) => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits")
                .fetch_one(pool)
                .await?
        }
        Store::Postgres(pool) => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(total)
}

/// Newest visits first. Ties on `timestamp` fall back to insertion order.
pub async fn recent_visits(store: &Store, limit: i64) -> Result<Vec<Visit>> {
    let rows = match store {
        Store::Sqlite(pool) => {
            sqlx::query_as::<_, Visit>(
                r#"
        SELECT id, ip_address, timestamp, user_agent
        FROM visits
        ORDER BY timestamp DESC, id DESC
        LIMIT ?
        "#
            )
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        Store::Postgres(pool) => {
            sqlx::query_as::<_, Visit>(
                r#"
        SELECT id, ip_address, timestamp, user_agent
        FROM visits
        ORDER BY timestamp DESC, id DESC
        LIMIT $1
        "#
            )
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::memory_store;

    #[tokio::test]
    async fn record_assigns_increasing_ids() -> Result<()> {
        let store = memory_store().await;
        store.init_schema().await?;

        let first = record_visit(&store, "10.0.0.1", "curl/8.0").await?;
        let second = record_visit(&store, "10.0.0.2", "Unknown").await?;

        assert!(second.id > first.id);
        assert_eq!(first.ip_address, "10.0.0.1");
        assert_eq!(first.user_agent, "curl/8.0");
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(count_visits(&store).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn recent_is_capped_and_newest_first() -> Result<()> {
        let store = memory_store().await;
        store.init_schema().await?;

        for i in 0..15 {
            record_visit(&store, &format!("10.0.0.{i}"), "test-agent").await?;
        }

        let recent = recent_visits(&store, RECENT_VISITS_LIMIT).await?;
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].ip_address, "10.0.0.14");
        assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp && w[0].id > w[1].id));
        assert_eq!(count_visits(&store).await?, 15);
        Ok(())
    }

    #[tokio::test]
    async fn recent_on_empty_table_is_empty() -> Result<()> {
        let store = memory_store().await;
        store.init_schema().await?;

        assert!(recent_visits(&store, RECENT_VISITS_LIMIT).await?.is_empty());
        assert_eq!(count_visits(&store).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_schema_is_an_error() {
        let store = memory_store().await;

        assert!(record_visit(&store, "10.0.0.1", "agent").await.is_err());
        assert!(count_visits(&store).await.is_err());
    }

    #[tokio::test]
    async fn long_values_are_truncated_to_column_limits() -> Result<()> {
        let store = memory_store().await;
        store.init_schema().await?;

        let agent = "é".repeat(250);
        let visit = record_visit(&store, &"1".repeat(60), &agent).await?;

        assert_eq!(visit.ip_address.chars().count(), IP_ADDRESS_MAX_LEN);
        assert_eq!(visit.user_agent.chars().count(), USER_AGENT_MAX_LEN);
        Ok(())
    }
}
