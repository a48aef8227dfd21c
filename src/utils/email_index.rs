use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

use crate::error::AppResult;
use crate::model::user::normalize_email;
use crate::store::UserRepo;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Answers "is this email already registered?" without touching the database in the
/// common cases: the cuckoo filter gives fast negatives, the moka cache fast positives.
/// The unique key on `user_accounts.email` stays the source of truth.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, ()>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86400))
                .build(),
        }
    }

    /// False positives possible, false negatives not.
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.filter
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&email)
    }

    pub async fn mark_taken(&self, email: &str) {
        let email = normalize_email(email);
        self.filter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .add(&email);
        self.taken.insert(email, ()).await;
    }

    pub async fn forget(&self, email: &str) {
        let email = normalize_email(email);
        self.filter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&email);
        self.taken.invalidate(&email).await;
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_available<R: UserRepo>(&self, email: &str, repo: &mut R) -> AppResult<bool> {
        let email = normalize_email(email);

        if !self.might_exist(&email) {
            return Ok(true);
        }

        if self.taken.contains_key(&email) {
            return Ok(false);
        }

        let exists = repo.find_user_by_email(&email).await?.is_some();
        if exists {
            self.taken.insert(email, ()).await;
        }
        Ok(!exists)
    }

    /// Streams every registered email into the filter and cache in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream =
            sqlx::query_as::<_, (String,)>("SELECT email FROM user_accounts").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(normalize_email(&email));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch).await;
        }

        tracing::info!(total, "Email index warmup complete");
        Ok(())
    }

    async fn insert_batch(&self, emails: &[String]) {
        {
            let mut filter = self
                .filter
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for email in emails {
                filter.add(email);
            }
        }

        let inserts: Vec<_> = emails
            .iter()
            .map(|e| self.taken.insert(e.clone(), ()))
            .collect();
        futures::future::join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{role::Role, user::NewUser};
    use crate::store::{Store, memory::MemoryStore};

    #[tokio::test]
    async fn unknown_email_is_available_without_lookup() {
        let index = EmailIndex::new();
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        assert!(!index.might_exist("new@corp.test"));
        assert!(index.is_available("new@corp.test", &mut tx).await.unwrap());
    }

    #[tokio::test]
    async fn marked_email_is_taken_case_insensitively() {
        let index = EmailIndex::new();
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        index.mark_taken("Ana@Corp.test").await;
        assert!(index.might_exist("ana@corp.test"));
        assert!(!index.is_available(" ANA@corp.test ", &mut tx).await.unwrap());

        index.forget("ana@corp.test").await;
        assert!(index.is_available("ana@corp.test", &mut tx).await.unwrap());
    }

    #[tokio::test]
    async fn filter_hit_falls_back_to_the_store() {
        let index = EmailIndex::new();
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(NewUser {
            email: "bo@corp.test".into(),
            password_hash: "x".into(),
            role: Role::Employee,
        })
        .await
        .unwrap();

        // Present in the filter only, as after a restart with a cold cache.
        index
            .filter
            .write()
            .unwrap()
            .add(&"bo@corp.test".to_string());
        assert!(!index.is_available("bo@corp.test", &mut tx).await.unwrap());
    }
}
