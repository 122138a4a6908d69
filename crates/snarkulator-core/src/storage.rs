//! In-memory store for users, calculations and persona responses.
//! Process-local and unindexed: everything is lost on restart and lookups scan the maps.

use crate::models::{AiResponse, Calculation, InsertAiResponse, InsertCalculation, InsertUser, User};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Storage seam used by the gateway. Async so a persistent backend can slot in later.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: &str) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    async fn create_user(&self, user: InsertUser) -> User;
    async fn create_calculation(&self, calculation: InsertCalculation) -> Calculation;
    /// Newest first, at most `limit` entries.
    async fn get_recent_calculations(&self, limit: usize) -> Vec<Calculation>;
    async fn create_ai_response(&self, response: InsertAiResponse) -> AiResponse;
    /// Oldest first.
    async fn get_ai_responses_by_calculation_id(&self, calculation_id: &str) -> Vec<AiResponse>;
}

/// DashMap-backed store. Each record carries an insertion sequence so records created
/// within the same clock tick still sort deterministically.
#[derive(Default)]
pub struct MemStorage {
    users: DashMap<String, User>,
    calculations: DashMap<String, (u64, Calculation)>,
    ai_responses: DashMap<String, (u64, AiResponse)>,
    seq: AtomicU64,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn calculation_count(&self) -> usize {
        self.calculations.len()
    }

    pub fn ai_response_count(&self) -> usize {
        self.ai_responses.len()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|u| u.clone())
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .iter()
            .find(|entry| entry.value().username == username)
            .map(|entry| entry.value().clone())
    }

    async fn create_user(&self, user: InsertUser) -> User {
        let id = Uuid::new_v4().to_string();
        let user = User {
            id: id.clone(),
            username: user.username,
            password: user.password,
        };
        self.users.insert(id, user.clone());
        user
    }

    async fn create_calculation(&self, calculation: InsertCalculation) -> Calculation {
        let id = Uuid::new_v4().to_string();
        let calculation = Calculation {
            id: id.clone(),
            expression: calculation.expression,
            result: calculation.result,
            timestamp: Utc::now(),
        };
        self.calculations
            .insert(id, (self.next_seq(), calculation.clone()));
        calculation
    }

    async fn get_recent_calculations(&self, limit: usize) -> Vec<Calculation> {
        let mut all: Vec<(u64, Calculation)> = self
            .calculations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| {
            b.1.timestamp
                .cmp(&a.1.timestamp)
                .then_with(|| b.0.cmp(&a.0))
        });
        all.truncate(limit);
        all.into_iter().map(|(_, c)| c).collect()
    }

    async fn create_ai_response(&self, response: InsertAiResponse) -> AiResponse {
        let id = Uuid::new_v4().to_string();
        let response = AiResponse {
            id: id.clone(),
            calculation_id: response.calculation_id,
            response: response.response,
            emotion: response.emotion,
            ai_result: response.ai_result,
            timestamp: Utc::now(),
        };
        self.ai_responses
            .insert(id, (self.next_seq(), response.clone()));
        response
    }

    async fn get_ai_responses_by_calculation_id(&self, calculation_id: &str) -> Vec<AiResponse> {
        let mut matching: Vec<(u64, AiResponse)> = self
            .ai_responses
            .iter()
            .filter(|entry| entry.value().1.calculation_id.as_deref() == Some(calculation_id))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            a.1.timestamp
                .cmp(&b.1.timestamp)
                .then_with(|| a.0.cmp(&b.0))
        });
        matching.into_iter().map(|(_, r)| r).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(expression: &str, result: &str) -> InsertCalculation {
        InsertCalculation {
            expression: expression.to_string(),
            result: result.to_string(),
        }
    }

    fn reply(calculation_id: &str, response: &str) -> InsertAiResponse {
        InsertAiResponse {
            calculation_id: Some(calculation_id.to_string()),
            response: response.to_string(),
            emotion: "bored".to_string(),
            ai_result: "4".to_string(),
        }
    }

    #[tokio::test]
    async fn recent_calculations_newest_first_and_limited() {
        let store = MemStorage::new();
        for i in 0..4 {
            store.create_calculation(calc(&format!("{} + 1", i), "x")).await;
        }
        let recent = store.get_recent_calculations(3).await;
        let expressions: Vec<&str> = recent.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(expressions, vec!["3 + 1", "2 + 1", "1 + 1"]);
        assert_eq!(store.calculation_count(), 4);
    }

    #[tokio::test]
    async fn recent_calculations_on_empty_store() {
        let store = MemStorage::new();
        assert!(store.get_recent_calculations(10).await.is_empty());
    }

    #[tokio::test]
    async fn responses_filtered_by_calculation_oldest_first() {
        let store = MemStorage::new();
        let a = store.create_calculation(calc("2 + 2", "2000")).await;
        let b = store.create_calculation(calc("1 + 1", "purple")).await;
        store.create_ai_response(reply(&a.id, "first")).await;
        store.create_ai_response(reply(&b.id, "other")).await;
        store.create_ai_response(reply(&a.id, "second")).await;

        let responses = store.get_ai_responses_by_calculation_id(&a.id).await;
        let texts: Vec<&str> = responses.iter().map(|r| r.response.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(store.get_ai_responses_by_calculation_id("missing").await.is_empty());
        assert_eq!(store.ai_response_count(), 3);
    }

    #[tokio::test]
    async fn users_by_id_and_username() {
        let store = MemStorage::new();
        let created = store
            .create_user(InsertUser {
                username: "ada".to_string(),
                password: "hunter2".to_string(),
            })
            .await;
        assert_eq!(store.get_user(&created.id).await, Some(created.clone()));
        assert_eq!(store.get_user_by_username("ada").await, Some(created));
        assert!(store.get_user_by_username("bob").await.is_none());
        assert!(store.get_user("nope").await.is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_uuids() {
        let store = MemStorage::new();
        let a = store.create_calculation(calc("1", "1")).await;
        let b = store.create_calculation(calc("1", "1")).await;
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }
}
