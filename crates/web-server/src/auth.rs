use crate::{AppState, error::AppError};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use services::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory sessions keyed by bearer token. Sessions do not survive a restart.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        self.inner.write().await.insert(session.token, session);
    }

    /// The live session for `token`. Expired sessions are dropped on sight.
    pub async fn get(&self, token: &Uuid) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.inner.read().await;
            match sessions.get(token) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.inner.write().await.remove(token);
        None
    }

    pub async fn remove(&self, token: &Uuid) -> Option<Session> {
        self.inner.write().await.remove(token)
    }

    /// Removes every expired session and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// The session behind the request's `Authorization: Bearer <token>` header.
/// Rejects with 401 when the header is missing, malformed, unknown or expired.
pub struct CurrentSession(pub Session);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("missing bearer token".to_string()))?;
        let token = Uuid::parse_str(bearer.token())
            .map_err(|_| AppError::Unauthorized("malformed bearer token".to_string()))?;
        state
            .sessions
            .get(&token)
            .await
            .map(CurrentSession)
            .ok_or_else(|| AppError::Unauthorized("session expired or unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core_types::Role;

    fn session(ttl_minutes: i64) -> Session {
        let now = Utc::now();
        Session {
            token: Uuid::new_v4(),
            username: "maria".into(),
            role: Role::Operator,
            member_of: vec!["operador_reservas".into()],
            created_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
        }
    }

    #[tokio::test]
    async fn stores_and_expires_sessions() {
        let store = SessionStore::new();
        let live = session(30);
        let stale = session(-1);
        store.insert(live.clone()).await;
        store.insert(stale.clone()).await;

        assert_eq!(store.get(&live.token).await, Some(live.clone()));
        assert_eq!(store.get(&stale.token).await, None);
        assert_eq!(store.len().await, 1);

        assert!(store.remove(&live.token).await.is_some());
        assert_eq!(store.get(&live.token).await, None);
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let store = SessionStore::new();
        store.insert(session(30)).await;
        store.insert(session(-5)).await;
        store.insert(session(-1)).await;
        assert_eq!(store.purge_expired().await, 2);
        assert_eq!(store.len().await, 1);
    }
}
