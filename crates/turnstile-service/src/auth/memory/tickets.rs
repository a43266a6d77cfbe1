use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use salvo::async_trait;
use salvo::http::cookie::Cookie;
use salvo::http::header::COOKIE;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::request::RequestContext;
use crate::auth::store::FormsTicket;
use crate::error::ServiceResult;

#[derive(Debug, Clone)]
struct Ticket {
    full_name: String,
    issued_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// Forms tickets held in memory, presented by the client as a cookie.
///
/// Expiry is sliding: a ticket lapses once it has gone unused for longer
/// than the ttl. Lapsed tickets are dropped when presented and swept on issue.
pub struct MemoryFormsTickets {
    cookie_name: String,
    ttl: TimeDelta,
    tickets: RwLock<HashMap<String, Ticket>>,
}

impl MemoryFormsTickets {
    #[must_use]
    pub fn new(cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            tickets: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) async fn last_seen(&self, token: &str) -> Option<DateTime<Utc>> {
        self.tickets.read().await.get(token).map(|ticket| ticket.last_seen)
    }

    fn is_expired(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        now - ticket.last_seen > self.ttl
    }

    fn token(&self, ctx: &RequestContext) -> Option<String> {
        ctx.headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value_trimmed().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[async_trait]
impl FormsTicket for MemoryFormsTickets {
    async fn issue(&self, full_name: &str) -> ServiceResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        let mut tickets = self.tickets.write().await;
        let before = tickets.len();
        tickets.retain(|_, ticket| !self.is_expired(ticket, now));
        let swept = before - tickets.len();
        if swept > 0 {
            tracing::debug!(swept, "Expired forms tickets removed");
        }

        tickets.insert(
            token.clone(),
            Ticket {
                full_name: full_name.to_string(),
                issued_at: now,
                last_seen: now,
            },
        );
        tracing::debug!(%full_name, "Forms ticket issued");
        Ok(token)
    }

    async fn on_enter(&self, ctx: &RequestContext) -> ServiceResult<Option<String>> {
        let Some(token) = self.token(ctx) else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut tickets = self.tickets.write().await;
        match tickets.get(&token) {
            Some(ticket) if self.is_expired(ticket, now) => {
                tracing::debug!(full_name = %ticket.full_name, last_seen = %ticket.last_seen, "Forms ticket expired");
                tickets.remove(&token);
                Ok(None)
            }
            Some(ticket) => {
                tracing::trace!(full_name = %ticket.full_name, issued_at = %ticket.issued_at, "Forms ticket accepted");
                Ok(Some(ticket.full_name.clone()))
            }
            None => {
                tracing::debug!("Unknown forms ticket");
                Ok(None)
            }
        }
    }

    async fn on_leave(&self, ctx: &RequestContext, status: u16) -> ServiceResult<()> {
        let Some(token) = self.token(ctx) else {
            return Ok(());
        };

        if let Some(ticket) = self.tickets.write().await.get_mut(&token) {
            ticket.last_seen = Utc::now();
            tracing::trace!(full_name = %ticket.full_name, status, "Forms ticket refreshed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::{HeaderMap, HeaderValue, Method};

    use super::*;
    use crate::auth::request::RequestUrl;

    const HOUR: Duration = Duration::from_secs(3600);

    fn context_with_cookie(cookie: &str) -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        RequestContext::new(
            Method::GET,
            RequestUrl::new("http", "portal.local", "/", None),
            headers,
        )
    }

    #[test_log::test(tokio::test)]
    async fn issued_ticket_is_read_from_cookie() {
        let tickets = MemoryFormsTickets::new("turnstile_auth", HOUR);
        let token = tickets.issue("CORP\\alice").await.unwrap();

        let ctx = context_with_cookie(&format!("theme=dark; turnstile_auth={token}"));
        assert_eq!(
            tickets.on_enter(&ctx).await.unwrap().as_deref(),
            Some("CORP\\alice")
        );
    }

    #[test_log::test(tokio::test)]
    async fn quoted_and_padded_cookies_are_accepted() {
        let tickets = MemoryFormsTickets::new("turnstile_auth", HOUR);
        let token = tickets.issue("CORP\\alice").await.unwrap();

        for header in [
            format!("turnstile_auth=\"{token}\""),
            format!("theme=dark;turnstile_auth={token}"),
            format!("  turnstile_auth={token} ; theme=dark"),
        ] {
            let ctx = context_with_cookie(&header);
            assert_eq!(
                tickets.on_enter(&ctx).await.unwrap().as_deref(),
                Some("CORP\\alice"),
                "cookie header {header:?}"
            );
        }

        let ctx = context_with_cookie("turnstile_auth=; other=1");
        assert_eq!(tickets.on_enter(&ctx).await.unwrap(), None);
    }

    #[test_log::test(tokio::test)]
    async fn unknown_or_missing_ticket_is_none() {
        let tickets = MemoryFormsTickets::new("turnstile_auth", HOUR);

        let ctx = context_with_cookie("turnstile_auth=forged");
        assert_eq!(tickets.on_enter(&ctx).await.unwrap(), None);

        let ctx = context_with_cookie("other=1");
        assert_eq!(tickets.on_enter(&ctx).await.unwrap(), None);
    }

    #[test_log::test(tokio::test)]
    async fn on_leave_refreshes_last_seen() {
        let tickets = MemoryFormsTickets::new("turnstile_auth", HOUR);
        let token = tickets.issue("CORP\\alice").await.unwrap();
        let issued = tickets.last_seen(&token).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let ctx = context_with_cookie(&format!("turnstile_auth={token}"));
        tickets.on_leave(&ctx, 200).await.unwrap();

        assert!(tickets.last_seen(&token).await.unwrap() > issued);
    }

    #[test_log::test(tokio::test)]
    async fn idle_ticket_is_rejected_and_evicted() {
        let tickets = MemoryFormsTickets::new("turnstile_auth", Duration::ZERO);
        let token = tickets.issue("CORP\\alice").await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let ctx = context_with_cookie(&format!("turnstile_auth={token}"));
        assert_eq!(tickets.on_enter(&ctx).await.unwrap(), None);
        assert_eq!(tickets.last_seen(&token).await, None);
    }

    #[test_log::test(tokio::test)]
    async fn issuing_sweeps_expired_tickets() {
        let tickets = MemoryFormsTickets::new("turnstile_auth", Duration::ZERO);
        let stale = tickets.issue("CORP\\alice").await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let fresh = tickets.issue("CORP\\bob").await.unwrap();

        assert_eq!(tickets.last_seen(&stale).await, None);
        assert!(tickets.last_seen(&fresh).await.is_some());
        assert_eq!(tickets.tickets.read().await.len(), 1);
    }
}
