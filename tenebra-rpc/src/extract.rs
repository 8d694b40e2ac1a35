use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use serde::Deserialize;
use tenebra_ledger::RequestMeta;

/// Page window with the API-wide clamp of 1000 rows.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 1000)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Sortable listing parameters for the lookup API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortedQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
}

impl SortedQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination { limit: self.limit, offset: self.offset }
    }

    pub fn ascending(&self) -> bool {
        !matches!(self.order.as_deref(), Some("DESC") | Some("desc"))
    }
}

/// Pulls the request context (ip, useragent, origin) out of the connection
/// and headers for the auth log.
pub struct Meta(pub RequestMeta);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Meta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        // Honour the reverse proxy's client ip when present.
        let ip = header("x-forwarded-for")
            .map(|raw| raw.split(',').next().unwrap_or(&raw).trim().to_string())
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            });
        Ok(Meta(RequestMeta {
            ip,
            useragent: header("user-agent"),
            origin: header("origin"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps() {
        let page = Pagination { limit: Some(5_000), offset: Some(-3) };
        assert_eq!(page.limit(), 1000);
        assert_eq!(page.offset(), 0);
        let page = Pagination::default();
        assert_eq!(page.limit(), 50);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn sort_order_defaults_ascending() {
        assert!(SortedQuery::default().ascending());
        let desc = SortedQuery { order: Some("DESC".into()), ..Default::default() };
        assert!(!desc.ascending());
    }
}
