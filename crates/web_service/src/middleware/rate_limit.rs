//! Per-client request budgets.
//!
//! Each [`RateLimit`] owns one keyed limiter shared by every worker, so
//! wrapping several routes with clones of the same value gives them a common
//! budget.

use std::future::{ready, Ready};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::config::{RateLimitConfig, RateLimitRule};
use crate::error::AppError;

const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Clone)]
pub struct RateLimit {
    name: &'static str,
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    retry_after_minutes: u64,
}

impl RateLimit {
    /// Admits at most `max_requests` inside any `window`. Spent budget comes
    /// back one request per `window`.
    pub fn new(name: &'static str, rule: RateLimitRule) -> Self {
        let burst = NonZeroU32::new(rule.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(rule.window)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            name,
            limiter: Arc::new(RateLimiter::keyed(quota)),
            retry_after_minutes: rule.window_minutes(),
        }
    }

    fn admit(&self, client: &str) -> bool {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client.to_string()).is_ok()
    }
}

/// One limiter per route group.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: RateLimit,
    pub auth: RateLimit,
    pub ai: RateLimit,
    pub upload: RateLimit,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: RateLimit::new("general", config.general),
            auth: RateLimit::new("auth", config.auth),
            ai: RateLimit::new("ai", config.ai),
            upload: RateLimit::new("upload", config.upload),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Honors X-Forwarded-For / Forwarded, the service normally runs behind a proxy.
        let client = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        if !self.limit.admit(&client) {
            tracing::warn!(limiter = self.limit.name, client = %client, "Rate limit exceeded");
            let response = AppError::RateLimited {
                retry_after_minutes: self.limit.retry_after_minutes,
            }
            .error_response();
            let rejected = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(rejected) });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
