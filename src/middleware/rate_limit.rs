use actix_web::{
    Error, HttpResponse, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use moka::sync::Cache;
use std::{
    net::IpAddr,
    rc::Rc,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use crate::handlers::shared::ApiResponse;

/// Rate limit configuration
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window duration in seconds
    pub window_seconds: u64,
    /// Message to return when rate limit is exceeded
    pub message: String,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
            message: "Rate limit exceeded. Please try again later.".to_string(),
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }
}

/// Per-IP request counters. Each counter lives for one window after the first
/// request from that address, then the cache drops it.
#[derive(Clone)]
pub struct RateLimitStore {
    counters: Cache<IpAddr, Arc<AtomicU32>>,
}

impl RateLimitStore {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            counters: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(Duration::from_secs(window_seconds))
                .build(),
        }
    }

    /// Counts the request and reports whether it is within the limit
    pub fn check_and_update_ip(&self, ip: IpAddr, config: &RateLimitConfig) -> bool {
        let counter = self
            .counters
            .get_with(ip, || Arc::new(AtomicU32::new(0)));
        counter.fetch_add(1, Ordering::SeqCst) < config.max_requests
    }
}

/// Rate limiting middleware
pub struct RateLimitMiddleware {
    store: RateLimitStore,
    config: RateLimitConfig,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            store: RateLimitStore::new(config.window_seconds),
            config,
        }
    }

    /// Uses an existing store so several app instances count together
    pub fn with_store(config: RateLimitConfig, store: RateLimitStore) -> Self {
        Self { store, config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = futures_util::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures_util::future::ready(Ok(RateLimitService {
            service: Rc::new(service),
            store: self.store.clone(),
            config: self.config.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    store: RateLimitStore,
    config: RateLimitConfig,
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
        let service = self.service.clone();
        let store = self.store.clone();
        let config = self.config.clone();

        Box::pin(async move {
            if let Some(ip) = req.peer_addr().map(|addr| addr.ip()) {
                if !store.check_and_update_ip(ip, &config) {
                    log::warn!("Rate limit exceeded for IP: {}", ip);
                    let response = HttpResponse::TooManyRequests()
                        .json(ApiResponse::<()>::error(&config.message));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

const LOGIN_WINDOW_SECONDS: u64 = 300;
const RECOVERY_WINDOW_SECONDS: u64 = 900;

// Process-wide so every worker shares one count per address
static LOGIN_ATTEMPTS: LazyLock<RateLimitStore> =
    LazyLock::new(|| RateLimitStore::new(LOGIN_WINDOW_SECONDS));
static RECOVERY_ATTEMPTS: LazyLock<RateLimitStore> =
    LazyLock::new(|| RateLimitStore::new(RECOVERY_WINDOW_SECONDS));

/// Specialized rate limiter for authentication endpoints
pub struct AuthRateLimiter;

impl AuthRateLimiter {
    /// 5 login attempts per 5 minutes
    pub fn login() -> RateLimitMiddleware {
        RateLimitMiddleware::with_store(
            RateLimitConfig::new(5, LOGIN_WINDOW_SECONDS).with_message(
                "Too many login attempts. Please try again in 5 minutes.".to_string(),
            ),
            LOGIN_ATTEMPTS.clone(),
        )
    }

    /// 3 recovery attempts per 15 minutes
    pub fn recovery() -> RateLimitMiddleware {
        RateLimitMiddleware::with_store(
            RateLimitConfig::new(3, RECOVERY_WINDOW_SECONDS).with_message(
                "Too many recovery attempts. Please try again in 15 minutes.".to_string(),
            ),
            RECOVERY_ATTEMPTS.clone(),
        )
    }
}
