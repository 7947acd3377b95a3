//! 认证端点的限流
//!
//! 登录与刷新令牌在认证之前执行，只能按客户端 IP 计数。
//! 每个 `端点:IP` 维护一个固定窗口，窗口内超出配额返回 429，
//! `Retry-After` 为当前窗口剩余秒数。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode};

// 窗口过期后由 moka 回收，TTL 需覆盖最长的窗口
static WINDOWS: Lazy<Cache<String, Window>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    /// 记录一次请求；超出配额时返回窗口剩余时间
    fn hit(
        prev: Option<Window>,
        now: Instant,
        max: u32,
        span: Duration,
    ) -> (Window, Option<Duration>) {
        let window = match prev {
            Some(w) if now.duration_since(w.started) < span => w,
            _ => Window {
                started: now,
                count: 0,
            },
        };

        if window.count >= max {
            let left = span.saturating_sub(now.duration_since(window.started));
            return (window, Some(left));
        }

        (
            Window {
                count: window.count + 1,
                ..window
            },
            None,
        )
    }
}

#[derive(Clone)]
pub struct RateLimit {
    endpoint: &'static str,
    max_requests: u32,
    window: Duration,
}

impl RateLimit {
    pub fn new(endpoint: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            endpoint,
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// 登录：5 次/分钟/IP
    pub fn login() -> Self {
        Self::new("login", 5, 60)
    }

    /// 刷新令牌：10 次/分钟/IP
    pub fn refresh_token() -> Self {
        Self::new("refresh", 10, 60)
    }
}

/// 客户端 IP，优先取连接信息（已考虑 Forwarded / X-Forwarded-For），其次 X-Real-IP
fn client_ip(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    if let Some(ip) = info.realip_remote_addr().and_then(parse_ip) {
        return ip.to_string();
    }

    req.headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// 兼容带端口的写法
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<std::net::SocketAddr>().ok().map(|s| s.ip()))
}

fn too_many_requests(retry_after: Duration) -> HttpResponse {
    // 不足一秒按一秒计
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", secs.max(1).to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let key = format!("{}:{}", limit.endpoint, client_ip(&req));

            let prev = WINDOWS.get(&key).await;
            let (window, blocked) =
                Window::hit(prev, Instant::now(), limit.max_requests, limit.window);
            WINDOWS.insert(key.clone(), window).await;

            if let Some(retry_after) = blocked {
                warn!(
                    "Rate limit exceeded for {} ({} requests per {}s)",
                    key,
                    limit.max_requests,
                    limit.window.as_secs()
                );
                return Ok(
                    req.into_response(too_many_requests(retry_after).map_into_right_body())
                );
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let login = RateLimit::login();
        assert_eq!(login.endpoint, "login");
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window, Duration::from_secs(60));

        let refresh = RateLimit::refresh_token();
        assert_eq!(refresh.endpoint, "refresh");
        assert_eq!(refresh.max_requests, 10);
    }

    #[test]
    fn test_parse_ip() {
        assert_eq!(parse_ip("10.0.0.1"), "10.0.0.1".parse().ok());
        assert_eq!(parse_ip("192.0.2.10:4000"), "192.0.2.10".parse().ok());
        assert!(parse_ip("::1").is_some());
        assert!(parse_ip("not-an-ip").is_none());
    }

    #[test]
    fn test_window_counts_and_resets() {
        let span = Duration::from_secs(60);
        let start = Instant::now();

        let (w, blocked) = Window::hit(None, start, 2, span);
        assert!(blocked.is_none());
        let (w, blocked) = Window::hit(Some(w), start + Duration::from_secs(1), 2, span);
        assert!(blocked.is_none());
        assert_eq!(w.count, 2);

        let (w, blocked) = Window::hit(Some(w), start + Duration::from_secs(20), 2, span);
        assert_eq!(blocked, Some(Duration::from_secs(40)));
        assert_eq!(w.count, 2);

        // 新窗口重新计数
        let (w, blocked) = Window::hit(Some(w), start + span, 2, span);
        assert!(blocked.is_none());
        assert_eq!(w.count, 1);
        assert_eq!(w.started, start + span);
    }

    #[actix_web::test]
    async fn test_sixth_login_attempt_is_rejected() {
        use actix_web::{App, test, web};

        let app = test::init_service(
            App::new().service(
                web::resource("/login")
                    .wrap(RateLimit::new("login-test", 5, 60))
                    .route(web::post().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let attempt = || {
            test::TestRequest::post()
                .uri("/login")
                .peer_addr("192.0.2.10:4000".parse().expect("addr"))
                .to_request()
        };

        for _ in 0..5 {
            let resp = test::call_service(&app, attempt()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = test::call_service(&app, attempt()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = resp
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .expect("retry-after header");
        assert!((1..=60).contains(&retry_after));

        // 其他 IP 不受影响
        let other = test::TestRequest::post()
            .uri("/login")
            .peer_addr("198.51.100.7:4000".parse().expect("addr"))
            .to_request();
        assert_eq!(test::call_service(&app, other).await.status(), StatusCode::OK);
    }
}
