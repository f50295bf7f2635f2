use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
};

use axum::extract::ConnectInfo;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Default number of submissions allowed per client per minute
pub const DEFAULT_SUBMISSIONS_PER_MINUTE: u32 = 5;

/// Keyed limiter on submissions per client IP
pub struct SubmitLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl SubmitLimiter {
    /// Allows `per_minute` submissions per client, at least one
    #[must_use]
    pub fn per_minute(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Reads `SUBMIT_RATE_LIMIT_PER_MINUTE`, defaulting to five
    #[must_use]
    pub fn from_env() -> Self {
        Self::per_minute(
            std::env::var("SUBMIT_RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SUBMISSIONS_PER_MINUTE),
        )
    }

    /// Records a submission, returning whether it is within quota
    #[must_use]
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Drops state for clients whose quota has fully replenished
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

/// Client address of a request, unspecified when the server was not started
/// with connection info
#[must_use]
pub fn client_ip(connect_info: Option<&ConnectInfo<SocketAddr>>) -> IpAddr {
    connect_info.map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
        addr.ip()
    })
}
