use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_WAITLIST_TTL_DAYS: i64 = 14;
pub const DEFAULT_MIN_BOOKING_LEAD_MINUTES: i64 = 60;
pub const DEFAULT_WAITLIST_PROMOTION_LIMIT: usize = 3;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub supabase_service_role_key: String,
    pub cron_secret: String,
    pub waitlist_ttl_days: i64,
    pub min_booking_lead_minutes: i64,
    pub waitlist_promotion_limit: usize,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, server-side reads fall back to the anon key");
                    String::new()
                }),
            cron_secret: env::var("CRON_SECRET")
                .unwrap_or_else(|_| {
                    warn!("CRON_SECRET not set, waitlist cleanup endpoint is disabled");
                    String::new()
                }),
            waitlist_ttl_days: parse_or_default("WAITLIST_TTL_DAYS", DEFAULT_WAITLIST_TTL_DAYS),
            min_booking_lead_minutes: parse_or_default(
                "MIN_BOOKING_LEAD_MINUTES",
                DEFAULT_MIN_BOOKING_LEAD_MINUTES,
            ),
            waitlist_promotion_limit: parse_or_default(
                "WAITLIST_PROMOTION_LIMIT",
                DEFAULT_WAITLIST_PROMOTION_LIMIT,
            ),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_cleanup_enabled(&self) -> bool {
        !self.cron_secret.is_empty()
    }

    /// Key used for server-side reads and trusted batch jobs. Falls back to the
    /// anon key when no service role key is configured.
    pub fn service_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
