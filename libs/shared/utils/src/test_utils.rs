use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::{
    AppConfig, DEFAULT_MIN_BOOKING_LEAD_MINUTES, DEFAULT_PORT,
    DEFAULT_WAITLIST_PROMOTION_LIMIT, DEFAULT_WAITLIST_TTL_DAYS,
};
use shared_models::auth::User;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";
pub const TEST_CRON_SECRET: &str = "test-cron-secret";

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub cron_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            cron_secret: TEST_CRON_SECRET.to_string(),
        }
    }
}

impl TestConfig {
    /// Point the Supabase client at a mock server.
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            cron_secret: self.cron_secret.clone(),
            waitlist_ttl_days: DEFAULT_WAITLIST_TTL_DAYS,
            min_booking_lead_minutes: DEFAULT_MIN_BOOKING_LEAD_MINUTES,
            waitlist_promotion_limit: DEFAULT_WAITLIST_PROMOTION_LIMIT,
            port: DEFAULT_PORT,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_id(id: Uuid, email: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn practitioner(email: &str) -> Self {
        Self::new(email, "practitioner")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap_or_default()
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn bearer(user: &TestUser) -> String {
        format!("Bearer {}", Self::create_test_token(user, TEST_JWT_SECRET, Some(1)))
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

/// Canned PostgREST rows for the scheduling tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn practitioner_response(id: &str, slug: &str, booking_enabled: bool) -> serde_json::Value {
        json!({
            "id": id,
            "slug": slug,
            "display_name": "Dr. Test",
            "booking_enabled": booking_enabled,
            "min_booking_lead_minutes": null
        })
    }

    pub fn consultation_type_response(id: &str, practitioner_id: &str, duration_minutes: i32) -> serde_json::Value {
        json!({
            "id": id,
            "practitioner_id": practitioner_id,
            "name": "Standard consultation",
            "duration_minutes": duration_minutes,
            "buffer_before_minutes": 0,
            "buffer_after_minutes": 0,
            "price_cents": 9000,
            "is_active": true
        })
    }

    pub fn working_hour_rule_response(practitioner_id: &str, weekday: u32, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "practitioner_id": practitioner_id,
            "weekday": weekday,
            "start_time": start,
            "end_time": end,
            "valid_from": null,
            "valid_until": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
