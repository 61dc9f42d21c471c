pub mod booking;
pub mod memory;
pub mod slots;
pub mod store;
pub mod summary;
pub mod supabase;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

pub use booking::BookingService;
pub use memory::{InMemoryAppointmentLedger, InMemoryAvailabilityStore};
pub use slots::{merge_intervals, ScheduleSnapshot, SlotGenerator};
pub use store::{AppointmentLedger, AvailabilityStore};
pub use summary::{parse_month, MonthSummarizer};
pub use supabase::{SupabaseAppointmentLedger, SupabaseAvailabilityStore};

/// The scheduling services wired against one pair of stores.
pub struct SchedulingServices {
    pub store: Arc<dyn AvailabilityStore>,
    pub ledger: Arc<dyn AppointmentLedger>,
    pub slots: Arc<SlotGenerator>,
    pub months: MonthSummarizer,
    pub booking: BookingService,
}

impl SchedulingServices {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        ledger: Arc<dyn AppointmentLedger>,
        clock: Arc<dyn Clock>,
        default_lead_minutes: i64,
    ) -> Self {
        let slots = Arc::new(SlotGenerator::new(
            store.clone(),
            ledger.clone(),
            clock.clone(),
            default_lead_minutes,
        ));

        Self {
            months: MonthSummarizer::new(slots.clone()),
            booking: BookingService::new(store.clone(), ledger.clone(), slots.clone(), clock),
            store,
            ledger,
            slots,
        }
    }

    /// Supabase-backed services. `auth_token` is forwarded as the bearer on
    /// every request; `None` falls back to the anon key.
    pub fn from_config(config: &AppConfig, auth_token: Option<&str>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let token = auth_token.map(str::to_string);

        Self::new(
            Arc::new(SupabaseAvailabilityStore::new(supabase.clone(), token.clone())),
            Arc::new(SupabaseAppointmentLedger::new(supabase, token)),
            Arc::new(SystemClock),
            config.min_booking_lead_minutes,
        )
    }
}
