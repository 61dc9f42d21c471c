// libs/availability-cell/src/services/slots.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_utils::clock::Clock;

use crate::error::SchedulingError;
use crate::models::{
    weekday_index, Appointment, AvailabilityOverride, ConsultationType, Practitioner, TimeWindow,
    WorkingHourRule,
};
use crate::services::store::{AppointmentLedger, AvailabilityStore};

// ==============================================================================
// PURE SLOT COMPUTATION
// ==============================================================================

/// Union of strictly overlapping windows. Windows that merely touch stay
/// separate so each remains its own tiling base.
pub fn merge_intervals(mut intervals: Vec<TimeWindow>) -> Vec<TimeWindow> {
    intervals.retain(|w| w.start < w.end);
    intervals.sort();

    let mut merged: Vec<TimeWindow> = Vec::with_capacity(intervals.len());
    for window in intervals {
        match merged.last_mut() {
            Some(last) if window.start < last.end => {
                last.end = last.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }
    merged
}

/// Rules, overrides and occupied time for one practitioner over a date range,
/// fetched once per call and evaluated without further I/O.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    rules: Vec<WorkingHourRule>,
    overrides: Vec<AvailabilityOverride>,
    busy: Vec<TimeWindow>,
}

impl ScheduleSnapshot {
    pub fn new(rules: Vec<WorkingHourRule>, overrides: Vec<AvailabilityOverride>) -> Self {
        Self {
            rules,
            overrides,
            busy: Vec::new(),
        }
    }

    /// Record confirmed appointments as occupied time, each widened by its own
    /// consultation type's buffers.
    pub fn with_appointments(mut self, appointments: &[Appointment], types: &[ConsultationType]) -> Self {
        let by_id: HashMap<Uuid, &ConsultationType> = types.iter().map(|t| (t.id, t)).collect();

        self.busy = appointments
            .iter()
            .filter(|a| a.is_confirmed())
            .map(|a| match by_id.get(&a.consultation_type_id) {
                Some(t) => a.window().widen(t.buffer_before(), t.buffer_after()),
                None => a.window(),
            })
            .collect();
        self.busy.sort();
        self
    }

    /// Effective open intervals for `date`. An override for the date replaces
    /// the weekly rules; a closed override yields nothing.
    pub fn open_intervals(&self, date: NaiveDate) -> Vec<TimeWindow> {
        let overrides: Vec<&AvailabilityOverride> = self
            .overrides
            .iter()
            .filter(|o| o.override_date == date)
            .collect();

        if !overrides.is_empty() {
            if overrides.iter().any(|o| o.is_closed) {
                return Vec::new();
            }
            return merge_intervals(
                overrides
                    .iter()
                    .flat_map(|o| o.open_intervals.iter())
                    .map(|i| TimeWindow::on_date(date, i.start_time, i.end_time))
                    .collect(),
            );
        }

        merge_intervals(
            self.rules
                .iter()
                .filter(|r| r.applies_on(date))
                .map(|r| TimeWindow::on_date(date, r.start_time, r.end_time))
                .collect(),
        )
    }

    /// Lazily enumerate bookable start times on `date`, ascending. Callers that
    /// only need to know whether a day has capacity can stop at the first item.
    pub fn slots_on<'a>(
        &'a self,
        date: NaiveDate,
        consultation_type: &ConsultationType,
        earliest_start: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> + 'a {
        let duration = consultation_type.duration();
        let buffer_before = consultation_type.buffer_before();
        let buffer_after = consultation_type.buffer_after();
        let step_seconds = duration.num_seconds();

        let intervals = if step_seconds > 0 {
            self.open_intervals(date)
        } else {
            Vec::new()
        };

        intervals
            .into_iter()
            .flat_map(move |interval| {
                let count = (interval.end - interval.start).num_seconds() / step_seconds;
                (0..count).map(move |k| interval.start + Duration::seconds(k * step_seconds))
            })
            .filter(move |start| *start >= earliest_start)
            .filter(move |start| {
                let needed = TimeWindow::new(*start, *start + duration).widen(buffer_before, buffer_after);
                !self.busy.iter().any(|occupied| occupied.overlaps(&needed))
            })
    }
}

// ==============================================================================
// SLOT GENERATOR SERVICE
// ==============================================================================

pub struct SlotGenerator {
    store: Arc<dyn AvailabilityStore>,
    ledger: Arc<dyn AppointmentLedger>,
    clock: Arc<dyn Clock>,
    default_lead_minutes: i64,
}

impl SlotGenerator {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        ledger: Arc<dyn AppointmentLedger>,
        clock: Arc<dyn Clock>,
        default_lead_minutes: i64,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            default_lead_minutes,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn find_practitioner(&self, practitioner_id: Uuid) -> Result<Option<Practitioner>, SchedulingError> {
        self.store.find_practitioner(practitioner_id).await
    }

    /// Earliest start a patient may book right now for this practitioner.
    pub fn earliest_start(&self, practitioner: &Practitioner) -> DateTime<Utc> {
        self.clock.now() + practitioner.booking_lead(self.default_lead_minutes)
    }

    /// Bookable start times for `date`, ascending. An empty list means the day
    /// is fully booked or closed.
    pub async fn compute_slots(
        &self,
        practitioner_id: Uuid,
        consultation_type_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, SchedulingError> {
        let practitioner = self
            .find_practitioner(practitioner_id)
            .await?
            .ok_or(SchedulingError::PractitionerNotFound)?;
        let consultation_type = self
            .resolve_consultation_type(&practitioner, consultation_type_id)
            .await?;

        self.compute_slots_for(&practitioner, &consultation_type, date).await
    }

    pub async fn compute_slots_for(
        &self,
        practitioner: &Practitioner,
        consultation_type: &ConsultationType,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, SchedulingError> {
        if date < self.today() {
            return Err(SchedulingError::Validation(format!("Date {} is in the past", date)));
        }

        let snapshot = self.load_hours(practitioner.id, date, date).await?;
        if snapshot.open_intervals(date).is_empty() {
            debug!("Practitioner {} has no open hours on {}", practitioner.id, date);
            return Ok(Vec::new());
        }

        let snapshot = self.attach_occupancy(snapshot, practitioner.id, date, date).await?;
        let slots: Vec<DateTime<Utc>> = snapshot
            .slots_on(date, consultation_type, self.earliest_start(practitioner))
            .collect();

        debug!(
            "Computed {} slots for practitioner {} on {} ({})",
            slots.len(), practitioner.id, date, consultation_type.name
        );
        Ok(slots)
    }

    /// Look up a bookable consultation type owned by the practitioner.
    pub async fn resolve_consultation_type(
        &self,
        practitioner: &Practitioner,
        consultation_type_id: Uuid,
    ) -> Result<ConsultationType, SchedulingError> {
        let consultation_type = self
            .store
            .find_consultation_type(practitioner.id, consultation_type_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or(SchedulingError::ConsultationTypeNotFound)?;

        consultation_type.validate().map_err(SchedulingError::Validation)?;
        Ok(consultation_type)
    }

    pub(crate) async fn load_hours(
        &self,
        practitioner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ScheduleSnapshot, SchedulingError> {
        let weekday = (from == to).then(|| weekday_index(from));

        let overrides = self.store.overrides_between(practitioner_id, from, to).await?;
        let rules = self.store.working_hour_rules(practitioner_id, weekday).await?;

        Ok(ScheduleSnapshot::new(rules, overrides))
    }

    pub(crate) async fn attach_occupancy(
        &self,
        snapshot: ScheduleSnapshot,
        practitioner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ScheduleSnapshot, SchedulingError> {
        let types = self.store.list_consultation_types(practitioner_id).await?;

        // Buffered appointments just outside the range can still reach into it
        let max_before = types.iter().map(|t| t.buffer_before()).max().unwrap_or_else(Duration::zero);
        let max_after = types.iter().map(|t| t.buffer_after()).max().unwrap_or_else(Duration::zero);
        let margin = (max_before + max_after) * 2;

        let window_start = from.and_time(NaiveTime::MIN).and_utc() - margin;
        let window_end = (to + Duration::days(1)).and_time(NaiveTime::MIN).and_utc() + margin;

        let appointments = self
            .ledger
            .confirmed_between(practitioner_id, window_start, window_end)
            .await?;

        Ok(snapshot.with_appointments(&appointments, &types))
    }
}
