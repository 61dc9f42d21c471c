use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{ConsultationType, Practitioner};
use crate::services::slots::SlotGenerator;

/// Parse a `YYYY-MM` month parameter.
pub fn parse_month(value: &str) -> Result<(i32, u32), SchedulingError> {
    let invalid = || SchedulingError::Validation(format!("Invalid month '{}', expected YYYY-MM", value));

    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;

    Ok((year, month))
}

/// Calendar view: which dates of a month have at least one bookable slot.
pub struct MonthSummarizer {
    slots: Arc<SlotGenerator>,
}

impl MonthSummarizer {
    pub fn new(slots: Arc<SlotGenerator>) -> Self {
        Self { slots }
    }

    pub async fn compute_available_days(
        &self,
        practitioner_id: Uuid,
        consultation_type_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<BTreeSet<NaiveDate>, SchedulingError> {
        let practitioner = self
            .slots
            .find_practitioner(practitioner_id)
            .await?
            .ok_or(SchedulingError::PractitionerNotFound)?;
        let consultation_type = self
            .slots
            .resolve_consultation_type(&practitioner, consultation_type_id)
            .await?;

        self.compute_available_days_for(&practitioner, &consultation_type, year, month)
            .await
    }

    pub async fn compute_available_days_for(
        &self,
        practitioner: &Practitioner,
        consultation_type: &ConsultationType,
        year: i32,
        month: u32,
    ) -> Result<BTreeSet<NaiveDate>, SchedulingError> {
        let month_start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            SchedulingError::Validation(format!("Invalid month {}-{:02}", year, month))
        })?;
        let month_end = month_start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| SchedulingError::Validation(format!("Month {}-{:02} is out of range", year, month)))?;

        let mut available = BTreeSet::new();

        let first = month_start.max(self.slots.today());
        if first > month_end {
            debug!("Month {}-{:02} is entirely in the past", year, month);
            return Ok(available);
        }

        // Rules and overrides for the whole range in one round trip each
        let snapshot = self.slots.load_hours(practitioner.id, first, month_end).await?;

        let open_days: Vec<NaiveDate> = first
            .iter_days()
            .take_while(|day| *day <= month_end)
            .filter(|day| !snapshot.open_intervals(*day).is_empty())
            .collect();

        if open_days.is_empty() {
            debug!(
                "Practitioner {} has no open hours in {}-{:02}",
                practitioner.id, year, month
            );
            return Ok(available);
        }

        let snapshot = self
            .slots
            .attach_occupancy(snapshot, practitioner.id, first, month_end)
            .await?;
        let earliest = self.slots.earliest_start(practitioner);

        for day in open_days {
            if snapshot.slots_on(day, consultation_type, earliest).next().is_some() {
                available.insert(day);
            }
        }

        debug!(
            "Practitioner {} has {} available days in {}-{:02}",
            practitioner.id,
            available.len(),
            month_start.year(),
            month_start.month()
        );
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_month_accepts_calendar_months() {
        assert_eq!(parse_month("2030-06").unwrap(), (2030, 6));
        assert_eq!(parse_month("2031-12").unwrap(), (2031, 12));
    }

    #[test]
    fn test_parse_month_rejects_malformed_values() {
        for value in ["2030-13", "2030-6", "30-06", "2030/06", "june", ""] {
            assert_matches!(parse_month(value), Err(SchedulingError::Validation(_)), "{}", value);
        }
    }
}
