use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use futures_util::future::join_all;
use itertools::{Itertools as _, MinMaxResult};
use tracing::{debug, warn};
use volunteer_console_api::id::{StudyId, VolunteerId};
use volunteer_console_api::model::Appointment;
use volunteer_console_api::ApiError;

use crate::backend::Backend;

pub const DEFAULT_PADDING_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyOverlap {
    pub study_id: StudyId,
    /// `None` when the study could not be fetched.
    pub title: Option<String>,
    pub appointments: Vec<Appointment>,
}

/// Other studies the volunteer is booked in around the dates of a study. A warning, never a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapReport {
    /// Padded first and last appointment date of the target study.
    pub window: Option<(NaiveDate, NaiveDate)>,
    pub studies: BTreeMap<StudyId, StudyOverlap>,
}

impl OverlapReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }

    #[must_use]
    pub fn appointment_count(&self) -> usize {
        self.studies
            .values()
            .map(|study| study.appointments.len())
            .sum()
    }
}

fn window(appointments: &[Appointment], padding_days: u32) -> Option<(NaiveDate, NaiveDate)> {
    let (first, last) = match appointments.iter().map(|appointment| appointment.date).minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(date) => (date, date),
        MinMaxResult::MinMax(first, last) => (first, last),
    };
    let padding = Days::new(padding_days.into());
    Some((
        first.checked_sub_days(padding).unwrap_or(NaiveDate::MIN),
        last.checked_add_days(padding).unwrap_or(NaiveDate::MAX),
    ))
}

pub async fn check_overlap<B: Backend>(
    backend: &B,
    volunteer_id: VolunteerId,
    study_id: StudyId,
    padding_days: u32,
) -> Result<OverlapReport, ApiError> {
    let Some((from, to)) = window(&backend.appointments_by_study(study_id).await?, padding_days)
    else {
        debug!(%study_id, "study has no appointments, nothing can overlap");
        return Ok(OverlapReport::default());
    };

    let by_study: BTreeMap<_, _> = backend
        .appointments_by_volunteer(volunteer_id)
        .await?
        .into_iter()
        .filter(|appointment| appointment.study_id != study_id)
        .filter(|appointment| (from..=to).contains(&appointment.date))
        .sorted_by(|a, b| a.slot().cmp(&b.slot()))
        .into_group_map_by(|appointment| appointment.study_id)
        .into_iter()
        .collect();

    let titles = join_all(by_study.keys().map(|other| async move {
        match backend.study(*other).await {
            Ok(study) => Some(study.title),
            Err(err) => {
                warn!(study_id = %other, "could not fetch study title: {err}");
                None
            }
        }
    }))
    .await;

    let studies = by_study
        .into_iter()
        .zip(titles)
        .map(|((other, appointments), title)| {
            (
                other,
                StudyOverlap {
                    study_id: other,
                    title,
                    appointments,
                },
            )
        })
        .collect();

    Ok(OverlapReport {
        window: Some((from, to)),
        studies,
    })
}
