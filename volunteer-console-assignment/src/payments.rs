//! Who gets paid what for a study.

use std::collections::HashSet;

use futures_util::future::{join_all, try_join};
use tracing::{info, warn};
use volunteer_console_api::id::{GroupId, StudyId, VolunteerId};
use volunteer_console_api::model::{BankDetails, Volunteer};
use volunteer_console_api::ApiError;

use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLine {
    pub volunteer_id: VolunteerId,
    /// `None` when the volunteer could not be fetched.
    pub volunteer: Option<Volunteer>,
    pub group_id: GroupId,
    pub amount: u32,
    pub paid: bool,
    /// A cancellation exists for the volunteer in this study, or the association is cancelled.
    pub cancelled: bool,
    pub bank_details: Option<BankDetails>,
}

impl PaymentLine {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.cancelled
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentTotals {
    pub due: u64,
    pub paid: u64,
    pub outstanding: u64,
    pub active: usize,
    pub cancelled: usize,
}

/// One line of the payment export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRow {
    pub sequence: usize,
    pub last_name: String,
    pub first_name: String,
    pub iban: String,
    pub bic: String,
    pub amount: u32,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLedger {
    pub study_id: StudyId,
    pub lines: Vec<PaymentLine>,
}

impl PaymentLedger {
    pub async fn load<B: Backend>(backend: &B, study_id: StudyId) -> Result<Self, ApiError> {
        let (associations, cancellations) = try_join(
            backend.associations_by_study(study_id),
            backend.cancellations_by_study(study_id),
        )
        .await?;
        let cancelled: HashSet<_> = cancellations
            .iter()
            .map(|cancellation| cancellation.volunteer_id)
            .collect();

        let lines = join_all(associations.iter().filter_map(|key| {
            let volunteer_id = key.volunteer_id()?;
            let cancelled = cancelled.contains(&volunteer_id) || key.is_cancelled();
            Some(async move {
                let (volunteer, bank_details) = futures_util::future::join(
                    backend.volunteer(volunteer_id),
                    backend.bank_details(volunteer_id),
                )
                .await;
                let volunteer = volunteer
                    .inspect_err(|err| warn!(%volunteer_id, "could not fetch volunteer: {err}"))
                    .ok();
                let bank_details = bank_details
                    .inspect_err(|err| warn!(%volunteer_id, "could not fetch bank details: {err}"))
                    .ok()
                    .flatten();
                PaymentLine {
                    volunteer_id,
                    volunteer,
                    group_id: key.group_id(),
                    amount: key.compensation(),
                    paid: key.paid(),
                    cancelled,
                    bank_details,
                }
            })
        }))
        .await;

        info!(%study_id, lines = lines.len(), "payment ledger loaded");
        Ok(Self { study_id, lines })
    }

    pub fn active(&self) -> impl Iterator<Item = &PaymentLine> {
        self.lines.iter().filter(|line| line.is_active())
    }

    #[must_use]
    pub fn totals(&self) -> PaymentTotals {
        let mut totals = PaymentTotals::default();
        for line in &self.lines {
            if !line.is_active() {
                totals.cancelled += 1;
                continue;
            }
            totals.active += 1;
            totals.due += u64::from(line.amount);
            if line.paid {
                totals.paid += u64::from(line.amount);
            }
        }
        totals.outstanding = totals.due - totals.paid;
        totals
    }

    /// Rows for the export: active lines only, numbered from 1.
    #[must_use]
    pub fn rows(&self) -> Vec<PaymentRow> {
        self.active()
            .enumerate()
            .map(|(index, line)| {
                let (last_name, first_name) = line.volunteer.as_ref().map_or_else(
                    || (format!("#{}", line.volunteer_id), String::new()),
                    |volunteer| (volunteer.last_name.to_uppercase(), volunteer.first_name.clone()),
                );
                let mut remarks = Vec::new();
                if line.paid {
                    remarks.push("already paid");
                }
                if line.bank_details.is_none() {
                    remarks.push("no bank details");
                }
                PaymentRow {
                    sequence: index + 1,
                    last_name,
                    first_name,
                    iban: line
                        .bank_details
                        .as_ref()
                        .map(|details| details.iban.clone())
                        .unwrap_or_default(),
                    bic: line
                        .bank_details
                        .as_ref()
                        .map(|details| details.bic.clone())
                        .unwrap_or_default(),
                    amount: line.amount,
                    remarks: remarks.join(", "),
                }
            })
            .collect()
    }
}
