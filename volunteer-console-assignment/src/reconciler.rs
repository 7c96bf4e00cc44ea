//! Keeps the `EtudeVolontaire` bookkeeping in line with appointment assignments.
//!
//! There must be at most one association per (study, volunteer). The backend offers no delete that
//! reliably works for every record, so removal walks an ordered list of strategies until one of
//! them sticks. Nothing in here returns an error: the appointment's own volunteer field is what
//! counts, the association is secondary, so failures are logged and the caller carries on.

use core::fmt;

use tracing::{debug, error, info, warn};
use volunteer_console_api::id::{StudyId, VolunteerId};
use volunteer_console_api::model::{AssociationKey, Group, STATUS_CANCELLED, STATUS_REGISTERED};
use volunteer_console_api::ApiError;

use crate::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStrategy {
    /// Detach the record from the volunteer.
    SoftUnassign,
    /// Only applies to records with a subject number.
    ResetSubjectNumberThenDelete,
    CancelThenDelete,
    /// `DELETE /api/etudes/{study}/volontaires/{volunteer}`
    DirectUnassign,
}

impl RemovalStrategy {
    pub const ORDER: [Self; 4] = [
        Self::SoftUnassign,
        Self::ResetSubjectNumberThenDelete,
        Self::CancelThenDelete,
        Self::DirectUnassign,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SoftUnassign => "soft-unassign",
            Self::ResetSubjectNumberThenDelete => "reset-subject-number-then-delete",
            Self::CancelThenDelete => "cancel-then-delete",
            Self::DirectUnassign => "direct-unassign",
        }
    }
}

impl fmt::Display for RemovalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    NotFound,
    Removed(RemovalStrategy),
    /// Every strategy failed, or the associations could not even be listed.
    Exhausted,
}

pub struct Reconciler<'a, B> {
    backend: &'a B,
}

impl<'a, B: Backend> Reconciler<'a, B> {
    pub const fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    async fn find(
        &self,
        study_id: StudyId,
        volunteer_id: VolunteerId,
    ) -> Result<Option<AssociationKey>, ApiError> {
        Ok(self
            .backend
            .associations_by_study(study_id)
            .await?
            .into_iter()
            .find(|key| key.volunteer_id() == Some(volunteer_id)))
    }

    pub async fn remove_association(
        &self,
        study_id: StudyId,
        volunteer_id: VolunteerId,
    ) -> RemovalOutcome {
        match self.find(study_id, volunteer_id).await {
            Ok(Some(existing)) => self.remove(existing, volunteer_id).await,
            Ok(None) => {
                debug!(%study_id, %volunteer_id, "no association to remove");
                RemovalOutcome::NotFound
            }
            Err(err) => {
                error!(%study_id, %volunteer_id, "could not list associations: {err}");
                RemovalOutcome::Exhausted
            }
        }
    }

    async fn remove(&self, existing: AssociationKey, volunteer_id: VolunteerId) -> RemovalOutcome {
        let study_id = existing.study_id();
        // a strategy that fails halfway leaves the record under a different key
        let mut current = existing;
        for strategy in RemovalStrategy::ORDER {
            match self.attempt(strategy, &mut current, volunteer_id).await {
                Ok(true) => {
                    info!(%study_id, %volunteer_id, %strategy, "association removed");
                    return RemovalOutcome::Removed(strategy);
                }
                Ok(false) => debug!(%study_id, %volunteer_id, %strategy, "not applicable"),
                Err(err) => warn!(%study_id, %volunteer_id, %strategy, "failed: {err}"),
            }
        }
        error!(%study_id, %volunteer_id, "every removal strategy failed, the association stays");
        RemovalOutcome::Exhausted
    }

    async fn attempt(
        &self,
        strategy: RemovalStrategy,
        current: &mut AssociationKey,
        volunteer_id: VolunteerId,
    ) -> Result<bool, ApiError> {
        match strategy {
            RemovalStrategy::SoftUnassign => {
                self.backend
                    .update_association_volunteer(current, None)
                    .await?;
            }
            RemovalStrategy::ResetSubjectNumberThenDelete => {
                if current.subject_number() == 0 {
                    return Ok(false);
                }
                self.backend
                    .update_association_subject_number(current, 0)
                    .await?;
                *current = current.with_subject_number(0);
                self.backend.delete_association(current).await?;
            }
            RemovalStrategy::CancelThenDelete => {
                self.backend
                    .update_association_status(current, STATUS_CANCELLED)
                    .await?;
                *current = current.with_status(STATUS_CANCELLED);
                self.backend.delete_association(current).await?;
            }
            RemovalStrategy::DirectUnassign => {
                self.backend
                    .unassign_volunteer_from_study(current.study_id(), volunteer_id)
                    .await?;
            }
        }
        Ok(true)
    }

    /// Replaces whatever association the volunteer has in the study with a fresh one in `group`.
    ///
    /// An individual compensation already set on the old record survives, otherwise the group's
    /// default applies. Paid flag and status survive as well. The subject number starts over at 0.
    /// Returns the created key, or `None` if the backend refused it.
    pub async fn ensure_association(
        &self,
        study_id: StudyId,
        group: &Group,
        volunteer_id: VolunteerId,
    ) -> Option<AssociationKey> {
        let prior = match self.find(study_id, volunteer_id).await {
            Ok(prior) => prior,
            Err(err) => {
                warn!(%study_id, %volunteer_id, "could not look up the previous association: {err}");
                None
            }
        };

        if let Some(prior) = &prior {
            self.remove(prior.clone(), volunteer_id).await;
        }

        let compensation = prior
            .as_ref()
            .map(AssociationKey::compensation)
            .filter(|compensation| *compensation > 0)
            .unwrap_or(group.compensation);
        let paid = prior.as_ref().is_some_and(AssociationKey::paid);
        let status = prior
            .as_ref()
            .map(AssociationKey::status)
            .filter(|status| !status.is_empty())
            .unwrap_or(STATUS_REGISTERED);

        let key = AssociationKey::new(study_id, group.id, volunteer_id)
            .with_compensation(compensation)
            .with_paid(paid)
            .with_status(status);

        match self.backend.create_association(&key).await {
            Ok(()) => {
                info!(%study_id, group_id = %group.id, %volunteer_id, compensation, "association created");
                Some(key)
            }
            Err(err) => {
                error!(%study_id, group_id = %group.id, %volunteer_id, "could not create association: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use volunteer_console_api::id::GroupId;

    use super::*;
    use crate::testing::{group, Call, MemoryBackend, Operation};

    const STUDY: StudyId = StudyId(10);
    const VOLUNTEER: VolunteerId = VolunteerId(100);

    fn existing() -> AssociationKey {
        AssociationKey::new(STUDY, GroupId(5), VOLUNTEER)
            .with_compensation(50)
            .with_subject_number(3)
    }

    #[tokio::test]
    async fn removing_nothing_is_a_no_op() {
        let backend = MemoryBackend::default();
        let outcome = Reconciler::new(&backend)
            .remove_association(STUDY, VOLUNTEER)
            .await;
        assert_eq!(outcome, RemovalOutcome::NotFound);
        assert!(backend.mutations().is_empty());
    }

    #[tokio::test]
    async fn first_strategy_wins() {
        let backend = MemoryBackend::default();
        backend.insert_association(existing());

        let outcome = Reconciler::new(&backend)
            .remove_association(STUDY, VOLUNTEER)
            .await;
        assert_eq!(
            outcome,
            RemovalOutcome::Removed(RemovalStrategy::SoftUnassign)
        );
        assert_eq!(
            backend.mutations(),
            [Call::UpdateAssociationVolunteer(existing(), None)]
        );
    }

    #[tokio::test]
    async fn falls_through_in_order() {
        let backend = MemoryBackend::default();
        backend.insert_association(existing());
        backend.fail_always(Operation::UpdateAssociationVolunteer);
        backend.fail_always(Operation::DeleteAssociation);

        let outcome = Reconciler::new(&backend)
            .remove_association(STUDY, VOLUNTEER)
            .await;
        assert_eq!(
            outcome,
            RemovalOutcome::Removed(RemovalStrategy::DirectUnassign)
        );

        let reset = existing().with_subject_number(0);
        assert_eq!(
            backend.mutations(),
            [
                Call::UpdateAssociationVolunteer(existing(), None),
                Call::UpdateAssociationSubjectNumber(existing(), 0),
                Call::DeleteAssociation(reset.clone()),
                // the record now has subject number 0, so that is the key to cancel
                Call::UpdateAssociationStatus(reset.clone(), STATUS_CANCELLED.to_owned()),
                Call::DeleteAssociation(reset.with_status(STATUS_CANCELLED)),
                Call::UnassignVolunteer(STUDY, VOLUNTEER),
            ]
        );
        assert!(backend.associations().is_empty());
    }

    #[tokio::test]
    async fn subject_number_strategy_skipped_without_subject_number() {
        let backend = MemoryBackend::default();
        let key = existing().with_subject_number(0);
        backend.insert_association(key.clone());
        backend.fail_always(Operation::UpdateAssociationVolunteer);

        let outcome = Reconciler::new(&backend)
            .remove_association(STUDY, VOLUNTEER)
            .await;
        assert_eq!(
            outcome,
            RemovalOutcome::Removed(RemovalStrategy::CancelThenDelete)
        );
        assert!(!backend
            .mutations()
            .iter()
            .any(|call| matches!(call, Call::UpdateAssociationSubjectNumber(..))));
    }

    #[tokio::test]
    async fn exhausted_strategies_do_not_raise() {
        let backend = MemoryBackend::default();
        backend.insert_association(existing());
        for operation in [
            Operation::UpdateAssociationVolunteer,
            Operation::UpdateAssociationSubjectNumber,
            Operation::UpdateAssociationStatus,
            Operation::UnassignVolunteer,
        ] {
            backend.fail_always(operation);
        }

        let outcome = Reconciler::new(&backend)
            .remove_association(STUDY, VOLUNTEER)
            .await;
        assert_eq!(outcome, RemovalOutcome::Exhausted);
        assert_eq!(backend.associations(), [existing()]);
    }

    #[tokio::test]
    async fn listing_failure_is_swallowed() {
        let backend = MemoryBackend::default();
        backend.fail_always(Operation::AssociationsByStudy);
        let outcome = Reconciler::new(&backend)
            .remove_association(STUDY, VOLUNTEER)
            .await;
        assert_eq!(outcome, RemovalOutcome::Exhausted);
    }

    #[tokio::test]
    async fn prior_compensation_paid_and_status_survive() {
        let backend = MemoryBackend::default();
        backend.insert_association(existing().with_paid(true).with_status("CONFIRME"));

        let created = Reconciler::new(&backend)
            .ensure_association(STUDY, &group(7, 10, 30, None), VOLUNTEER)
            .await
            .unwrap();

        assert_eq!(created.group_id(), GroupId(7));
        assert_eq!(created.compensation(), 50);
        assert_eq!(created.subject_number(), 0);
        assert!(created.paid());
        assert_eq!(created.status(), "CONFIRME");
        assert_eq!(backend.associations(), [created]);
    }

    #[tokio::test]
    async fn new_volunteer_gets_group_default() {
        // volunteer 100 had iv 50 on the old association; volunteer 200 has none of its own
        let backend = MemoryBackend::default();
        backend.insert_association(existing());

        let created = Reconciler::new(&backend)
            .ensure_association(STUDY, &group(5, 10, 30, None), VolunteerId(200))
            .await
            .unwrap();

        assert_eq!(created.volunteer_id(), Some(VolunteerId(200)));
        assert_eq!(created.compensation(), 30);
        assert!(!created.paid());
        assert_eq!(created.status(), STATUS_REGISTERED);
    }

    #[tokio::test]
    async fn zero_prior_compensation_falls_back_to_group() {
        let backend = MemoryBackend::default();
        backend.insert_association(existing().with_compensation(0));

        let created = Reconciler::new(&backend)
            .ensure_association(STUDY, &group(5, 10, 30, None), VOLUNTEER)
            .await
            .unwrap();
        assert_eq!(created.compensation(), 30);
    }

    #[tokio::test]
    async fn creation_failure_is_swallowed() {
        let backend = MemoryBackend::default();
        backend.fail_always(Operation::CreateAssociation);

        let created = Reconciler::new(&backend)
            .ensure_association(STUDY, &group(5, 10, 30, None), VOLUNTEER)
            .await;
        assert_eq!(created, None);
    }
}
