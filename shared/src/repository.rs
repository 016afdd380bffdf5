//! Local mirror of the server's case list.
//!
//! The list changes only when the server acknowledges a request. Nothing is
//! applied optimistically, so a failed call can never leave a client-only
//! or stale entry behind.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiPath};
use crate::error::{ApiError, FetchError, MutationError};
use crate::event::Event;
use crate::in_flight::Ticket;
use crate::model::{Case, CaseDraft, CaseId, EditDraft};

#[derive(Serialize)]
struct UpdateBody<'a> {
    #[serde(rename = "_id")]
    id: &'a CaseId,
    title: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CaseRepository {
    cases: Vec<Case>,
}

impl CaseRepository {
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, id: &CaseId) -> Option<&Case> {
        self.cases.iter().find(|c| &c.id == id)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.cases.clear();
    }

    // ===== Requests =====

    pub fn refresh(api: &ApiClient<'_>, ticket: Ticket) -> Result<(), ApiError> {
        api.get(&ApiPath::Cases)?
            .send(move |result| Event::CasesFetched { ticket, result });
        Ok(())
    }

    pub fn create(api: &ApiClient<'_>, ticket: Ticket, draft: CaseDraft) -> Result<(), ApiError> {
        api.post(&ApiPath::Cases, &draft)?
            .send(move |result| Event::CaseCreated {
                ticket,
                submitted: draft,
                result,
            });
        Ok(())
    }

    pub fn update(api: &ApiClient<'_>, ticket: Ticket, draft: EditDraft) -> Result<(), ApiError> {
        let body = UpdateBody {
            id: &draft.id,
            title: &draft.title,
            content: &draft.content,
        };
        let request = api.put(&ApiPath::Case(draft.id.clone()), &body)?;
        request.send(move |result| Event::CaseUpdated {
            ticket,
            submitted: draft,
            result,
        });
        Ok(())
    }

    pub fn remove(api: &ApiClient<'_>, ticket: Ticket, id: CaseId) -> Result<(), ApiError> {
        api.delete(&ApiPath::Case(id.clone()))?
            .send(move |result| Event::CaseDeleted { ticket, id, result });
        Ok(())
    }

    // ===== Acknowledgments =====

    /// Replaces the whole list with the server's, in server order.
    #[instrument(skip_all)]
    pub fn on_refreshed(&mut self, body: &[u8]) -> Result<usize, FetchError> {
        let cases: Vec<Case> = serde_json::from_slice(body)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        debug!(count = cases.len(), "case list replaced");
        self.cases = cases;
        Ok(self.cases.len())
    }

    /// Appends the case the server created.
    #[instrument(skip_all)]
    pub fn on_created(&mut self, body: &[u8]) -> Result<Case, MutationError> {
        let case: Case = serde_json::from_slice(body)
            .map_err(|e| MutationError::Malformed(e.to_string()))?;
        debug!(id = %case.id, "case created");
        self.cases.push(case.clone());
        Ok(case)
    }

    /// Applies an acknowledged update of `submitted.id`.
    ///
    /// The server's copy wins. A 2xx with an empty body acknowledges the
    /// submitted values as sent. A returned case with a different id is
    /// rejected and the list is left alone.
    #[instrument(skip_all, fields(id = %submitted.id))]
    pub fn on_updated(
        &mut self,
        submitted: &EditDraft,
        body: &[u8],
    ) -> Result<Case, MutationError> {
        let case = if body.iter().all(u8::is_ascii_whitespace) {
            Case {
                id: submitted.id.clone(),
                title: submitted.title.clone(),
                content: submitted.content.clone(),
            }
        } else {
            serde_json::from_slice::<Case>(body)
                .map_err(|e| MutationError::Malformed(e.to_string()))?
        };

        if case.id != submitted.id {
            warn!(returned = %case.id, "update acknowledged a different case");
            return Err(MutationError::Malformed(format!(
                "update of {} returned case {}",
                submitted.id, case.id
            )));
        }

        self.upsert(case.clone());
        Ok(case)
    }

    /// Drops `id` from the list. Absent ids are already in the desired state.
    #[instrument(skip_all, fields(id = %id))]
    pub fn on_removed(&mut self, id: &CaseId) -> bool {
        let before = self.cases.len();
        self.cases.retain(|c| &c.id != id);
        let existed = self.cases.len() != before;
        debug!(existed, "case removed");
        existed
    }

    fn upsert(&mut self, case: Case) {
        match self.cases.iter_mut().find(|c| c.id == case.id) {
            Some(slot) => *slot = case,
            None => {
                debug!(id = %case.id, "updated case not in local list, appending");
                self.cases.push(case);
            }
        }
    }
}
