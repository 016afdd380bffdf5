//! Admission control for backend requests.
//!
//! Every request is admitted against the resource it touches before it is
//! sent, and carries a [`Ticket`] back in its completion event. A completion
//! whose ticket is no longer the pending one for its resource is stale and
//! must be dropped without touching the model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::model::CaseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Login,
    Register,
    Refresh,
    Create,
    Update,
    Delete,
}

impl OpKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Refresh => "refresh",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKey {
    Session,
    CaseList,
    NewCase,
    Case(CaseId),
}

/// Identifies one admitted request: the session epoch it was issued in and
/// a sequence number unique within the guard's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub epoch: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(Ticket),
    /// Admitted; the named earlier request will be ignored when it completes.
    Superseded { ticket: Ticket, previous: OpKind },
    Rejected { in_flight: OpKind },
}

impl Admission {
    #[must_use]
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::Admitted(ticket) | Self::Superseded { ticket, .. } => Some(*ticket),
            Self::Rejected { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    kind: OpKind,
    ticket: Ticket,
}

/// At most one pending request per resource.
#[derive(Debug, Default)]
pub struct InFlight {
    epoch: u64,
    next_seq: u64,
    pending: HashMap<ResourceKey, Pending>,
}

impl InFlight {
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Decides whether `kind` may start against `resource`.
    ///
    /// - sign-in, create: a duplicate is rejected
    /// - refresh: the newer one wins
    /// - update: rejected while an update or delete of the case is pending
    /// - delete: rejected while a delete is pending, supersedes an update
    pub fn admit(&mut self, kind: OpKind, resource: ResourceKey) -> Admission {
        let current = self.pending.get(&resource).map(|p| p.kind);

        let superseded = match (kind, current) {
            (_, None) => None,
            (OpKind::Refresh, Some(OpKind::Refresh)) | (OpKind::Delete, Some(OpKind::Update)) => {
                current
            }
            (_, Some(in_flight)) => return Admission::Rejected { in_flight },
        };

        let ticket = self.issue();
        self.pending.insert(resource, Pending { kind, ticket });

        match superseded {
            Some(previous) => Admission::Superseded { ticket, previous },
            None => Admission::Admitted(ticket),
        }
    }

    /// Releases `resource` if `ticket` is still the pending request of
    /// `kind` for it. Returns false for a stale completion.
    pub fn complete(&mut self, kind: OpKind, resource: &ResourceKey, ticket: Ticket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        match self.pending.get(resource) {
            Some(p) if p.kind == kind && p.ticket == ticket => {
                self.pending.remove(resource);
                true
            }
            _ => false,
        }
    }

    /// Releases a request that was admitted but never reached the shell.
    pub fn abandon(&mut self, resource: &ResourceKey, ticket: Ticket) {
        if self.pending.get(resource).is_some_and(|p| p.ticket == ticket) {
            self.pending.remove(resource);
        }
    }

    #[must_use]
    pub fn pending_kind(&self, resource: &ResourceKey) -> Option<OpKind> {
        self.pending.get(resource).map(|p| p.kind)
    }

    #[must_use]
    pub fn is_pending(&self, kind: OpKind, resource: &ResourceKey) -> bool {
        self.pending_kind(resource) == Some(kind)
    }

    /// Starts a new session epoch. Everything pending becomes stale.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn issue(&mut self) -> Ticket {
        self.next_seq = self.next_seq.wrapping_add(1);
        Ticket {
            epoch: self.epoch,
            seq: self.next_seq,
        }
    }
}
