//! Sales leads and proposals.
//!
//! A lead's contact details are hidden until a user spends credits to
//! unlock it. Proposals may only be written against unlocked leads.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LeadId, ProposalId, UserId};
use crate::error::LedgerError;

/// Placeholder shown instead of locked contact fields.
pub const MASKED: &str = "***";

/// A prospect record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Lead identifier.
    pub id: LeadId,
    /// Contact person.
    pub name: String,
    /// Company name.
    pub company: String,
    /// Market segment.
    pub segment: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Users who paid to see the contact fields.
    pub unlocked_by: BTreeSet<UserId>,
    /// Intake timestamp.
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a lead nobody has unlocked yet.
    #[must_use]
    pub fn new(
        name: String,
        company: String,
        segment: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: LeadId::new(),
            name,
            company,
            segment,
            email,
            phone,
            unlocked_by: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if `user` has unlocked this lead.
    #[must_use]
    pub fn is_unlocked_by(&self, user: UserId) -> bool {
        self.unlocked_by.contains(&user)
    }

    /// Renders the lead as `viewer` may see it.
    #[must_use]
    pub fn view_for(&self, viewer: UserId) -> LeadView {
        let unlocked = self.is_unlocked_by(viewer);
        let mask = |field: &Option<String>| {
            if unlocked {
                field.clone()
            } else {
                field.as_ref().map(|_| MASKED.to_string())
            }
        };
        LeadView {
            id: self.id,
            name: self.name.clone(),
            company: self.company.clone(),
            segment: self.segment.clone(),
            email: mask(&self.email),
            phone: mask(&self.phone),
            unlocked,
            created_at: self.created_at,
        }
    }
}

/// Lead as returned to a particular user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadView {
    /// Lead identifier.
    pub id: LeadId,
    /// Contact person.
    pub name: String,
    /// Company name.
    pub company: String,
    /// Market segment.
    pub segment: String,
    /// Contact email, masked while locked.
    pub email: Option<String>,
    /// Contact phone, masked while locked.
    pub phone: Option<String>,
    /// Whether the viewer has unlocked the contact fields.
    pub unlocked: bool,
    /// Intake timestamp.
    pub created_at: DateTime<Utc>,
}

/// Proposal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Sent, awaiting an answer.
    Open,
    /// Accepted by the lead.
    Accepted,
    /// Declined by the lead.
    Declined,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        })
    }
}

/// A commercial proposal sent to a lead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Proposal {
    /// Proposal identifier.
    pub id: ProposalId,
    /// Author.
    pub user_id: UserId,
    /// Lead the proposal is addressed to.
    pub lead_id: LeadId,
    /// Short title.
    pub title: String,
    /// Proposed value in cents.
    pub amount_cents: i64,
    /// Current status.
    pub status: ProposalStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// Creates an open proposal.
    #[must_use]
    pub fn new(user_id: UserId, lead_id: LeadId, title: String, amount_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: ProposalId::new(),
            user_id,
            lead_id,
            title,
            amount_cents,
            status: ProposalStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Closes an open proposal.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidTransition`] unless the proposal is
    /// open and `next` is a closing status.
    pub fn close(&mut self, next: ProposalStatus) -> Result<(), LedgerError> {
        if self.status != ProposalStatus::Open || next == ProposalStatus::Open {
            return Err(LedgerError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead() -> Lead {
        Lead::new(
            "Carlos".to_string(),
            "Padaria Central".to_string(),
            "food".to_string(),
            Some("carlos@padaria.com".to_string()),
            None,
        )
    }

    #[test]
    fn locked_view_masks_contact() {
        let lead = lead();
        let view = lead.view_for(UserId::new());
        assert!(!view.unlocked);
        assert_eq!(view.email.as_deref(), Some(MASKED));
        assert_eq!(view.phone, None);
        assert_eq!(view.company, "Padaria Central");
    }

    #[test]
    fn unlocked_view_shows_contact_only_to_that_user() {
        let mut lead = lead();
        let buyer = UserId::new();
        lead.unlocked_by.insert(buyer);
        assert_eq!(
            lead.view_for(buyer).email.as_deref(),
            Some("carlos@padaria.com")
        );
        assert_eq!(lead.view_for(UserId::new()).email.as_deref(), Some(MASKED));
    }

    #[test]
    fn proposals_close_once() {
        let mut p = Proposal::new(UserId::new(), LeadId::new(), "Site".to_string(), 150_000);
        assert!(p.close(ProposalStatus::Open).is_err());
        assert!(p.close(ProposalStatus::Accepted).is_ok());
        assert!(p.close(ProposalStatus::Declined).is_err());
        assert_eq!(p.status, ProposalStatus::Accepted);
    }
}
