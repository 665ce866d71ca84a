//! Lead service: lead intake, credit-gated unlocks, and proposals.

use std::sync::Arc;

use chrono::Utc;

use crate::config::LedgerPolicy;
use crate::domain::{
    Collections, EventBus, Lead, LeadId, LeadView, LedgerEvent, Proposal, ProposalId,
    ProposalStatus, UserId,
};
use crate::error::LedgerError;

/// Fields accepted at lead intake.
#[derive(Debug, Clone)]
pub struct NewLead {
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
}

/// Orchestration for leads and proposals.
#[derive(Debug, Clone)]
pub struct LeadService {
    collections: Arc<Collections>,
    event_bus: EventBus,
    policy: Arc<LedgerPolicy>,
}

impl LeadService {
    /// Creates a new `LeadService`.
    #[must_use]
    pub fn new(collections: Arc<Collections>, event_bus: EventBus, policy: Arc<LedgerPolicy>) -> Self {
        Self {
            collections,
            event_bus,
            policy,
        }
    }

    /// Stores a new lead.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] if name or company is blank,
    /// or if neither email nor phone is given.
    pub async fn create_lead(&self, new: NewLead) -> Result<Lead, LedgerError> {
        let clean = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let email = clean(new.email);
        let phone = clean(new.phone);
        if new.name.trim().is_empty() || new.company.trim().is_empty() {
            return Err(LedgerError::InvalidRequest(
                "lead name and company are required".to_string(),
            ));
        }
        if email.is_none() && phone.is_none() {
            return Err(LedgerError::InvalidRequest(
                "lead needs an email or a phone".to_string(),
            ));
        }

        let lead = Lead::new(
            new.name.trim().to_string(),
            new.company.trim().to_string(),
            new.segment.trim().to_string(),
            email,
            phone,
        );
        self.collections.leads.insert(lead.clone()).await?;
        tracing::info!(lead_id = %lead.id, segment = %lead.segment, "lead created");
        Ok(lead)
    }

    /// Lists every lead as `viewer` may see it, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the viewer does not exist.
    pub async fn leads_for(&self, viewer: UserId) -> Result<Vec<LeadView>, LedgerError> {
        if !self.collections.accounts.contains(viewer).await {
            return Err(LedgerError::UserNotFound(viewer));
        }
        let mut leads = self.collections.leads.snapshot().await;
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads.iter().map(|l| l.view_for(viewer)).collect())
    }

    /// Spends credits to reveal a lead's contact fields. Already-unlocked
    /// leads are returned without charge.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::LeadNotFound`], [`LedgerError::UserNotFound`],
    /// [`LedgerError::PermissionDenied`] without `can_access_leads`, and
    /// [`LedgerError::InsufficientCredits`].
    pub async fn unlock_lead(&self, user_id: UserId, lead_id: LeadId) -> Result<LeadView, LedgerError> {
        let lead_lock = self.collections.leads.get(lead_id).await?;
        let mut lead = lead_lock.write().await;

        let account_lock = self.collections.accounts.get(user_id).await?;
        let mut account = account_lock.write().await;
        if !account.permissions.can_access_leads {
            return Err(LedgerError::PermissionDenied(
                "lead access is disabled for this user".to_string(),
            ));
        }
        if lead.is_unlocked_by(user_id) {
            return Ok(lead.view_for(user_id));
        }

        let cost = self.policy.lead_unlock_cost;
        account.spend_credits(cost)?;
        let remaining = account.credits;
        drop(account);

        lead.unlocked_by.insert(user_id);
        let view = lead.view_for(user_id);
        drop(lead);

        let _ = self.event_bus.publish(LedgerEvent::LeadUnlocked {
            user_id,
            lead_id,
            credits: cost,
            timestamp: Utc::now(),
        });
        tracing::info!(%user_id, %lead_id, cost, remaining, "lead unlocked");
        Ok(view)
    }

    /// Writes an open proposal against a lead the author has unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a blank title or a
    /// non-positive amount, [`LedgerError::UserNotFound`],
    /// [`LedgerError::LeadNotFound`], and [`LedgerError::PermissionDenied`]
    /// if the lead is still locked for the author.
    pub async fn create_proposal(
        &self,
        user_id: UserId,
        lead_id: LeadId,
        title: String,
        amount_cents: i64,
    ) -> Result<Proposal, LedgerError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(LedgerError::InvalidRequest("title must not be empty".to_string()));
        }
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidRequest("amount must be positive".to_string()));
        }
        if !self.collections.accounts.contains(user_id).await {
            return Err(LedgerError::UserNotFound(user_id));
        }
        let lead = self.collections.leads.read(lead_id).await?;
        if !lead.is_unlocked_by(user_id) {
            return Err(LedgerError::PermissionDenied(format!(
                "lead {lead_id} is not unlocked"
            )));
        }

        let proposal = Proposal::new(user_id, lead_id, title, amount_cents);
        self.collections.proposals.insert(proposal.clone()).await?;
        tracing::info!(%user_id, %lead_id, proposal_id = %proposal.id, amount_cents, "proposal created");
        Ok(proposal)
    }

    /// Returns a user's proposals, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the user does not exist.
    pub async fn proposals_for(&self, user_id: UserId) -> Result<Vec<Proposal>, LedgerError> {
        if !self.collections.accounts.contains(user_id).await {
            return Err(LedgerError::UserNotFound(user_id));
        }
        let mut list = self
            .collections
            .proposals
            .filter(|p| p.user_id == user_id)
            .await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Accepts or declines an open proposal on behalf of its author.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ProposalNotFound`],
    /// [`LedgerError::PermissionDenied`] if `user_id` is not the author, and
    /// [`LedgerError::InvalidTransition`] unless the proposal is open.
    pub async fn close_proposal(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
        status: ProposalStatus,
    ) -> Result<Proposal, LedgerError> {
        let lock = self.collections.proposals.get(proposal_id).await?;
        let mut proposal = lock.write().await;
        if proposal.user_id != user_id {
            return Err(LedgerError::PermissionDenied(format!(
                "proposal {proposal_id} belongs to another user"
            )));
        }
        proposal.close(status)?;
        let snapshot = proposal.clone();
        drop(proposal);

        let _ = self.event_bus.publish(LedgerEvent::ProposalClosed {
            user_id,
            proposal_id,
            status,
            timestamp: snapshot.updated_at,
        });
        Ok(snapshot)
    }
}
