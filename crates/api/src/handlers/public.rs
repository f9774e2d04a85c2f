// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Handlers that need no login.

use leadhub::lead_snapshot;
use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause};
use leadhub_domain::{Lead, LeadSource, NewLead};
use leadhub_persistence::SqlitePersistence;
use time::OffsetDateTime;
use tracing::info;

use super::{parse_optional_date, snapshot};
use crate::error::ApiError;
use crate::request_response::{ListPlansResponse, PlanInfo, SubmitLeadRequest, SubmitLeadResponse};

/// Accepts a lead from the public form. New leads wait in `pending` for an
/// admin to publish or assign them.
///
/// # Errors
///
/// Returns an error if any field fails validation.
pub fn submit_lead(
    persistence: &mut SqlitePersistence,
    request: &SubmitLeadRequest,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubmitLeadResponse, ApiError> {
    let input: NewLead = NewLead {
        customer_name: request.customer_name.clone(),
        customer_email: request.customer_email.clone(),
        customer_phone: request.customer_phone.clone(),
        category: request.category.clone(),
        location: request.location.clone(),
        description: request.description.clone(),
        budget_cents: request.budget_cents,
        preferred_date: parse_optional_date("preferred_date", request.preferred_date.as_deref())?,
    };
    let lead: Lead = Lead::submit(&input, LeadSource::Web, now)?;

    let event: AuditEvent = AuditEvent::new(
        Actor::customer(),
        cause,
        Action::new(
            String::from("SubmitLead"),
            Some(format!(
                "Customer submitted a '{}' lead in {}",
                lead.category, lead.location
            )),
        ),
        snapshot("none"),
        lead_snapshot(&lead),
        AuditSubject::Lead(0),
    );
    let (lead_id, _event_id) = persistence.insert_lead(&lead, &event, None)?;

    info!(lead_id, category = %lead.category, "Lead submitted");
    Ok(SubmitLeadResponse {
        lead_id,
        status: lead.status.as_str().to_string(),
        message: String::from("Thank you, your request has been received"),
    })
}

/// Plans a vendor can buy, cheapest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_public_plans(
    persistence: &mut SqlitePersistence,
) -> Result<ListPlansResponse, ApiError> {
    let plans: Vec<PlanInfo> = persistence
        .list_plans(true)?
        .iter()
        .map(PlanInfo::from)
        .collect();
    Ok(ListPlansResponse { plans })
}
