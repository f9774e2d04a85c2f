// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{
    Authority, LeadContext, LeadTransition, QuotaEffect, StatusChange, lead_snapshot,
};
use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause};
use leadhub_domain::{
    DomainError, Lead, LeadStatus, REFUND_WINDOW_DAYS, Subscription, Vendor, validate_notes,
    validate_reason, validate_refund_reason,
};

/// Applies a command to a lead, producing the new lead, its history entry,
/// the audit event and any quota side effect.
///
/// # Arguments
///
/// * `lead` - The current lead (immutable)
/// * `command` - The command to apply
/// * `ctx` - The acting authority, the current time and, for `Take`,
///   `Reassign` and `RequestRefund`, the vendor or subscription involved
/// * `actor` - The actor recorded in the audit event
/// * `cause` - The cause recorded in the audit event
///
/// # Errors
///
/// Returns an error if:
/// - The authority may not issue the command for this lead
/// - The transition is not in the lifecycle table
/// - The lead is already owned by another vendor (`Conflict`)
/// - Any input or quota rule is violated
pub fn apply(
    lead: &Lead,
    command: Command,
    ctx: &LeadContext<'_>,
    actor: Actor,
    cause: Cause,
) -> Result<LeadTransition, CoreError> {
    let action_name: &'static str = command.name();
    let lead_id: i64 = lead.id_or_zero();

    let (new_lead, notes, quota, details) = match command {
        Command::Publish => publish(lead, ctx)?,
        Command::Assign { vendor_ids } => assign(lead, vendor_ids, ctx)?,
        Command::Take { vendor_id } => take(lead, vendor_id, ctx)?,
        Command::Advance { to, notes } => advance(lead, to, notes.as_deref(), ctx)?,
        Command::Cancel { reason } => cancel(lead, &reason, ctx)?,
        Command::Reassign { vendor_id } => reassign(lead, vendor_id, ctx)?,
        Command::RequestRefund { reason } => request_refund(lead, &reason, ctx)?,
        Command::ResolveRefund { approve, notes } => {
            resolve_refund(lead, approve, notes.as_deref(), ctx)?
        }
    };

    let status_change: StatusChange = StatusChange {
        lead_id,
        from_status: lead.status,
        to_status: new_lead.status,
        changed_by_operator_id: actor.operator_id,
        notes,
        changed_at: ctx.now,
    };

    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from(action_name), Some(details)),
        lead_snapshot(lead),
        lead_snapshot(&new_lead),
        AuditSubject::Lead(lead_id),
    );

    Ok(LeadTransition {
        new_lead,
        status_change,
        audit_event,
        quota,
    })
}

/// New lead, history notes, quota effect and audit details.
type Outcome = (Lead, Option<String>, QuotaEffect, String);

fn require_admin(ctx: &LeadContext<'_>, action: &str) -> Result<(), CoreError> {
    if ctx.authority.is_admin() {
        Ok(())
    } else {
        Err(CoreError::forbidden(action, "administrator role required"))
    }
}

fn require_owner_or_admin(
    lead: &Lead,
    ctx: &LeadContext<'_>,
    action: &str,
) -> Result<(), CoreError> {
    match ctx.authority {
        Authority::Admin { .. } | Authority::System => Ok(()),
        Authority::Vendor { vendor_id, .. } => {
            if lead.is_owned_by(vendor_id) {
                Ok(())
            } else {
                Err(CoreError::forbidden(
                    action,
                    DomainError::NotLeadOwner {
                        lead_id: lead.id_or_zero(),
                        vendor_id,
                    }
                    .to_string(),
                ))
            }
        }
    }
}

fn touched(lead: &Lead, ctx: &LeadContext<'_>) -> Lead {
    let mut next: Lead = lead.clone();
    next.updated_at = ctx.now;
    next
}

fn publish(lead: &Lead, ctx: &LeadContext<'_>) -> Result<Outcome, CoreError> {
    require_admin(ctx, "publish lead")?;
    lead.status.validate_transition(LeadStatus::Available)?;

    let mut next: Lead = touched(lead, ctx);
    next.status = LeadStatus::Available;
    next.assigned_vendor_ids.clear();

    let details: String = format!(
        "Published lead {} in category '{}'",
        lead.id_or_zero(),
        lead.category
    );
    Ok((next, None, QuotaEffect::None, details))
}

fn assign(
    lead: &Lead,
    mut vendor_ids: Vec<i64>,
    ctx: &LeadContext<'_>,
) -> Result<Outcome, CoreError> {
    require_admin(ctx, "assign lead")?;
    lead.status.validate_transition(LeadStatus::Assigned)?;

    vendor_ids.sort_unstable();
    vendor_ids.dedup();
    if vendor_ids.is_empty() {
        return Err(DomainError::EmptyAssignment.into());
    }

    let mut next: Lead = touched(lead, ctx);
    next.status = LeadStatus::Assigned;
    next.assigned_vendor_ids.clone_from(&vendor_ids);

    let list: Vec<String> = vendor_ids.iter().map(ToString::to_string).collect();
    let details: String = format!(
        "Assigned lead {} to vendors [{}]",
        lead.id_or_zero(),
        list.join(", ")
    );
    Ok((next, None, QuotaEffect::None, details))
}

fn take(lead: &Lead, vendor_id: i64, ctx: &LeadContext<'_>) -> Result<Outcome, CoreError> {
    if ctx.authority.vendor_id() != Some(vendor_id) {
        return Err(CoreError::forbidden(
            "take lead",
            "leads can only be taken by the vendor's own operators",
        ));
    }

    let lead_id: i64 = lead.id_or_zero();
    if let Some(owner) = lead.taken_by {
        return Err(CoreError::Conflict {
            message: format!("lead {lead_id} is already taken by vendor {owner}"),
        });
    }

    let vendor: &Vendor = ctx
        .vendor
        .filter(|v| v.vendor_id == Some(vendor_id))
        .ok_or(DomainError::VendorNotFound(vendor_id))?;
    lead.check_takeable_by(vendor)?;

    let subscription: &Subscription = ctx
        .subscription
        .filter(|s| s.vendor_id == vendor_id)
        .ok_or(DomainError::NoActiveSubscription { vendor_id })?;
    subscription.check_can_consume(ctx.now)?;
    let subscription_id: i64 = subscription
        .subscription_id
        .ok_or(DomainError::NoActiveSubscription { vendor_id })?;

    lead.status.validate_transition(LeadStatus::Taken)?;

    let mut next: Lead = touched(lead, ctx);
    next.status = LeadStatus::Taken;
    next.taken_by = Some(vendor_id);
    next.taken_at = Some(ctx.now);
    next.subscription_id = Some(subscription_id);

    let details: String = format!(
        "Vendor {vendor_id} took lead {lead_id} using subscription {subscription_id} ({} remaining before take)",
        subscription.remaining()
    );
    Ok((
        next,
        None,
        QuotaEffect::Consume { subscription_id },
        details,
    ))
}

fn advance(
    lead: &Lead,
    to: LeadStatus,
    notes: Option<&str>,
    ctx: &LeadContext<'_>,
) -> Result<Outcome, CoreError> {
    require_owner_or_admin(lead, ctx, "update lead status")?;

    let invalid = |reason: &str| -> CoreError {
        DomainError::InvalidStatusTransition {
            from: lead.status.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: reason.to_string(),
        }
        .into()
    };

    if !lead.status.is_owned() {
        return Err(invalid("lead has not been taken"));
    }
    match to {
        LeadStatus::RefundRequested => return Err(invalid("use a refund request")),
        LeadStatus::Refunded => return Err(invalid("refunds are resolved by an administrator")),
        _ => {}
    }
    if lead.status == LeadStatus::RefundRequested {
        return Err(invalid("a refund request is pending"));
    }
    lead.status.validate_transition(to)?;

    let notes: Option<String> = validate_notes(notes)?;
    let mut next: Lead = touched(lead, ctx);
    next.status = to;

    let details: String = format!(
        "Lead {} moved from '{}' to '{}'",
        lead.id_or_zero(),
        lead.status,
        to
    );
    Ok((next, notes, QuotaEffect::None, details))
}

fn cancel(lead: &Lead, reason: &str, ctx: &LeadContext<'_>) -> Result<Outcome, CoreError> {
    require_admin(ctx, "cancel lead")?;

    if lead.status.is_terminal() {
        lead.status.validate_transition(LeadStatus::Cancelled)?;
    }
    if lead.status == LeadStatus::RefundRequested {
        return Err(DomainError::InvalidStatusTransition {
            from: lead.status.as_str().to_string(),
            to: LeadStatus::Cancelled.as_str().to_string(),
            reason: String::from("resolve the pending refund first"),
        }
        .into());
    }

    let reason: String = validate_reason(reason)?;
    let mut next: Lead = touched(lead, ctx);
    next.status = LeadStatus::Cancelled;

    let details: String = format!("Cancelled lead {}: {reason}", lead.id_or_zero());
    Ok((next, Some(reason), QuotaEffect::None, details))
}

fn reassign(lead: &Lead, vendor_id: i64, ctx: &LeadContext<'_>) -> Result<Outcome, CoreError> {
    require_admin(ctx, "reassign lead")?;

    let lead_id: i64 = lead.id_or_zero();
    let Some(previous) = lead.taken_by else {
        return Err(DomainError::InvalidStatusTransition {
            from: lead.status.as_str().to_string(),
            to: lead.status.as_str().to_string(),
            reason: String::from("only taken leads can be reassigned"),
        }
        .into());
    };
    if lead.status.is_terminal() || lead.status == LeadStatus::RefundRequested {
        return Err(DomainError::InvalidStatusTransition {
            from: lead.status.as_str().to_string(),
            to: lead.status.as_str().to_string(),
            reason: String::from("lead can no longer be reassigned"),
        }
        .into());
    }

    let vendor: &Vendor = ctx
        .vendor
        .filter(|v| v.vendor_id == Some(vendor_id))
        .ok_or(DomainError::VendorNotFound(vendor_id))?;
    if !vendor.is_active {
        return Err(DomainError::VendorInactive(vendor_id).into());
    }
    if previous == vendor_id {
        return Err(DomainError::InvalidStatusTransition {
            from: lead.status.as_str().to_string(),
            to: lead.status.as_str().to_string(),
            reason: format!("lead {lead_id} is already owned by vendor {vendor_id}"),
        }
        .into());
    }

    // taken_at and subscription_id stay with the original take: the refund
    // window and the credit belong to the vendor who paid.
    let mut next: Lead = touched(lead, ctx);
    next.taken_by = Some(vendor_id);

    let details: String = format!("Reassigned lead {lead_id} from vendor {previous} to vendor {vendor_id}");
    Ok((next, Some(details.clone()), QuotaEffect::None, details))
}

fn request_refund(lead: &Lead, reason: &str, ctx: &LeadContext<'_>) -> Result<Outcome, CoreError> {
    let lead_id: i64 = lead.id_or_zero();
    let Some(vendor_id) = ctx.authority.vendor_id() else {
        return Err(CoreError::forbidden(
            "request refund",
            "refunds are requested by the owning vendor",
        ));
    };
    if !lead.is_owned_by(vendor_id) {
        return Err(CoreError::forbidden(
            "request refund",
            DomainError::NotLeadOwner { lead_id, vendor_id }.to_string(),
        ));
    }
    let paid_by: Option<i64> = lead.subscription_id.and_then(|subscription_id| {
        ctx.subscription
            .filter(|s| s.subscription_id == Some(subscription_id))
            .map(|s| s.vendor_id)
    });
    if paid_by != Some(vendor_id) {
        return Err(CoreError::forbidden(
            "request refund",
            format!("lead {lead_id} was not paid for by vendor {vendor_id}"),
        ));
    }

    if !lead.status.allows_refund_request() {
        return Err(DomainError::InvalidStatusTransition {
            from: lead.status.as_str().to_string(),
            to: LeadStatus::RefundRequested.as_str().to_string(),
            reason: String::from("refunds can only be requested for taken or contacted leads"),
        }
        .into());
    }
    if !lead.within_refund_window(ctx.now) {
        return Err(DomainError::RefundWindowExpired {
            lead_id,
            window_days: REFUND_WINDOW_DAYS,
        }
        .into());
    }
    let reason: String = validate_refund_reason(reason)?;
    lead.status.validate_transition(LeadStatus::RefundRequested)?;

    let mut next: Lead = touched(lead, ctx);
    next.status_before_refund = Some(lead.status);
    next.status = LeadStatus::RefundRequested;
    next.refund_reason = Some(reason.clone());

    let details: String = format!("Vendor {vendor_id} requested a refund for lead {lead_id}");
    Ok((next, Some(reason), QuotaEffect::None, details))
}

fn resolve_refund(
    lead: &Lead,
    approve: bool,
    notes: Option<&str>,
    ctx: &LeadContext<'_>,
) -> Result<Outcome, CoreError> {
    require_admin(ctx, "resolve refund")?;

    let lead_id: i64 = lead.id_or_zero();
    if lead.status != LeadStatus::RefundRequested {
        return Err(DomainError::NoRefundPending { lead_id }.into());
    }
    let notes: Option<String> = validate_notes(notes)?;

    let mut next: Lead = touched(lead, ctx);
    if approve {
        lead.status
            .validate_refund_resolution(LeadStatus::Refunded, lead.status_before_refund)?;
        next.status = LeadStatus::Refunded;
        let quota: QuotaEffect = lead
            .subscription_id
            .map_or(QuotaEffect::None, |subscription_id| QuotaEffect::Credit {
                subscription_id,
            });
        let details: String = format!("Approved refund for lead {lead_id}");
        Ok((next, notes, quota, details))
    } else {
        let restored: LeadStatus = lead.status_before_refund.unwrap_or(LeadStatus::Taken);
        lead.status
            .validate_refund_resolution(restored, Some(restored))?;
        next.status = restored;
        next.status_before_refund = None;
        next.refund_reason = None;
        let details: String = format!(
            "Denied refund for lead {lead_id}; restored '{restored}'"
        );
        Ok((next, notes, QuotaEffect::None, details))
    }
}
