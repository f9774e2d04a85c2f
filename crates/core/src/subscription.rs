// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use crate::state::{Authority, SubscriptionTransition, subscription_snapshot};
use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use leadhub_domain::{
    DomainError, Subscription, SubscriptionPlan, SubscriptionStatus, ensure_can_purchase,
};
use time::OffsetDateTime;

/// A request to start a subscription for a vendor.
#[derive(Debug, Clone, Copy)]
pub struct Purchase<'a> {
    pub vendor_id: i64,
    pub plan: &'a SubscriptionPlan,
    /// The vendor's most recent subscription, if any.
    pub current: Option<&'a Subscription>,
    pub payment_reference: Option<&'a str>,
}

/// Starts a subscription. Vendors buy for themselves; admins may grant a
/// plan to any vendor.
///
/// # Errors
///
/// Returns an error if a vendor buys for someone else, the plan cannot be
/// purchased, or the vendor still has an active subscription.
pub fn purchase_subscription(
    purchase: Purchase<'_>,
    authority: Authority,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubscriptionTransition, CoreError> {
    if let Some(own) = authority.vendor_id()
        && own != purchase.vendor_id
    {
        return Err(CoreError::forbidden(
            "purchase subscription",
            "vendors can only purchase for themselves",
        ));
    }

    ensure_can_purchase(purchase.vendor_id, purchase.current, now)?;
    let subscription: Subscription = Subscription::start(
        purchase.vendor_id,
        purchase.plan,
        purchase.payment_reference.map(ToString::to_string),
        now,
    )?;

    let verb: &str = if authority.is_admin() {
        "Granted"
    } else {
        "Purchased"
    };
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(
            String::from("PurchaseSubscription"),
            Some(format!(
                "{verb} plan '{}' ({} leads) for vendor {}",
                purchase.plan.name, purchase.plan.lead_quota, purchase.vendor_id
            )),
        ),
        purchase.current.map_or_else(
            || StateSnapshot::new(String::from("none")),
            |current| subscription_snapshot(current, now),
        ),
        subscription_snapshot(&subscription, now),
        AuditSubject::Vendor(purchase.vendor_id),
    );

    Ok(SubscriptionTransition {
        subscription,
        audit_event,
    })
}

/// Cancels a subscription. Remaining quota is forfeited.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the subscription is
/// already cancelled.
pub fn cancel_subscription(
    subscription: &Subscription,
    authority: Authority,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubscriptionTransition, CoreError> {
    if !authority.is_admin() {
        return Err(CoreError::forbidden(
            "cancel subscription",
            "administrator role required",
        ));
    }
    if subscription.status == SubscriptionStatus::Cancelled {
        return Err(DomainError::InvalidSubscriptionStatus(String::from(
            "subscription is already cancelled",
        ))
        .into());
    }

    let mut next: Subscription = subscription.clone();
    next.status = SubscriptionStatus::Cancelled;
    let subscription_id: i64 = subscription.subscription_id.unwrap_or_default();

    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(
            String::from("CancelSubscription"),
            Some(format!(
                "Cancelled subscription {subscription_id} with {} leads unused",
                subscription.remaining()
            )),
        ),
        subscription_snapshot(subscription, now),
        subscription_snapshot(&next, now),
        AuditSubject::Subscription(subscription_id),
    );

    Ok(SubscriptionTransition {
        subscription: next,
        audit_event,
    })
}
