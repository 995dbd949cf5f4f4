use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhookObject {
    pub customer: Option<String>,
    pub billing_reason: Option<String>,
    pub subscription: Option<String>,
    pub price_id: Option<String>,
    pub tier: Option<String>,
    /// Flexion's own user id, carried through checkout session metadata.
    pub client_reference_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    ActivateSubscription { user_id: String, tier: String },
    SubscriptionRefill { user_id: String, tier: String },
    TierSyncOnly { user_id: String, tier: String },
    GrantStarterPack { user_id: String },
    DeactivateSubscription { user_id: String },
    Ignored,
}

/// Dispatch table from spec.md 4.8: `(event_type, billing_reason)` decides
/// what downstream wallet/tier mutation runs, if any.
pub fn classify(event: &WebhookEvent) -> Disposition {
    let obj = &event.data.object;
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let Some(user_id) = obj.client_reference_id.clone() else {
                return Disposition::Ignored;
            };
            if obj.subscription.is_some() {
                Disposition::ActivateSubscription { user_id, tier: obj.tier.clone().unwrap_or_else(|| "scout".to_string()) }
            } else {
                Disposition::GrantStarterPack { user_id }
            }
        }
        "invoice.paid" => {
            let Some(user_id) = obj.client_reference_id.clone() else {
                return Disposition::Ignored;
            };
            let tier = obj.tier.clone().unwrap_or_else(|| "scout".to_string());
            match obj.billing_reason.as_deref() {
                Some("subscription_create") | Some("subscription_cycle") => Disposition::SubscriptionRefill { user_id, tier },
                Some("subscription_update") => Disposition::TierSyncOnly { user_id, tier },
                _ => Disposition::Ignored,
            }
        }
        "customer.subscription.deleted" => obj
            .client_reference_id
            .clone()
            .map(|user_id| Disposition::DeactivateSubscription { user_id })
            .unwrap_or(Disposition::Ignored),
        _ => Disposition::Ignored,
    }
}
