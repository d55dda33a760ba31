/// Body of a subscription creation request.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub plan_id: String,
    pub payment_method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_details: Option<BillingDetails>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
    pub address: Address,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Address {
    pub line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn new(line1: &str, city: &str, state: &str) -> Self {
        Self {
            line1: line1.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }
}

impl SubscriptionRequest {
    pub fn new(plan_id: &str, payment_method_id: &str, billing_details: BillingDetails) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            payment_method_id: payment_method_id.to_string(),
            billing_details: Some(billing_details),
        }
    }

    pub fn without_billing_details(plan_id: &str, payment_method_id: &str) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            payment_method_id: payment_method_id.to_string(),
            billing_details: None,
        }
    }

    pub fn with_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = plan_id.into();
        self
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl BillingDetails {
    pub fn new(name: &str, email: &str, address: Address) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            address,
        }
    }
}

/// A subscription as returned by the creation endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub status: String,
    pub plan_id: String,
    pub customer_id: String,
    pub current_period_end: String,
}
