// Stateful stand-in for the auth/subscription API, built on `wiremock`.
// Shared with the `spawn_mock_api` binary through `include!`.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use workflow_harness::domain::{Product, ProductListing, Subscription};
use workflow_harness::endpoints::{
    LOGIN_PATH, MESSAGE_AUTHORIZATION_REQUIRED, MESSAGE_EMAIL_AND_PASSWORD_REQUIRED,
    MESSAGE_INVALID_CREDENTIALS, PRODUCTS_PATH, REGISTER_PATH, ROOT_PATH,
    SUBSCRIPTION_STATUS_ACTIVE, SUBSCRIPTIONS_PATH, TOKEN_TYPE_BEARER,
};

/// The status codes the mock answers with where deployments are known to differ.
#[derive(Debug, Clone)]
pub struct MockFlavor {
    pub login_status: u16,
    pub listing_status: u16,
    pub unauthorized_status: u16,
    pub validates_plans: bool,
    /// Serve product ids as numbers instead of strings.
    pub numeric_product_ids: bool,
}

impl MockFlavor {
    pub fn lenient() -> Self {
        Self {
            login_status: 201,
            listing_status: 201,
            unauthorized_status: 200,
            validates_plans: true,
            numeric_product_ids: false,
        }
    }

    pub fn strict() -> Self {
        Self {
            login_status: 200,
            listing_status: 200,
            unauthorized_status: 401,
            validates_plans: true,
            numeric_product_ids: false,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lenient" => Some(Self::lenient()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, StoredUser>,
    /// Access token -> user id.
    tokens: HashMap<String, String>,
    subscriptions: Vec<Subscription>,
}

type SharedState = Arc<Mutex<State>>;

fn lock(state: &SharedState) -> MutexGuard<'_, State> {
    // Keep serving after a responder panicked while holding the lock.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn catalog() -> ProductListing {
    ProductListing {
        products: vec![
            Product {
                id: "prod_basic".into(),
                name: "Basic Plan".into(),
                price: 9.99,
                currency: "usd".into(),
                interval: "month".into(),
            },
            Product {
                id: "prod_premium".into(),
                name: "Premium Plan".into(),
                price: 29.99,
                currency: "usd".into(),
                interval: "month".into(),
            },
        ],
    }
}

fn message(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "message": message }))
}

fn non_empty_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

struct Register {
    state: SharedState,
}

impl Respond for Register {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap_or(Value::Null);
        let (Some(email), Some(password)) = (
            non_empty_str(&body, "email"),
            non_empty_str(&body, "password"),
        ) else {
            return message(400, MESSAGE_EMAIL_AND_PASSWORD_REQUIRED);
        };
        let user = StoredUser {
            id: Uuid::new_v4().to_string(),
            password: password.to_string(),
        };
        let id = user.id.clone();
        // Neither duplicates nor malformed addresses are rejected.
        lock(&self.state).users.insert(email.to_string(), user);

        ResponseTemplate::new(201).set_body_json(json!({
            "id": id,
            "email": email,
            "name": body.get("name").cloned().unwrap_or(Value::Null),
        }))
    }
}

struct Login {
    state: SharedState,
    status: u16,
}

impl Respond for Login {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap_or(Value::Null);
        let (Some(email), Some(password)) = (
            non_empty_str(&body, "email"),
            non_empty_str(&body, "password"),
        ) else {
            return message(400, MESSAGE_EMAIL_AND_PASSWORD_REQUIRED);
        };
        let mut state = lock(&self.state);
        let user_id = match state.users.get(email) {
            Some(user) if user.password == password => user.id.clone(),
            _ => return message(400, MESSAGE_INVALID_CREDENTIALS),
        };
        let token = Uuid::new_v4().to_string();
        state.tokens.insert(token.clone(), user_id);

        ResponseTemplate::new(self.status).set_body_json(json!({
            "access_token": token,
            "token_type": TOKEN_TYPE_BEARER,
        }))
    }
}

struct Subscribe {
    state: SharedState,
    flavor: MockFlavor,
}

impl Subscribe {
    fn user_id(&self, request: &Request) -> Option<String> {
        let header = request.headers.get("authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        lock(&self.state).tokens.get(token).cloned()
    }
}

impl Respond for Subscribe {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(user_id) = self.user_id(request) else {
            return message(self.flavor.unauthorized_status, MESSAGE_AUTHORIZATION_REQUIRED);
        };
        let body: Value = request.body_json().unwrap_or(Value::Null);
        let Some(plan_id) = non_empty_str(&body, "planId") else {
            return message(400, "Plan id required");
        };
        if self.flavor.validates_plans && !catalog().ids().contains(&plan_id) {
            return message(400, "Unknown plan");
        }
        if !body.get("billingDetails").is_some_and(Value::is_object) {
            return message(400, "Billing details required");
        }

        let subscription = Subscription {
            id: format!("sub_{}", Uuid::new_v4().simple()),
            status: SUBSCRIPTION_STATUS_ACTIVE.into(),
            plan_id: plan_id.to_string(),
            customer_id: format!("cus_{}", user_id),
            current_period_end: (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339(),
        };
        lock(&self.state).subscriptions.push(subscription.clone());
        ResponseTemplate::new(201).set_body_json(subscription)
    }
}

pub struct MockApi {
    pub server: MockServer,
    state: SharedState,
}

impl MockApi {
    pub async fn start(flavor: MockFlavor) -> Self {
        let server = MockServer::start().await;
        let state = SharedState::default();

        Mock::given(method("GET"))
            .and(path(ROOT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("Mock API is running"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(Register {
                state: state.clone(),
            })
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(Login {
                state: state.clone(),
                status: flavor.login_status,
            })
            .mount(&server)
            .await;
        let mut listing = serde_json::to_value(catalog()).unwrap_or(Value::Null);
        if flavor.numeric_product_ids {
            if let Some(products) = listing["products"].as_array_mut() {
                for (index, product) in products.iter_mut().enumerate() {
                    product["id"] = json!(index + 1);
                }
            }
        }
        Mock::given(method("GET"))
            .and(path(PRODUCTS_PATH))
            .respond_with(ResponseTemplate::new(flavor.listing_status).set_body_json(listing))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(SUBSCRIPTIONS_PATH))
            .respond_with(Subscribe {
                state: state.clone(),
                flavor,
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn address(&self) -> String {
        self.server.uri()
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    pub fn user_count(&self) -> usize {
        lock(&self.state).users.len()
    }

    pub fn subscription_count(&self) -> usize {
        lock(&self.state).subscriptions.len()
    }
}
