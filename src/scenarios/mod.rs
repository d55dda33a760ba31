//! The declared scenario suite and the step builders it is made of

mod api_workflow;
mod authentication;
mod properties;
mod subscriptions;

use crate::client::{ApiRequest, Authorization};
use crate::configuration::PolicySettings;
use crate::domain::{
    Address, BillingDetails, Credentials, EmailFactory, NewUser, SubscriptionRequest,
};
use crate::endpoints::{
    LOGIN_PATH, MESSAGE_AUTHORIZATION_REQUIRED, MESSAGE_INVALID_CREDENTIALS, PRODUCTS_PATH,
    REGISTER_PATH, SUBSCRIPTION_STATUS_ACTIVE, SUBSCRIPTIONS_PATH, TOKEN_TYPE_BEARER,
};
use crate::expectation::{BodyCheck, Expectation, StatusExpectation};
use crate::workflow::{Capture, Context, Scenario, Step};

/// Every scenario, in the order it runs.
pub fn default_suite(policy: &PolicySettings, emails: &EmailFactory) -> Vec<Scenario> {
    let mut suite = authentication::scenarios(policy, emails);
    suite.extend(subscriptions::scenarios(policy, emails));
    suite.extend(api_workflow::scenarios(policy, emails));
    suite.extend(properties::scenarios(policy, emails));
    suite
}

fn register(name: &str, user: &NewUser) -> Step {
    Step::fixed(
        name,
        ApiRequest::post(REGISTER_PATH, user.registration_body()),
        registered(user),
    )
}

fn registered(user: &NewUser) -> Expectation {
    Expectation::status(StatusExpectation::Exactly(201))
        .check(BodyCheck::has_key("/id"))
        .check(BodyCheck::equals("/email", user.email.clone()))
        .check(BodyCheck::equals("/name", user.name.clone()))
        .check(BodyCheck::lacks_key("/password"))
}

/// Login whose token is captured under `key`.
fn log_in(name: &str, credentials: &Credentials, policy: &PolicySettings, key: &str) -> Step {
    Step::fixed(
        name,
        ApiRequest::post(LOGIN_PATH, credentials.login_body()),
        logged_in(policy),
    )
    .capture(Capture::secret(key, "/access_token"))
}

fn logged_in(policy: &PolicySettings) -> Expectation {
    Expectation::status(policy.login_success())
        .check(BodyCheck::is_string("/access_token"))
        .check(BodyCheck::equals("/token_type", TOKEN_TYPE_BEARER))
}

fn attempt_login(name: &str, credentials: &Credentials, expectation: Expectation) -> Step {
    Step::fixed(
        name,
        ApiRequest::post(LOGIN_PATH, credentials.login_body()),
        expectation,
    )
}

fn rejected(status: u16, message: &str) -> Expectation {
    Expectation::status(StatusExpectation::Exactly(status))
        .check(BodyCheck::equals("/message", message))
}

fn invalid_credentials() -> Expectation {
    rejected(400, MESSAGE_INVALID_CREDENTIALS).check(BodyCheck::lacks_key("/access_token"))
}

/// `detailed` also requires `currency` and `interval` when the policy asks for them.
fn list_products(name: &str, policy: &PolicySettings, detailed: bool) -> Step {
    let mut keys = vec!["id", "name", "price"];
    if detailed && policy.require_product_billing_fields {
        keys.extend(["currency", "interval"]);
    }
    Step::fixed(
        name,
        ApiRequest::get(PRODUCTS_PATH),
        Expectation::status(policy.listing())
            .check(BodyCheck::non_empty_array("/products"))
            .check(BodyCheck::each_item_has_keys("/products", &keys)),
    )
}

fn unauthorized(policy: &PolicySettings) -> Expectation {
    Expectation::status(policy.unauthorized())
        .check(BodyCheck::equals("/message", MESSAGE_AUTHORIZATION_REQUIRED))
        .check(BodyCheck::lacks_key("/id"))
}

fn subscribed(plan_id: Option<&str>) -> Expectation {
    let expectation = Expectation::status(StatusExpectation::Exactly(201))
        .check(BodyCheck::has_key("/id"))
        .check(BodyCheck::equals("/status", SUBSCRIPTION_STATUS_ACTIVE));
    match plan_id {
        Some(plan_id) => expectation.check(BodyCheck::equals("/planId", plan_id)),
        None => expectation,
    }
}

/// Subscription call carrying the bearer token captured under `token_key`.
fn subscribe(
    name: &str,
    request: SubscriptionRequest,
    token_key: &str,
    expectation: Expectation,
) -> Step {
    let token_key = token_key.to_string();
    Step::new(
        name,
        move |context: &Context| {
            let token = context.session_token(&token_key)?;
            Ok(ApiRequest::post(SUBSCRIPTIONS_PATH, request.body())
                .with_authorization(Authorization::Bearer(token)))
        },
        expectation,
    )
}

fn subscribe_with(
    name: &str,
    request: &SubscriptionRequest,
    authorization: Authorization,
    expectation: Expectation,
) -> Step {
    Step::fixed(
        name,
        ApiRequest::post(SUBSCRIPTIONS_PATH, request.body()).with_authorization(authorization),
        expectation,
    )
}

fn billing(name: &str, email: &str, line1: &str, city: &str, state: &str) -> BillingDetails {
    BillingDetails::new(name, email, Address::new(line1, city, state))
}
