use super::{billing, list_products, log_in, subscribe, subscribe_with, subscribed, unauthorized};
use crate::client::{ApiRequest, Authorization};
use crate::configuration::PolicySettings;
use crate::domain::{EmailFactory, NewUser, SessionToken, SubscriptionRequest};
use crate::endpoints::{DEFAULT_PLAN_ID, PAYMENT_METHODS, REGISTER_PATH, SUBSCRIPTIONS_PATH};
use crate::expectation::{BodyCheck, Expectation, StatusExpectation};
use crate::workflow::{Context, Scenario, Step, TOKEN_KEY};

const GROUP: &str = "subscriptions";

const LOGGED_IN: &str = "registers and logs in the subscription test user";

fn test_request(emails: &EmailFactory, payment_method: &str) -> SubscriptionRequest {
    SubscriptionRequest::new(
        DEFAULT_PLAN_ID,
        payment_method,
        billing(
            "Test User",
            &emails.email("test@example.com"),
            "123 Test St",
            "Test City",
            "TS",
        ),
    )
}

pub fn scenarios(policy: &PolicySettings, emails: &EmailFactory) -> Vec<Scenario> {
    let user = NewUser::new(
        emails.email("subscription.test@example.com"),
        "SubTest123!",
        "Subscription Test User",
        "Subscription Test Co",
    );
    let valid_request = SubscriptionRequest::new(
        DEFAULT_PLAN_ID,
        "pm_card_visa",
        billing(
            &user.name,
            &user.email,
            "123 Business Ave",
            "Business City",
            "BC",
        ),
    );

    let mut every_payment_method =
        Scenario::new(GROUP, "accepts every payment method").depends_on(LOGGED_IN);
    for payment_method in PAYMENT_METHODS {
        let request = SubscriptionRequest::new(
            DEFAULT_PLAN_ID,
            payment_method,
            billing(
                &format!("Test User {}", payment_method),
                &emails.email(&format!("test.{}@example.com", payment_method)),
                "123 Test St",
                "Test City",
                "TS",
            ),
        );
        every_payment_method = every_payment_method.step(subscribe(
            &format!("subscribe with {}", payment_method),
            request,
            TOKEN_KEY,
            subscribed(None),
        ));
    }

    vec![
        // The registration result is not checked: the user may exist from an earlier run.
        Scenario::new(GROUP, LOGGED_IN)
            .step(Step::fixed(
                "register subscription user",
                ApiRequest::post(REGISTER_PATH, user.registration_body()),
                Expectation::status(StatusExpectation::Any),
            ))
            .step(log_in("log in", &user.credentials(), policy, TOKEN_KEY)),
        Scenario::new(GROUP, "lists products with billing fields")
            .step(list_products("list products", policy, true)),
        Scenario::new(GROUP, "rejects a subscription without authorization").step(subscribe_with(
            "subscribe without authorization",
            &test_request(emails, "pm_card_visa"),
            Authorization::None,
            unauthorized(policy),
        )),
        Scenario::new(GROUP, "creates a subscription with valid data")
            .depends_on(LOGGED_IN)
            .step(subscribe(
                "subscribe",
                valid_request,
                TOKEN_KEY,
                subscribed(Some(DEFAULT_PLAN_ID))
                    .check(BodyCheck::has_key("/customerId"))
                    .check(BodyCheck::has_key("/currentPeriodEnd")),
            )),
        Scenario::new(GROUP, "rejects an unknown plan id")
            .depends_on(LOGGED_IN)
            .step(subscribe(
                "subscribe to unknown plan",
                test_request(emails, "pm_card_visa").with_plan("nonexistent_plan"),
                TOKEN_KEY,
                Expectation::status(StatusExpectation::AtLeast(400)),
            )),
        Scenario::new(GROUP, "rejects a subscription without billing details")
            .depends_on(LOGGED_IN)
            .step(subscribe(
                "subscribe without billing details",
                SubscriptionRequest::without_billing_details(DEFAULT_PLAN_ID, "pm_card_visa"),
                TOKEN_KEY,
                Expectation::status(StatusExpectation::AtLeast(400)),
            )),
        every_payment_method,
        Scenario::new(GROUP, "rejects an invalid token").step(subscribe_with(
            "subscribe with invalid token",
            &test_request(emails, "pm_card_visa"),
            Authorization::Bearer(SessionToken::new("invalid-token-here".into())),
            unauthorized(policy),
        )),
        Scenario::new(GROUP, "rejects an authorization header without the bearer prefix")
            .depends_on(LOGGED_IN)
            .step(without_prefix(test_request(emails, "pm_card_visa"), policy)),
    ]
}

/// Sends the captured token as the whole header value.
fn without_prefix(request: SubscriptionRequest, policy: &PolicySettings) -> Step {
    Step::new(
        "subscribe with malformed authorization header",
        move |context: &Context| {
            let token = context.require_secret(TOKEN_KEY)?;
            Ok(ApiRequest::post(SUBSCRIPTIONS_PATH, request.body())
                .with_authorization(Authorization::Raw(token)))
        },
        unauthorized(policy),
    )
}
