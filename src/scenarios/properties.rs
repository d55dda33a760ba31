use super::{
    attempt_login, billing, invalid_credentials, list_products, log_in, register, subscribe,
    subscribe_with, subscribed, unauthorized,
};
use crate::client::{ApiRequest, Authorization};
use crate::configuration::PolicySettings;
use crate::domain::{Credentials, EmailFactory, NewUser, SessionToken, SubscriptionRequest};
use crate::endpoints::{DEFAULT_PLAN_ID, SUBSCRIPTIONS_PATH};
use crate::expectation::BodyCheck;
use crate::workflow::{Capture, Context, Scenario, Step, TOKEN_KEY};
use secrecy::Secret;
use uuid::Uuid;

const GROUP: &str = "properties";

pub fn scenarios(policy: &PolicySettings, emails: &EmailFactory) -> Vec<Scenario> {
    vec![
        listing_is_idempotent(policy),
        password_is_never_echoed(emails),
        unregistered_credentials_yield_no_token(),
        missing_authorization_creates_nothing(policy, emails),
        tokens_stay_bound_to_their_user(policy, emails),
        first_product_subscription(policy, emails),
    ]
}

fn listing_is_idempotent(policy: &PolicySettings) -> Scenario {
    Scenario::new(GROUP, "listing products twice returns the same ids")
        .step(
            list_products("list products", policy, false)
                .capture(Capture::id_set("product_ids", "/products", "id")),
        )
        .step({
            let mut step = list_products("list products again", policy, false);
            step.expectation = step
                .expectation
                .check(BodyCheck::same_id_set("/products", "id", "product_ids"));
            step
        })
}

fn password_is_never_echoed(emails: &EmailFactory) -> Scenario {
    let users = [
        NewUser::new(emails.email("echo.one@example.com"), "Pw123!", "Echo One", "Echo Co"),
        NewUser::new(
            emails.email("echo.two@example.com"),
            "a much longer pass phrase with spaces",
            "Zoë Ünïcode",
            "Ünïcode GmbH",
        ),
        NewUser::new(emails.email("echo.three@example.com"), "password", "", ""),
    ];
    users.iter().enumerate().fold(
        Scenario::new(GROUP, "registration never echoes the password"),
        |scenario, (index, user)| {
            scenario.step(register(&format!("register user {}", index + 1), user))
        },
    )
}

fn unregistered_credentials_yield_no_token() -> Scenario {
    let unregistered = |password: &str| {
        Credentials::new(
            format!("never.registered.{}@example.com", Uuid::new_v4().simple()),
            password,
        )
    };
    Scenario::new(GROUP, "unregistered credentials never yield a token")
        .step(attempt_login(
            "log in as unregistered user",
            &unregistered("Pw123!"),
            invalid_credentials(),
        ))
        .step(attempt_login(
            "log in as another unregistered user",
            &unregistered("WorkflowTest123!"),
            invalid_credentials(),
        ))
}

fn missing_authorization_creates_nothing(
    policy: &PolicySettings,
    emails: &EmailFactory,
) -> Scenario {
    let request = SubscriptionRequest::new(
        DEFAULT_PLAN_ID,
        "pm_card_visa",
        billing(
            "Test User",
            &emails.email("test@example.com"),
            "123 Test St",
            "Test City",
            "TS",
        ),
    );
    let raw = |value: &str| Authorization::Raw(Secret::new(value.to_string()));
    let attempts = [
        ("without header", Authorization::None),
        ("with empty bearer token", raw("Bearer ")),
        ("with basic credentials", raw("Basic dXNlcjpwYXNz")),
        (
            "with unknown token",
            Authorization::Bearer(SessionToken::new(Uuid::new_v4().to_string())),
        ),
    ];
    attempts.into_iter().fold(
        Scenario::new(GROUP, "protected calls without a valid token create nothing"),
        |scenario, (label, authorization)| {
            scenario.step(subscribe_with(
                &format!("subscribe {}", label),
                &request,
                authorization,
                unauthorized(policy),
            ))
        },
    )
}

/// Two users, two tokens: each token keeps yielding its own customer.
fn tokens_stay_bound_to_their_user(policy: &PolicySettings, emails: &EmailFactory) -> Scenario {
    let first = NewUser::new(
        emails.email("round.trip.first@example.com"),
        "RoundTrip123!",
        "First Round Trip",
        "Round Trip Co",
    );
    let second = NewUser::new(
        emails.email("round.trip.second@example.com"),
        "RoundTrip456!",
        "Second Round Trip",
        "Round Trip Co",
    );
    let request_for = |user: &NewUser| {
        SubscriptionRequest::new(
            DEFAULT_PLAN_ID,
            "pm_card_visa",
            billing(&user.name, &user.email, "1 Loop Rd", "Round City", "RT"),
        )
    };

    Scenario::new(GROUP, "tokens stay bound to the user that logged in")
        .step(register("register first user", &first))
        .step(register("register second user", &second))
        .step(log_in("log in first user", &first.credentials(), policy, "first_token"))
        .step(log_in("log in second user", &second.credentials(), policy, "second_token"))
        .step(
            subscribe(
                "subscribe first user",
                request_for(&first),
                "first_token",
                subscribed(None).check(BodyCheck::has_key("/customerId")),
            )
            .capture(Capture::value("first_customer", "/customerId")),
        )
        .step(subscribe(
            "subscribe first user again",
            request_for(&first),
            "first_token",
            subscribed(None).check(BodyCheck::equals_context("/customerId", "first_customer")),
        ))
        .step(subscribe(
            "subscribe second user",
            request_for(&second),
            "second_token",
            subscribed(None).check(BodyCheck::differs_from_context(
                "/customerId",
                "first_customer",
            )),
        ))
}

/// Register, log in, then subscribe to whatever product is listed first.
fn first_product_subscription(policy: &PolicySettings, emails: &EmailFactory) -> Scenario {
    let user = NewUser::new(emails.email("e@x.com"), "Pw123!", "N", "C");
    let billing_details = billing(&user.name, &user.email, "1 First St", "First City", "FC");

    Scenario::new(GROUP, "subscribes to the first listed product")
        .step(register("register user", &user))
        .step(log_in("log in", &user.credentials(), policy, TOKEN_KEY))
        .step({
            let mut step = list_products("list products", policy, false)
                .capture(Capture::value("plan_id", "/products/0/id"));
            step.expectation = step.expectation.check(BodyCheck::is_string("/products/0/id"));
            step
        })
        .step(Step::new(
            "subscribe to first product",
            move |context: &Context| {
                let plan_id = context.require_str("plan_id")?;
                let request =
                    SubscriptionRequest::new(plan_id, "pm_card_visa", billing_details.clone());
                Ok(ApiRequest::post(SUBSCRIPTIONS_PATH, request.body())
                    .with_authorization(Authorization::Bearer(context.token()?)))
            },
            subscribed(None).check(BodyCheck::equals_context("/planId", "plan_id")),
        ))
}
