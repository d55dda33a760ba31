use super::{
    attempt_login, billing, invalid_credentials, list_products, log_in, register, subscribe,
    subscribe_with, subscribed, unauthorized,
};
use crate::client::Authorization;
use crate::configuration::PolicySettings;
use crate::domain::{Credentials, EmailFactory, NewUser, SubscriptionRequest};
use crate::endpoints::DEFAULT_PLAN_ID;
use crate::workflow::{Scenario, TOKEN_KEY};

const GROUP: &str = "api_workflow";

const REGISTERED: &str = "registers the workflow user";
const LOGGED_IN: &str = "logs in the workflow user";

pub fn scenarios(policy: &PolicySettings, emails: &EmailFactory) -> Vec<Scenario> {
    let user = NewUser::new(
        emails.email("ryan.workflow@test.com"),
        "WorkflowTest123!",
        "Ryan Workflow",
        "Workflow Test Co",
    );
    let anonymous_request = SubscriptionRequest::new(
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
    let user_request = SubscriptionRequest::new(
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

    vec![
        Scenario::new(GROUP, REGISTERED).step(register("register user", &user)),
        Scenario::new(GROUP, LOGGED_IN)
            .depends_on(REGISTERED)
            .step(log_in("log in", &user.credentials(), policy, TOKEN_KEY)),
        Scenario::new(GROUP, "rejects the workflow user with a wrong password")
            .depends_on(REGISTERED)
            .step(attempt_login(
                "log in with wrong password",
                &Credentials::new(user.email.clone(), "WrongPassword"),
                invalid_credentials(),
            )),
        Scenario::new(GROUP, "gets the available subscription products")
            .step(list_products("list products", policy, false)),
        Scenario::new(GROUP, "rejects an anonymous subscription").step(subscribe_with(
            "subscribe without authorization",
            &anonymous_request,
            Authorization::None,
            unauthorized(policy),
        )),
        Scenario::new(GROUP, "subscribes the workflow user")
            .depends_on(LOGGED_IN)
            .step(subscribe(
                "subscribe",
                user_request,
                TOKEN_KEY,
                subscribed(Some(DEFAULT_PLAN_ID)),
            )),
        complete_flow(policy, emails),
    ]
}

/// Register, log in, list products and subscribe as a fresh user within one scenario.
fn complete_flow(policy: &PolicySettings, emails: &EmailFactory) -> Scenario {
    let user = NewUser::new(
        emails.email("test@example.com"),
        "testpassword123",
        "Test User",
        "Test Company",
    );
    let request = SubscriptionRequest::new(
        DEFAULT_PLAN_ID,
        "pm_card_visa",
        billing(
            &user.name,
            &user.email,
            "123 Complete St",
            "Complete City",
            "CC",
        ),
    );

    Scenario::new(
        GROUP,
        "completes the authentication, products and subscription flow",
    )
    .step(register("register user", &user))
    .step(log_in("log in", &user.credentials(), policy, TOKEN_KEY))
    .step(list_products("list products", policy, false))
    .step(subscribe("subscribe", request, TOKEN_KEY, subscribed(None)))
}
