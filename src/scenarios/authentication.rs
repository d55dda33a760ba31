use super::{attempt_login, invalid_credentials, log_in, register, registered, rejected};
use crate::client::ApiRequest;
use crate::configuration::PolicySettings;
use crate::domain::{Credentials, EmailFactory, NewUser};
use crate::endpoints::{MESSAGE_EMAIL_AND_PASSWORD_REQUIRED, REGISTER_PATH};
use crate::expectation::{Expectation, StatusExpectation};
use crate::workflow::{Scenario, Step, TOKEN_KEY};
use validator::ValidateEmail;

const GROUP: &str = "authentication";

const LOGIN_USER_REGISTERED: &str = "registers the login test user";

pub fn scenarios(policy: &PolicySettings, emails: &EmailFactory) -> Vec<Scenario> {
    let test_user = NewUser::new(
        emails.email("ryan.test@example.com"),
        "TestPass123!",
        "Ryan Test User",
        "Test Company",
    );
    let without_password = NewUser::new(
        emails.email("missing.password@test.com"),
        "",
        "Test User",
        "Test Co",
    );
    let login_user = NewUser::new(
        emails.email("login.test@example.com"),
        "LoginTest123!",
        "Login Test User",
        "Login Test Co",
    );

    vec![
        Scenario::new(GROUP, "registers a user with valid data")
            .step(register("register user", &test_user)),
        Scenario::new(GROUP, "rejects a registration without password").step(Step::fixed(
            "register without password",
            ApiRequest::post(
                REGISTER_PATH,
                without_password.registration_body_without_password(),
            ),
            rejected(400, MESSAGE_EMAIL_AND_PASSWORD_REQUIRED),
        )),
        duplicate_email(policy, emails),
        malformed_email(policy, emails),
        Scenario::new(GROUP, LOGIN_USER_REGISTERED)
            .step(register("register login user", &login_user)),
        Scenario::new(GROUP, "logs in with valid credentials")
            .depends_on(LOGIN_USER_REGISTERED)
            .step(log_in("log in", &login_user.credentials(), policy, TOKEN_KEY)),
        Scenario::new(GROUP, "rejects a login with a wrong password")
            .depends_on(LOGIN_USER_REGISTERED)
            .step(attempt_login(
                "log in with wrong password",
                &Credentials::new(login_user.email.clone(), "WrongPassword"),
                invalid_credentials(),
            )),
        Scenario::new(GROUP, "rejects a login with an unknown email").step(attempt_login(
            "log in with unknown email",
            &Credentials::new(emails.email("nonexistent@example.com"), "TestPass123!"),
            invalid_credentials(),
        )),
        Scenario::new(GROUP, "rejects a login without password")
            .depends_on(LOGIN_USER_REGISTERED)
            .step(attempt_login(
                "log in without password",
                &Credentials::without_password(login_user.email.clone()),
                rejected(400, MESSAGE_EMAIL_AND_PASSWORD_REQUIRED),
            )),
    ]
}

/// The mock accepts a second registration of the same email, production answers 409.
fn duplicate_email(policy: &PolicySettings, emails: &EmailFactory) -> Scenario {
    let email = emails.email("duplicate@test.com");
    let first = NewUser::new(email.clone(), "TestPass123!", "First User", "First Co");
    let second = NewUser::new(email, "DifferentPass123!", "Second User", "Second Co");
    let second_status = if policy.reject_duplicate_emails {
        409
    } else {
        201
    };

    Scenario::new(GROUP, "handles a duplicate email registration")
        .step(Step::fixed(
            "register first user",
            ApiRequest::post(REGISTER_PATH, first.registration_body()),
            Expectation::status(StatusExpectation::Any),
        ))
        .step(Step::fixed(
            "register second user with the same email",
            ApiRequest::post(REGISTER_PATH, second.registration_body()),
            Expectation::status(StatusExpectation::Exactly(second_status)),
        ))
}

/// The mock accepts any email, production validates the format.
fn malformed_email(policy: &PolicySettings, emails: &EmailFactory) -> Scenario {
    let user = NewUser::new(
        emails.email("not-an-email"),
        "TestPass123!",
        "Test User",
        "Test Co",
    );
    let expectation = if policy.validate_email_format && !user.email.validate_email() {
        Expectation::status(StatusExpectation::Exactly(400))
    } else {
        registered(&user)
    };

    Scenario::new(GROUP, "handles an invalid email format").step(Step::fixed(
        "register with malformed email",
        ApiRequest::post(REGISTER_PATH, user.registration_body()),
        expectation,
    ))
}
