//! Paths and literal messages of the target API

/// Liveness probe, any HTTP response counts as "up"
pub const ROOT_PATH: &str = "/";

pub const REGISTER_PATH: &str = "/api/auth/register";

pub const LOGIN_PATH: &str = "/api/auth/login";

pub const PRODUCTS_PATH: &str = "/api/products";

pub const SUBSCRIPTIONS_PATH: &str = "/api/subscriptions";

/// Error message for a registration or login without password
pub const MESSAGE_EMAIL_AND_PASSWORD_REQUIRED: &str = "Email and password required";

/// Error message for a login with unknown email or wrong password
pub const MESSAGE_INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Error message for a protected call without a valid bearer token
pub const MESSAGE_AUTHORIZATION_REQUIRED: &str = "Authorization required";

/// Token type announced by a successful login
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Subscription status right after creation
pub const SUBSCRIPTION_STATUS_ACTIVE: &str = "active";

/// Payment methods accepted by the mock
pub const PAYMENT_METHODS: [&str; 3] = ["pm_card_visa", "pm_card_mastercard", "pm_card_amex"];

pub const DEFAULT_PLAN_ID: &str = "prod_basic";
