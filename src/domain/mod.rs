mod product;
mod subscription;
mod user;

pub use product::{Product, ProductListing};
pub use subscription::{Address, BillingDetails, Subscription, SubscriptionRequest};
pub use user::{Credentials, EmailFactory, NewUser, SessionToken};
