use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

/// A user as submitted to the registration endpoint.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: Secret<String>,
    pub name: String,
    pub company: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: &str, name: &str, company: &str) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password.to_string()),
            name: name.to_string(),
            company: company.to_string(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: Some(self.password.clone()),
        }
    }

    pub fn registration_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
            "name": self.name,
            "company": self.company,
        })
    }

    /// Registration payload with the password left out.
    pub fn registration_body_without_password(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email,
            "name": self.name,
            "company": self.company,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Option<Secret<String>>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: &str) -> Self {
        Self {
            email: email.into(),
            password: Some(Secret::new(password.to_string())),
        }
    }

    pub fn without_password(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: None,
        }
    }

    pub fn login_body(&self) -> serde_json::Value {
        match &self.password {
            Some(password) => serde_json::json!({
                "email": self.email,
                "password": password.expose_secret(),
            }),
            None => serde_json::json!({ "email": self.email }),
        }
    }
}

/// Bearer credential issued by the login endpoint.
#[derive(Debug, Clone)]
pub struct SessionToken(Secret<String>);

impl SessionToken {
    pub fn new(token: String) -> Self {
        Self(Secret::new(token))
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl ExposeSecret<String> for SessionToken {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

/// Builds the email addresses used by the scenarios.
///
/// With a tag every address becomes `local+tag@domain`, so a persistent server
/// never sees the same address in two runs.
#[derive(Debug, Clone, Default)]
pub struct EmailFactory {
    tag: Option<String>,
}

impl EmailFactory {
    pub fn fixed() -> Self {
        Self { tag: None }
    }

    pub fn tagged(run_id: Uuid) -> Self {
        let mut tag = run_id.simple().to_string();
        tag.truncate(8);
        Self { tag: Some(tag) }
    }

    pub fn email(&self, address: &str) -> String {
        let Some(tag) = &self.tag else {
            return address.to_string();
        };
        match address.rsplit_once('@') {
            Some((local, domain)) => format!("{}+{}@{}", local, tag, domain),
            None => format!("{}.{}", address, tag),
        }
    }
}
