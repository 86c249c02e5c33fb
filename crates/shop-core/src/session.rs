//! # Shopping Session
//!
//! A session starts when a user logs in and ends when they log out. It owns
//! the cart for exactly that span; nothing about the cart outlives it.

use crate::cart::{CartHandle, CartStore};
use crate::product::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The signed-in user, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,

    /// Payer email; absent for accounts without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    /// Builder: set email. Blank strings count as absent.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = if email.trim().is_empty() { None } else { Some(email) };
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// The stored record for a user signing in for the first time.
///
/// Missing fields are written as empty strings and the history starts empty.
pub fn new_user_record(identity: &UserIdentity, profile_photo_url: Option<&str>) -> Value {
    json!({
        "uid": identity.uid,
        "username": identity.display_name.as_deref().unwrap_or_default(),
        "email": identity.email.as_deref().unwrap_or_default(),
        "profilePhotoUrl": profile_photo_url.unwrap_or_default(),
        "transactionHistory": [],
    })
}

/// Profile screen data: the stored record, with the session identity filling gaps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub uid: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_photo_url: Option<String>,
}

impl UserProfile {
    pub fn new(identity: &UserIdentity, record: Option<&Value>) -> Self {
        let field = |key: &str| {
            record
                .and_then(|r| r.get(key))
                .and_then(Value::as_str)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };

        Self {
            uid: identity.uid.clone(),
            username: field("username").or_else(|| identity.display_name.clone()),
            email: field("email").or_else(|| identity.email.clone()),
            profile_photo_url: field("profilePhotoUrl"),
        }
    }
}

/// One user's shopping session
#[derive(Debug, Clone)]
pub struct ShoppingSession {
    identity: UserIdentity,
    cart: CartHandle,
    started_at: DateTime<Utc>,
}

impl ShoppingSession {
    /// Start a session with an empty cart
    pub fn start(identity: UserIdentity, currency: Currency) -> Self {
        tracing::info!("Session started for {}", identity.uid);
        Self {
            identity,
            cart: CartHandle::new(CartStore::new(currency)),
            started_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Email to put on invoices, if the user has one
    pub fn payer_email(&self) -> Option<&str> {
        self.identity.email.as_deref()
    }

    pub fn cart(&self) -> &CartHandle {
        &self.cart
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// End the session. The cart is dropped with it.
    pub fn end(self) -> UserIdentity {
        tracing::info!(
            "Session ended for {} ({} items discarded)",
            self.identity.uid,
            self.cart.snapshot().item_count()
        );
        self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::LineItem;
    use crate::product::Price;

    #[test]
    fn test_blank_email_is_absent() {
        let user = UserIdentity::new("u1").with_email("  ");
        assert_eq!(user.email, None);

        let user = UserIdentity::new("u1").with_email("a@b.co");
        assert_eq!(user.email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn test_new_user_record_shape() {
        let user = UserIdentity::new("u1").with_display_name("Ana");
        let record = new_user_record(&user, None);

        assert_eq!(record["uid"], "u1");
        assert_eq!(record["username"], "Ana");
        assert_eq!(record["email"], "");
        assert_eq!(record["profilePhotoUrl"], "");
        assert_eq!(record["transactionHistory"], serde_json::json!([]));
    }

    #[test]
    fn test_profile_prefers_stored_record() {
        let user = UserIdentity::new("u1")
            .with_email("session@b.co")
            .with_display_name("Session Name");
        let record = serde_json::json!({
            "username": "ana",
            "email": "",
            "profilePhotoUrl": "https://img/ana.png"
        });

        let profile = UserProfile::new(&user, Some(&record));
        assert_eq!(profile.username.as_deref(), Some("ana"));
        assert_eq!(profile.email.as_deref(), Some("session@b.co"));
        assert_eq!(profile.profile_photo_url.as_deref(), Some("https://img/ana.png"));

        let bare = UserProfile::new(&user, None);
        assert_eq!(bare.username.as_deref(), Some("Session Name"));
        assert_eq!(bare.profile_photo_url, None);
    }

    #[test]
    fn test_new_session_has_empty_cart() {
        let session = ShoppingSession::start(
            UserIdentity::new("u1").with_email("a@b.co"),
            Currency::IDR,
        );

        assert!(session.cart().snapshot().is_empty());
        assert_eq!(session.payer_email(), Some("a@b.co"));
    }

    #[test]
    fn test_carts_are_not_shared_between_sessions() {
        let first = ShoppingSession::start(UserIdentity::new("u1"), Currency::IDR);
        first
            .cart()
            .add(LineItem::new("P1", "Milk", Price::from_cents(12500, Currency::IDR)));
        let identity = first.end();

        let second = ShoppingSession::start(identity, Currency::IDR);
        assert!(second.cart().snapshot().is_empty());
    }
}
