//! Connection configuration values.
//!
//! A `ConnectionConf` is built for every connect or reconnect call and never
//! mutated afterwards. The socket keeps the last one as its reconnection
//! intent.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// User id sent for anonymous connections.
pub const ANONYMOUS_USER_ID: &str = "!anon";

/// A chat user as sent in the connect payload and returned in `me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub invisible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<String>,
    /// Custom fields, flattened into the user object.
    #[serde(flatten)]
    pub extra_data: Map<String, Value>,
}

impl User {
    /// Create a user with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Parameters needed to open a socket.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionConf {
    Anonymous {
        endpoint: String,
        api_key: String,
        is_reconnection: bool,
    },
    User {
        endpoint: String,
        api_key: String,
        user: User,
        is_reconnection: bool,
    },
}

impl ConnectionConf {
    /// Configuration for an anonymous connection.
    pub fn anonymous(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::Anonymous {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            is_reconnection: false,
        }
    }

    /// Configuration for an identified user.
    pub fn user(endpoint: impl Into<String>, api_key: impl Into<String>, user: User) -> Self {
        Self::User {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            user,
            is_reconnection: false,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Anonymous { endpoint, .. } | Self::User { endpoint, .. } => endpoint,
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            Self::Anonymous { api_key, .. } | Self::User { api_key, .. } => api_key,
        }
    }

    pub fn is_reconnection(&self) -> bool {
        match self {
            Self::Anonymous { is_reconnection, .. } | Self::User { is_reconnection, .. } => {
                *is_reconnection
            }
        }
    }

    /// The identified user, if any.
    pub fn user_ref(&self) -> Option<&User> {
        match self {
            Self::Anonymous { .. } => None,
            Self::User { user, .. } => Some(user),
        }
    }

    /// The id sent as `user_id` in the connect payload.
    pub fn user_id(&self) -> &str {
        match self {
            Self::Anonymous { .. } => ANONYMOUS_USER_ID,
            Self::User { user, .. } => &user.id,
        }
    }

    /// Same identity, flagged as a reconnection.
    pub fn as_reconnection_conf(&self) -> Self {
        match self {
            Self::Anonymous {
                endpoint, api_key, ..
            } => Self::Anonymous {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
                is_reconnection: true,
            },
            Self::User {
                endpoint,
                api_key,
                user,
                ..
            } => Self::User {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
                user: user.clone(),
                is_reconnection: true,
            },
        }
    }

    /// User details for the connect payload.
    ///
    /// A reconnection only needs the id; the server already has the rest.
    pub fn user_details(&self) -> Value {
        match self {
            Self::User {
                user,
                is_reconnection: false,
                ..
            } => serde_json::to_value(user).unwrap_or_else(|_| json!({ "id": user.id })),
            _ => json!({ "id": self.user_id() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jc() -> User {
        let mut user = User::new("jc").with_name("Jc Miñarro");
        user.extra_data.insert("favorite_color".into(), json!("green"));
        user
    }

    #[test]
    fn test_reconnection_conf_keeps_identity() {
        let conf = ConnectionConf::user("wss://example.com/", "key", jc());
        let reconnection = conf.as_reconnection_conf();
        assert!(!conf.is_reconnection());
        assert!(reconnection.is_reconnection());
        assert_eq!(reconnection.user_ref(), conf.user_ref());
        assert_eq!(reconnection.endpoint(), "wss://example.com/");
        assert_eq!(reconnection.api_key(), "key");
        assert_ne!(reconnection, conf);
    }

    #[test]
    fn test_user_details_full_on_first_connect() {
        let conf = ConnectionConf::user("wss://example.com/", "key", jc());
        let details = conf.user_details();
        assert_eq!(details["id"], "jc");
        assert_eq!(details["name"], "Jc Miñarro");
        assert_eq!(details["favorite_color"], "green");
    }

    #[test]
    fn test_user_details_reduced_on_reconnect() {
        let conf = ConnectionConf::user("wss://example.com/", "key", jc()).as_reconnection_conf();
        assert_eq!(conf.user_details(), json!({ "id": "jc" }));
    }

    #[test]
    fn test_anonymous_conf() {
        let conf = ConnectionConf::anonymous("wss://example.com/", "key");
        assert_eq!(conf.user_id(), ANONYMOUS_USER_ID);
        assert!(conf.user_ref().is_none());
        assert_eq!(conf.user_details(), json!({ "id": "!anon" }));
    }
}
