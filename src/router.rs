//! URL routing collaborator.
//!
//! The bootstrapper never parses URLs itself. It asks a [`UrlRouter`] what the
//! current URL means and tells it to rewrite the URL once a registration
//! resolves the player's organization, world and room.
//!
//! [`PathRouter`] implements the three URL shapes a world client understands:
//!
//! | Path                          | Intent                      |
//! |-------------------------------|-----------------------------|
//! | `/register/{token}`           | [`ConnectionIntent::Register`] |
//! | `/_/{instance}/{map}`         | [`ConnectionIntent::Anonymous`] |
//! | `/@/{org}/{world}/{room}`     | [`ConnectionIntent::Organization`] |

use std::sync::Mutex;

use crate::model::ConnectionIntent;

/// Classifies the current URL and rewrites it on request.
pub trait UrlRouter: Send + Sync {
    /// What the current URL asks the client to do.
    fn connection_intent(&self) -> ConnectionIntent;

    /// Path component of the current URL.
    fn current_path(&self) -> String;

    /// Map URL to load for an anonymous `/_/` link.
    fn anonymous_map_url_start(&self) -> String;

    /// Point the current URL at the resolved room.
    fn edit_url_for_room(&self, room_slug: &str, organization_slug: &str, world_slug: &str);
}

/// [`UrlRouter`] over an in-memory protocol + path pair.
#[derive(Debug)]
pub struct PathRouter {
    protocol: String,
    path: Mutex<String>,
}

impl PathRouter {
    /// Create a router for `path`, served over `protocol` (e.g. `"https:"`).
    pub fn new(protocol: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            path: Mutex::new(path.into()),
        }
    }

    fn path(&self) -> String {
        match self.path.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl UrlRouter for PathRouter {
    fn connection_intent(&self) -> ConnectionIntent {
        let path = self.path();
        if let Some(token) = path.strip_prefix("/register/") {
            let token = token.trim_end_matches('/');
            if !token.is_empty() && !token.contains('/') {
                return ConnectionIntent::Register {
                    organization_token: token.to_string(),
                };
            }
            return ConnectionIntent::Invalid;
        }
        if path.starts_with("/_/") {
            ConnectionIntent::Anonymous
        } else if path.starts_with("/@/") {
            ConnectionIntent::Organization
        } else {
            ConnectionIntent::Invalid
        }
    }

    fn current_path(&self) -> String {
        self.path()
    }

    fn anonymous_map_url_start(&self) -> String {
        let path = self.path();
        // `/_/{instance}/{map}`: the map keeps its own slashes.
        let map = path
            .strip_prefix("/_/")
            .and_then(|rest| rest.split_once('/'))
            .map(|(_instance, map)| map)
            .unwrap_or_default();
        format!("{}//{}", self.protocol, map)
    }

    fn edit_url_for_room(&self, room_slug: &str, organization_slug: &str, world_slug: &str) {
        let new_path = format!("/@/{organization_slug}/{world_slug}/{room_slug}");
        tracing::debug!(path = %new_path, "rewriting URL for room");
        let mut guard = match self.path.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = new_path;
    }
}
