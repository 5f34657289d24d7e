//! Value types shared by the session bootstrapper and the connection establisher.
//!
//! The wire bodies at the bottom of this module match the JSON produced and
//! consumed by the authentication API (`/register` and `/anonymLogin`).
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

// ── Identity ────────────────────────────────────────────────────────

/// The local player's identity: an opaque user id plus the token that
/// authorizes real-time connections.
///
/// Serialized as `{"userUuid": ..., "jwtToken": ...}` so credential stores can
/// persist it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalUser {
    /// Opaque user identifier assigned by the API.
    #[serde(rename = "userUuid")]
    pub user_id: String,
    /// Token presented to the room server on every connection attempt.
    #[serde(rename = "jwtToken")]
    pub auth_token: String,
}

impl LocalUser {
    /// Token installed by [`LocalUser::benchmark`].
    pub const BENCHMARK_TOKEN: &'static str = "test";

    /// Create a new identity.
    pub fn new(user_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Placeholder identity for load-testing harnesses.
    ///
    /// Never produced on the authenticated path.
    pub fn benchmark() -> Self {
        Self::new("", Self::BENCHMARK_TOKEN)
    }
}

// ── Room ────────────────────────────────────────────────────────────

/// A playable location: the URL path it was reached through and the map to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// URL path at the time the room was resolved.
    pub path: String,
    /// URL of the map to load first.
    pub map_url: String,
}

impl Room {
    /// Create a new room descriptor.
    pub fn new(path: impl Into<String>, map_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            map_url: map_url.into(),
        }
    }
}

/// Result of a successful bootstrap: who we are and where we are going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub local_user: LocalUser,
    pub room: Room,
}

// ── Connection intent ───────────────────────────────────────────────

/// How the client should obtain its identity, as classified from the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionIntent {
    /// Register a new organization member using the token from the URL.
    Register {
        /// Organization-member token carried by the registration link.
        organization_token: String,
    },
    /// Play anonymously, reusing a cached identity when one exists.
    Anonymous,
    /// Enter an organization world with a cached identity.
    Organization,
    /// The URL did not match any known shape.
    Invalid,
}

impl ConnectionIntent {
    /// Short label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Anonymous => "anonymous",
            Self::Organization => "organization",
            Self::Invalid => "invalid",
        }
    }
}

// ── Player state passed through to the room server ──────────────────

/// Player position on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub direction: String,
    pub moving: bool,
}

/// Visible rectangle of the map, in map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Everything needed to open a room connection besides the auth token.
///
/// Captured once per connect call and only ever borrowed by individual
/// attempts, so every retry sees the same values.
///
/// # Example
///
/// ```
/// use room_session_client::model::{Position, RoomParams, Viewport};
///
/// let params = RoomParams::new("_/global/maps.example.org/floor.json", "Alice")
///     .with_character_layers(vec!["male1".into()])
///     .with_position(Position { x: 10.0, y: 20.0, direction: "down".into(), moving: false })
///     .with_viewport(Viewport { left: 0.0, top: 0.0, right: 800.0, bottom: 600.0 });
/// assert_eq!(params.name, "Alice");
/// assert_eq!(params.character_layers.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomParams {
    /// Identifier of the room on the room server.
    pub room_id: String,
    /// Display name of the player.
    pub name: String,
    /// Sprite layers composing the player's character.
    pub character_layers: Vec<String>,
    pub position: Position,
    pub viewport: Viewport,
}

impl RoomParams {
    /// Create parameters with the required fields and default player state.
    pub fn new(room_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the character layers.
    #[must_use]
    pub fn with_character_layers(mut self, layers: Vec<String>) -> Self {
        self.character_layers = layers;
        self
    }

    /// Set the starting position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the initial viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

// ── Wire bodies ─────────────────────────────────────────────────────

/// Body of `POST {api}/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub organization_member_token: String,
}

/// Response of `POST {api}/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_uuid: String,
    pub auth_token: String,
    pub organization_slug: String,
    pub world_slug: String,
    pub room_slug: String,
    pub map_url_start: String,
}

/// Response of `POST {api}/anonymLogin`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousLoginResponse {
    pub user_uuid: String,
    pub auth_token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn local_user_uses_stored_field_names() {
        let user = LocalUser::new("u1", "t1");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["userUuid"], "u1");
        assert_eq!(json["jwtToken"], "t1");
    }

    #[test]
    fn benchmark_user_has_empty_id_and_fixed_token() {
        let user = LocalUser::benchmark();
        assert!(user.user_id.is_empty());
        assert_eq!(user.auth_token, "test");
    }

    #[test]
    fn register_request_is_camel_case() {
        let body = RegisterRequest {
            organization_member_token: "tok".into(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"organizationMemberToken":"tok"}"#
        );
    }

    #[test]
    fn register_response_ignores_unknown_fields() {
        let json = r#"{
            "userUuid": "u1", "authToken": "t1", "organizationSlug": "o",
            "worldSlug": "w", "roomSlug": "r", "mapUrlStart": "m", "extra": 1
        }"#;
        let resp: RegisterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.map_url_start, "m");
        assert_eq!(resp.room_slug, "r");
    }

    #[test]
    fn anonymous_response_missing_token_is_rejected() {
        let result = serde_json::from_str::<AnonymousLoginResponse>(r#"{"userUuid":"u"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn intent_labels() {
        let register = ConnectionIntent::Register {
            organization_token: "x".into(),
        };
        assert_eq!(register.label(), "register");
        assert_eq!(ConnectionIntent::Invalid.label(), "invalid");
    }
}
