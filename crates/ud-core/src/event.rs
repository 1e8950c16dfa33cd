//! Audit events for the user directory.
//!
//! Every identity mutation, authentication attempt and delegation change is
//! described by an [`Event`]. Events are emitted as structured `tracing`
//! records on the `audit` target so that the logging pipeline decides where
//! they end up.
//!
//! Events never carry credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Authentication events
    /// Credential verified.
    Login,
    /// Credential rejected or user unknown.
    LoginError,

    // Identity events
    /// Writable identity created.
    UserCreated,
    /// Writable identity attributes replaced.
    UserUpdated,
    /// Writable identity removed.
    UserDeleted,
    /// Writable identity credential replaced.
    CredentialUpdated,
    /// A writable identity now overrides a read-only identity of the same name.
    IdentityShadowed,

    // Delegation events
    /// Delegation relation granted.
    DelegationGranted,
    /// Delegation relation revoked.
    DelegationRevoked,
    /// All relations of a grantor removed.
    DelegationCleared,
    /// Relation naming an unresolvable principal removed.
    DanglingDelegationPurged,
}

impl EventType {
    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::LoginError => "LOGIN_ERROR",
            Self::UserCreated => "USER_CREATED",
            Self::UserUpdated => "USER_UPDATED",
            Self::UserDeleted => "USER_DELETED",
            Self::CredentialUpdated => "CREDENTIAL_UPDATED",
            Self::IdentityShadowed => "IDENTITY_SHADOWED",
            Self::DelegationGranted => "DELEGATION_GRANTED",
            Self::DelegationRevoked => "DELEGATION_REVOKED",
            Self::DelegationCleared => "DELEGATION_CLEARED",
            Self::DanglingDelegationPurged => "DANGLING_DELEGATION_PURGED",
        }
    }
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Principal the event is about.
    pub username: Option<String>,

    /// Second principal (delegation target, shadowed identity).
    pub target: Option<String>,

    /// Backend that handled the operation.
    pub origin: Option<String>,

    /// Error message (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event to the `audit` tracing target.
    pub fn emit(&self) {
        let details = self
            .details
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");

        match self.outcome {
            EventOutcome::Success => tracing::info!(
                target: "audit",
                event_id = %self.id,
                event_type = self.event_type.as_str(),
                username = self.username.as_deref().unwrap_or("-"),
                target_user = self.target.as_deref().unwrap_or("-"),
                origin = self.origin.as_deref().unwrap_or("-"),
                details = %details,
                "audit event"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: "audit",
                event_id = %self.id,
                event_type = self.event_type.as_str(),
                username = self.username.as_deref().unwrap_or("-"),
                target_user = self.target.as_deref().unwrap_or("-"),
                origin = self.origin.as_deref().unwrap_or("-"),
                error = self.error.as_deref().unwrap_or("-"),
                details = %details,
                "audit event"
            ),
        }
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    username: Option<String>,
    target: Option<String>,
    origin: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            username: None,
            target: None,
            origin: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the principal.
    #[must_use]
    pub fn user(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the second principal.
    #[must_use]
    pub fn target(mut self, username: impl Into<String>) -> Self {
        self.target = Some(username.into());
        self
    }

    /// Sets the backend.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            username: self.username,
            target: self.target,
            origin: self.origin,
            error: self.error,
            details: self.details,
        }
    }

    /// Builds and emits the event.
    pub fn emit(self) {
        self.build().emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_builder_creates_success_event() {
        let event = Event::builder(EventType::DelegationGranted)
            .success()
            .user("alice")
            .target("bob")
            .build();

        assert_eq!(event.event_type, EventType::DelegationGranted);
        assert_eq!(event.outcome, EventOutcome::Success);
        assert_eq!(event.username.as_deref(), Some("alice"));
        assert_eq!(event.target.as_deref(), Some("bob"));
        assert!(event.error.is_none());
    }

    #[test]
    fn event_builder_creates_failure_event() {
        let event = Event::builder(EventType::LoginError)
            .failure("invalid_credentials")
            .user("mallory")
            .origin("read-only")
            .build();

        assert_eq!(event.outcome, EventOutcome::Failure);
        assert_eq!(event.error.as_deref(), Some("invalid_credentials"));
        assert_eq!(event.origin.as_deref(), Some("read-only"));
    }

    #[test]
    fn event_has_timestamp() {
        let before = Utc::now();
        let event = Event::builder(EventType::UserCreated).build();
        let after = Utc::now();

        assert!(event.timestamp >= before);
        assert!(event.timestamp <= after);
    }

    #[test]
    fn event_type_wire_names() {
        assert_eq!(EventType::IdentityShadowed.as_str(), "IDENTITY_SHADOWED");
        assert_eq!(
            EventType::DanglingDelegationPurged.as_str(),
            "DANGLING_DELEGATION_PURGED"
        );
    }
}
