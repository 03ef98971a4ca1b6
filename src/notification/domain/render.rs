//! `minijinja` rendering of notification subjects and bodies.

use super::{NotificationEvent, NotificationEventType};
use minijinja::{Environment, context};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

const CREATED_SUBJECT: &str = "[{{ kind }}] {{ title }} was created";
const CREATED_BODY: &str = "\
The {{ kind }} \"{{ title }}\" has been created and is {{ state }}.
";

const ASSIGNED_SUBJECT: &str = "[{{ kind }}] {{ title }} was assigned to you";
const ASSIGNED_BODY: &str = "\
You are now the assignee of the {{ kind }} \"{{ title }}\".
";

const STATUS_CHANGED_SUBJECT: &str = "[{{ kind }}] {{ title }} is {{ state }}";
const STATUS_CHANGED_BODY: &str = "\
The {{ kind }} \"{{ title }}\" moved from {{ previous_state }} to {{ state }}.
";

const CLOSED_SUBJECT: &str = "[{{ kind }}] {{ title }} is {{ state }}";
const CLOSED_BODY: &str = "\
The {{ kind }} \"{{ title }}\" is {{ state }}.
{%- if resolution_note %}

Resolution: {{ resolution_note }}
{%- endif %}
";

const TEMPLATES: [(&str, &str); 8] = [
    ("created.subject", CREATED_SUBJECT),
    ("created.body", CREATED_BODY),
    ("assigned.subject", ASSIGNED_SUBJECT),
    ("assigned.body", ASSIGNED_BODY),
    ("status_changed.subject", STATUS_CHANGED_SUBJECT),
    ("status_changed.body", STATUS_CHANGED_BODY),
    ("closed.subject", CLOSED_SUBJECT),
    ("closed.body", CLOSED_BODY),
];

/// Rendering failure for a notification template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render {event_type} template: {reason}")]
pub struct RenderError {
    /// Event whose template failed.
    pub event_type: NotificationEventType,
    /// Underlying template error.
    pub reason: String,
}

/// Subject and body produced for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Single-line subject, also used as the in-app message.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Renders notification events with the built-in templates.
///
/// Templates are parsed once, when the renderer is built.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    environment: Arc<Environment<'static>>,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    /// Creates a renderer with the built-in templates registered.
    #[must_use]
    pub fn new() -> Self {
        let mut environment = Environment::new();
        for (name, source) in TEMPLATES {
            if let Err(error) = environment.add_template(name, source) {
                error!(template = name, %error, "built-in template failed to parse");
            }
        }
        Self {
            environment: Arc::new(environment),
        }
    }

    /// Renders the subject and body for `event`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when a template fails to evaluate.
    pub fn render(&self, event: &NotificationEvent) -> Result<RenderedMessage, RenderError> {
        let (subject_template, body_template) = templates_for(event.event_type);
        let payload = &event.payload;
        let ctx = context! {
            kind => payload.kind.as_str(),
            title => payload.title.as_str(),
            state => humanize(payload.state.as_str()),
            previous_state => payload.previous_state.map(|state| humanize(state.as_str())),
            resolution_note => payload.resolution_note.as_deref(),
        };

        let render = |name: &str| {
            self.environment
                .get_template(name)
                .and_then(|template| template.render(&ctx))
                .map_err(|error| RenderError {
                    event_type: event.event_type,
                    reason: error.to_string(),
                })
        };

        Ok(RenderedMessage {
            subject: render(subject_template)?,
            body: render(body_template)?,
        })
    }
}

const fn templates_for(event_type: NotificationEventType) -> (&'static str, &'static str) {
    match event_type {
        NotificationEventType::Created => ("created.subject", "created.body"),
        NotificationEventType::Assigned => ("assigned.subject", "assigned.body"),
        NotificationEventType::StatusChanged => {
            ("status_changed.subject", "status_changed.body")
        }
        NotificationEventType::Closed => ("closed.subject", "closed.body"),
    }
}

fn humanize(state: &str) -> String {
    state.replace('_', " ")
}
