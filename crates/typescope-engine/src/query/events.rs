//! Event queries

use typescope_runtime::{TypeHandle, Visibility};

use super::{CaseInsensitiveNames, QueryKind};
use crate::descriptor::{EventDescriptor, MemberDescriptor, MemberSignature};

/// Event facade
pub struct EventKind;

/// Search options of an event
#[derive(Debug, Clone)]
pub struct EventOptions {
    /// Event name
    pub name: String,
    /// Delegate type of subscribers
    pub handler_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Public event
    pub is_public: bool,
    /// Static event
    pub is_static: bool,
    /// Instance event
    pub is_instance: bool,
}

impl QueryKind for EventKind {
    type Item = EventDescriptor;
    type Options = EventOptions;
    const NAME: &'static str = "event";

    fn project(member: &MemberDescriptor) -> Option<EventDescriptor> {
        member.as_event().cloned()
    }

    fn options(event: &EventDescriptor) -> EventOptions {
        EventOptions {
            name: event.name().to_string(),
            handler_type: event.handler_type().clone(),
            visibility: event.visibility(),
            is_public: event.visibility().is_public(),
            is_static: event.is_static(),
            is_instance: !event.is_static(),
        }
    }

    fn name(event: &EventDescriptor) -> &str {
        event.name()
    }

    fn signature(event: &EventDescriptor) -> MemberSignature {
        MemberDescriptor::Event(event.clone()).signature()
    }
}

impl CaseInsensitiveNames for EventKind {}
