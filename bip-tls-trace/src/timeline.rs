//! Session timeline
//!
//! One event per decoded message or non-handshake record, in completion
//! order. Runs of unresolved events collapse into a single counted event.

use serde::Serialize;

use crate::direction::Direction;
use crate::tls::names;
use crate::tls::{ContentType, EncryptedHandshake, HandshakeMessage, TlsRecord};

pub mod label {
    pub const CHANGE_CIPHER_SPEC: &str = "ChangeCipherSpec";
    pub const APPLICATION_DATA: &str = "ApplicationData";
    pub const ALERT: &str = "Alert";
    pub const HEARTBEAT: &str = "Heartbeat";
    pub const FINISHED: &str = "Finished";
    pub const HANDSHAKE_OTHER: &str = "Handshake(other)";
    pub const ENCRYPTED_HANDSHAKE: &str = "Encrypted Handshake";
    pub const ENCRYPTED_FINISHED: &str = "Encrypted Finished";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub completion_sequence: u64,
    pub direction: Direction,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Number of collapsed events this entry stands for
    pub count: usize,
    /// Inferred rather than observed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl TimelineEvent {
    fn new(record: &TlsRecord, label: impl Into<String>) -> Self {
        Self {
            completion_sequence: record.completion_sequence,
            direction: record.direction,
            label: label.into(),
            detail: None,
            count: 1,
            synthetic: false,
        }
    }

    fn is_unresolved(&self) -> bool {
        self.label == label::HANDSHAKE_OTHER || self.label == label::ENCRYPTED_HANDSHAKE
    }
}

/// Build the timeline from records and what the assembler made of them
pub fn build(
    records: &[TlsRecord],
    messages: &[HandshakeMessage],
    encrypted: &[EncryptedHandshake],
) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    for record in records {
        match record.record_type {
            ContentType::ChangeCipherSpec => events.push(TimelineEvent::new(record, label::CHANGE_CIPHER_SPEC)),
            ContentType::ApplicationData => events.push(TimelineEvent::new(record, label::APPLICATION_DATA)),
            ContentType::Heartbeat => events.push(TimelineEvent::new(record, label::HEARTBEAT)),
            ContentType::Alert => {
                let mut event = TimelineEvent::new(record, label::ALERT);
                event.detail = Some(alert_detail(record.fragment()));
                events.push(event);
            }
            ContentType::Handshake => {
                let completed = messages.iter().filter(|m| {
                    m.completion_sequence == record.completion_sequence && m.direction == record.direction
                });
                for message in completed {
                    events.push(TimelineEvent::new(record, message.name.clone()));
                }
                if encrypted.iter().any(|e| e.completion_sequence == record.completion_sequence) {
                    events.push(TimelineEvent::new(record, label::ENCRYPTED_HANDSHAKE));
                }
            }
        }
    }
    place_encrypted_finished(&mut events);
    collapse(events)
}

fn alert_detail(fragment: &[u8]) -> String {
    match fragment {
        [level, description] => {
            let level = match level {
                1 => "warning",
                2 => "fatal",
                _ => "unknown",
            };
            format!("{}: {}", level, names::alert_description(*description))
        }
        _ => "encrypted".to_string(),
    }
}

/// Mark where each direction's Finished went after its ChangeCipherSpec
fn place_encrypted_finished(events: &mut Vec<TimelineEvent>) {
    let mut i = 0;
    while i < events.len() {
        if events[i].label != label::CHANGE_CIPHER_SPEC {
            i += 1;
            continue;
        }
        let direction = events[i].direction;
        let sequence = events[i].completion_sequence;
        let next = (i + 1..events.len()).find(|&j| events[j].direction == direction);
        match next {
            Some(j) if events[j].label == label::FINISHED => {}
            Some(j) if events[j].label == label::ENCRYPTED_HANDSHAKE => {
                events[j].label = label::ENCRYPTED_FINISHED.to_string();
            }
            _ => {
                events.insert(
                    i + 1,
                    TimelineEvent {
                        completion_sequence: sequence,
                        direction,
                        label: label::ENCRYPTED_FINISHED.to_string(),
                        detail: None,
                        count: 1,
                        synthetic: true,
                    },
                );
            }
        }
        i += 1;
    }
}

/// Merge consecutive unresolved events of the same label and direction
fn collapse(events: Vec<TimelineEvent>) -> Vec<TimelineEvent> {
    let mut out: Vec<TimelineEvent> = Vec::with_capacity(events.len());
    for event in events {
        if let Some(last) = out.last_mut() {
            if event.is_unresolved() && last.label == event.label && last.direction == event.direction {
                last.count += event.count;
                continue;
            }
        }
        out.push(event);
    }
    out
}
