//! Conversation transformer
//!
//! Turns an ordered list of role-tagged messages into PS-LANG zones. The
//! transformation is pure, deterministic and total. Messages with a role
//! outside system/user/assistant (tool output, function calls) are skipped;
//! input with no recognised message yields an empty result instead of an
//! error. Zone indices refer to positions in the original input.
//!
//! Classification per message, first match wins:
//! 1. `Private` when any private signal is present
//! 2. `Bookmark` when the message starts with `!bookmark` or carries
//!    `#bookmark`
//! 3. `Public` otherwise
//!
//! # Examples
//!
//! ```
//! use pslang_core::transform::transform;
//! use pslang_domain::{RawMessage, ZoneKind};
//!
//! let out = transform(&[
//!     RawMessage::new("user", "How do lifetimes work? #rust"),
//!     RawMessage::new("assistant", "They describe how long references live."),
//! ]);
//! assert_eq!(out.zones.len(), 2);
//! assert_eq!(out.zones[0].kind, ZoneKind::Public);
//! assert!(out.meta_tags.contains(&"rust".to_string()));
//! assert_eq!(out.title, "How do lifetimes work? #rust");
//! ```

pub mod signals;

use std::collections::BTreeSet;

use pslang_domain::constants::UNTITLED_CONVERSATION;
use pslang_domain::utils::title::title_or_untitled;
use pslang_domain::{MessageRole, RawMessage, TransformedConversation, Zone, ZoneKind};

use self::signals::{detect_private, hashtags, is_bookmark};

const REDACTED: &str = "[redacted]";

/// Transform a conversation into zones, tags and a PS-LANG prompt.
#[must_use]
pub fn transform(messages: &[RawMessage]) -> TransformedConversation {
    let Some(parsed) = parse_roles(messages) else {
        return empty();
    };

    let mut zones = Vec::new();
    let mut signals = BTreeSet::new();
    let mut tags = BTreeSet::new();

    for (index, role, message) in parsed {
        let content = message.content.trim();
        if content.is_empty() {
            continue;
        }

        let found = detect_private(content);
        let kind = if !found.is_empty() {
            ZoneKind::Private
        } else if is_bookmark(content) {
            ZoneKind::Bookmark
        } else {
            ZoneKind::Public
        };

        signals.extend(found.into_iter().map(|signal| signal.as_str()));
        tags.insert(format!("role:{}", role.as_str()));
        tags.insert(format!("zone:{}", kind.as_str()));
        if kind == ZoneKind::Public {
            tags.extend(hashtags(content));
        }

        zones.push(Zone { kind, role, index, content: content.to_string() });
    }

    let title = title_or_untitled(
        zones.iter().filter(|zone| zone.role == MessageRole::User).map(|zone| Some(zone.content.as_str())),
    );

    TransformedConversation {
        psl_prompt: render_prompt(&zones),
        meta_tags: tags.into_iter().collect(),
        private_signals: signals.into_iter().map(str::to_string).collect(),
        zones,
        title,
    }
}

/// Render zones as `<.kind role="r">content</.kind>` lines.
#[must_use]
pub fn render_prompt(zones: &[Zone]) -> String {
    zones
        .iter()
        .map(|zone| {
            let kind = zone.kind.as_str();
            let body = match zone.kind {
                ZoneKind::Private => REDACTED,
                ZoneKind::Public | ZoneKind::Bookmark => zone.content.as_str(),
            };
            format!("<.{kind} role=\"{}\">{body}</.{kind}>", zone.role.as_str())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_roles(messages: &[RawMessage]) -> Option<Vec<(usize, MessageRole, &RawMessage)>> {
    let parsed: Vec<_> = messages
        .iter()
        .enumerate()
        .filter_map(|(index, message)| {
            MessageRole::parse(&message.role).map(|role| (index, role, message))
        })
        .collect();
    (!parsed.is_empty()).then_some(parsed)
}

fn empty() -> TransformedConversation {
    TransformedConversation { title: UNTITLED_CONVERSATION.to_string(), ..Default::default() }
}
