//! Outbound messages for the visualization client and their encodings.
//!
//! Three message shapes cross the link: [`CreateMessage`] announces a
//! freshly loaded transporter, [`MoveMessage`] relocates a previously
//! created object, and [`DisposeMessage`] removes one.
//!
//! Two encodings are supported, selected by [`WireFormat`]:
//!
//! - [`WireFormat::Tagged`] -- tagged-record text in the legacy client's
//!   envelope: `<id>`, then `<Create><Transporter type=.. identifier=..>`,
//!   `<Move>` or `<Dispose>`. The per-container `<Container .../>` element
//!   is this crate's own layout; check it against the client before relying
//!   on it.
//! - [`WireFormat::Json`] -- a JSON object with a `type` discriminator.
//!   TypeScript bindings for these shapes are exported via `ts-rs`.

use std::borrow::Cow;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::TransportCategory;
use crate::ids::{MessageId, TransporterId};
use crate::structs::Container;

/// Encoding used on the outbound link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Tagged-record text using the legacy client's message envelope.
    #[default]
    Tagged,
    /// JSON objects.
    Json,
}

/// Errors that can occur while encoding a message.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("json encoding failed: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// Writing into the output buffer failed.
    #[error("tagged encoding failed: {source}")]
    Fmt {
        /// The underlying formatting error.
        #[from]
        source: core::fmt::Error,
    },
}

/// Announces a transporter and every container it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CreateMessage {
    /// Message sequence number.
    pub id: MessageId,
    /// The transporter being created.
    pub transporter_id: TransporterId,
    /// Vehicle category of the transporter.
    pub category: TransportCategory,
    /// Carried containers, in grid order (x, then y, then bottom-to-top).
    pub containers: Vec<Container>,
}

/// Commands an existing object to travel to a named destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoveMessage {
    /// Name of the object to move.
    pub object_name: String,
    /// Name of the destination.
    pub destination_name: String,
    /// Travel speed.
    pub speed: f32,
}

/// Removes an existing object from the visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DisposeMessage {
    /// Name of the object to remove.
    pub object_name: String,
}

/// Any message sent to the visualization client.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Transporter creation.
    Create(CreateMessage),
    /// Object relocation.
    Move(MoveMessage),
    /// Object removal.
    Dispose(DisposeMessage),
}

impl OutboundMessage {
    /// Encode the message as text in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if serialization fails.
    pub fn encode(&self, format: WireFormat) -> Result<String, EncodeError> {
        match format {
            WireFormat::Json => Ok(serde_json::to_string(self)?),
            WireFormat::Tagged => self.encode_tagged(),
        }
    }

    fn encode_tagged(&self) -> Result<String, EncodeError> {
        let mut out = String::new();
        match self {
            Self::Create(create) => {
                write!(out, "<id>{}</id>", create.id)?;
                out.push_str("<Create>");
                write!(
                    out,
                    "<Transporter type=\"{}\" identifier=\"{}\">",
                    create.category.legacy_name(),
                    create.transporter_id
                )?;
                for container in &create.containers {
                    let spawn = container.spawn();
                    write!(
                        out,
                        "<Container identifier=\"{}\" type=\"{}\" spawnX=\"{}\" spawnY=\"{}\" spawnZ=\"{}\" arrival=\"{}\"/>",
                        escape(container.id().as_str()),
                        container.category().legacy_name(),
                        spawn.x,
                        spawn.y,
                        spawn.z,
                        container.arrival().format("%Y-%m-%dT%H:%M:%S"),
                    )?;
                }
                out.push_str("</Transporter></Create>");
            }
            Self::Move(mv) => {
                // `{:?}` keeps the trailing `.0` on whole speeds, as the client expects.
                write!(
                    out,
                    "<Move><objectName>{}</objectName><destinationName>{}</destinationName><speed>{:?}</speed></Move>",
                    escape(&mv.object_name),
                    escape(&mv.destination_name),
                    mv.speed
                )?;
            }
            Self::Dispose(dispose) => {
                write!(
                    out,
                    "<Dispose><objectName>{}</objectName></Dispose>",
                    escape(&dispose.object_name)
                )?;
            }
        }
        Ok(out)
    }
}

/// Escape markup-significant characters in text and attribute values.
fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len().saturating_add(8));
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::ids::ContainerId;
    use crate::structs::SpawnPoint;

    fn sample_create() -> OutboundMessage {
        let arrival = NaiveDate::from_ymd_opt(2004, 12, 1)
            .and_then(|d| d.and_hms_opt(6, 30, 0))
            .unwrap();
        OutboundMessage::Create(CreateMessage {
            id: MessageId(7),
            transporter_id: TransporterId(Uuid::nil()),
            category: TransportCategory::Sea,
            containers: vec![Container::new(
                ContainerId::from("MSKU1"),
                arrival,
                TransportCategory::Sea,
                SpawnPoint::new(1, 0, 2),
            )],
        })
    }

    #[test]
    fn create_tagged_layout() {
        let text = sample_create().encode(WireFormat::Tagged).unwrap();
        assert_eq!(
            text,
            "<id>7</id><Create><Transporter type=\"zeeschip\" \
             identifier=\"00000000-0000-0000-0000-000000000000\">\
             <Container identifier=\"MSKU1\" type=\"zeeschip\" spawnX=\"1\" spawnY=\"0\" \
             spawnZ=\"2\" arrival=\"2004-12-01T06:30:00\"/></Transporter></Create>"
        );
    }

    #[test]
    fn move_tagged_keeps_decimal_speed() {
        let msg = OutboundMessage::Move(MoveMessage {
            object_name: "crane-1".to_owned(),
            destination_name: "berth-3".to_owned(),
            speed: 2.0,
        });
        assert_eq!(
            msg.encode(WireFormat::Tagged).unwrap(),
            "<Move><objectName>crane-1</objectName><destinationName>berth-3</destinationName><speed>2.0</speed></Move>"
        );
    }

    #[test]
    fn dispose_tagged_escapes_names() {
        let msg = OutboundMessage::Dispose(DisposeMessage {
            object_name: "a<b&c".to_owned(),
        });
        assert_eq!(
            msg.encode(WireFormat::Tagged).unwrap(),
            "<Dispose><objectName>a&lt;b&amp;c</objectName></Dispose>"
        );
    }

    #[test]
    fn json_carries_type_tag() {
        let text = sample_create().encode(WireFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "create");
        assert_eq!(value["id"], 7);
        assert_eq!(value["category"], "sea");
        assert_eq!(value["containers"][0]["id"], "MSKU1");
        assert_eq!(value["containers"][0]["spawn"]["z"], 2);
    }

    #[test]
    fn escape_borrows_clean_input() {
        assert!(matches!(escape("plain"), Cow::Borrowed("plain")));
    }
}
