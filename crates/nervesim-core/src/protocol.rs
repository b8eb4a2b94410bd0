//! JSON message envelopes exchanged with the network host.
//!
//! Every frame is an object `{ "command": ..., "payload": ... }`. Requests we
//! originate also carry a `callback_id`; the host answers those with
//! `{ "callback_id": n, "result": ... }` instead of a command.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::environment::ArenaBounds;
use crate::sensors::SensorBatch;
use crate::session::{ActuatorBatch, SimulationSession};

/// Callback ids wrap at this value.
const CALLBACK_WRAP: u32 = 10_000;

/// Errors raised while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is missing `{0}`")]
    MissingField(&'static str),
    #[error("invalid payload for `{command}`: {reason}")]
    InvalidPayload {
        command: &'static str,
        reason: String,
    },
}

/// Outbound frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub command: String,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<u32>,
}

impl Envelope {
    /// Request for the network's node name tables, sent on connect.
    #[must_use]
    pub fn init() -> Self {
        Self {
            command: "init".to_owned(),
            payload: Value::String(String::new()),
            callback_id: None,
        }
    }

    /// Sensor readings produced by a tick.
    #[must_use]
    pub fn sensors(batch: &SensorBatch) -> Self {
        let payload: Map<String, Value> = batch
            .iter()
            .map(|(name, value)| (name.to_owned(), Value::from(value)))
            .collect();
        Self {
            command: "sensors".to_owned(),
            payload: Value::Object(payload),
            callback_id: None,
        }
    }

    #[must_use]
    pub fn with_callback(mut self, id: u32) -> Self {
        self.callback_id = Some(id);
        self
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Hands out request callback ids in `1..10000`, wrapping back to zero.
#[derive(Debug, Clone, Default)]
pub struct CallbackIds {
    current: u32,
}

impl CallbackIds {
    pub fn next_id(&mut self) -> u32 {
        self.current = (self.current + 1) % CALLBACK_WRAP;
        self.current
    }
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    command: Option<String>,
    #[serde(default)]
    payload: Value,
    callback_id: Option<Value>,
    result: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct InitPayload {
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
}

/// Decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Node name tables announced by the network.
    InitResponse {
        inputs: Vec<String>,
        outputs: Vec<String>,
    },
    /// Output values (and display state) to apply before one tick.
    Update(Map<String, Value>),
    /// Answer to a request we sent with a callback id.
    Reply { callback_id: Value, result: Value },
    /// Any other command.
    Other(String),
}

impl Inbound {
    /// Decodes a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let frame: RawFrame = serde_json::from_str(text)?;
        if let (Some(callback_id), Some(result)) = (frame.callback_id, frame.result) {
            return Ok(Self::Reply {
                callback_id,
                result,
            });
        }
        let command = frame.command.ok_or(ProtocolError::MissingField("command"))?;
        match command.as_str() {
            "init response" => {
                let payload: InitPayload = serde_json::from_value(frame.payload).map_err(|err| {
                    ProtocolError::InvalidPayload {
                        command: "init response",
                        reason: err.to_string(),
                    }
                })?;
                Ok(Self::InitResponse {
                    inputs: payload.inputs,
                    outputs: payload.outputs,
                })
            }
            "update" => match frame.payload {
                Value::Object(map) => Ok(Self::Update(map)),
                Value::Null => Ok(Self::Update(Map::new())),
                other => Err(ProtocolError::InvalidPayload {
                    command: "update",
                    reason: format!("expected an object, got {other}"),
                }),
            },
            _ => Ok(Self::Other(command)),
        }
    }
}

/// Routes one inbound frame into the session, returning the reply to send.
///
/// Updates tick the session exactly once and answer with a sensor batch.
/// Every other frame is absorbed without a reply.
pub fn handle_inbound(
    session: &mut SimulationSession,
    inbound: Inbound,
    bounds: &ArenaBounds,
) -> Option<Envelope> {
    match inbound {
        Inbound::InitResponse { inputs, outputs } => {
            session.init(inputs, outputs);
            None
        }
        Inbound::Update(payload) => {
            let batch = ActuatorBatch::from_json(&payload);
            let (events, sensors) = session.update(&batch, bounds);
            debug!(
                tick = events.tick.0,
                actuators = batch.len(),
                sensors = sensors.len(),
                "update handled"
            );
            Some(Envelope::sensors(&sensors))
        }
        Inbound::Reply { callback_id, .. } => {
            debug!(%callback_id, "reply ignored");
            None
        }
        Inbound::Other(command) => {
            debug!(%command, "unhandled command");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use serde_json::json;

    fn session() -> SimulationSession {
        SimulationSession::new(SimConfig {
            rng_seed: Some(1),
            ..SimConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn init_response_parses_name_lists() {
        let text = r#"{"command":"init response","payload":{"inputs":["ES"],"outputs":["STL1","MO"]}}"#;
        let inbound = Inbound::parse(text).expect("parses");
        assert_eq!(
            inbound,
            Inbound::InitResponse {
                inputs: vec!["ES".into()],
                outputs: vec!["STL1".into(), "MO".into()],
            }
        );
    }

    #[test]
    fn unknown_commands_are_other() {
        let inbound = Inbound::parse(r#"{"command":"ping","payload":""}"#).expect("parses");
        assert_eq!(inbound, Inbound::Other("ping".into()));
    }

    #[test]
    fn replies_bypass_commands() {
        let inbound = Inbound::parse(r#"{"callback_id":3,"result":"ok"}"#).expect("parses");
        assert!(matches!(inbound, Inbound::Reply { .. }));
    }

    #[test]
    fn malformed_frames_error() {
        assert!(matches!(
            Inbound::parse("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            Inbound::parse(r#"{"payload":{}}"#),
            Err(ProtocolError::MissingField("command"))
        ));
        assert!(matches!(
            Inbound::parse(r#"{"command":"update","payload":[1,2]}"#),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn update_ticks_once_and_replies_with_sensors() {
        let mut session = session();
        let bounds = session.default_bounds();
        let init = Inbound::InitResponse {
            inputs: vec!["ES".into(), "MTS".into()],
            outputs: vec!["STL1".into()],
        };
        assert!(handle_inbound(&mut session, init, &bounds).is_none());

        let update = Inbound::parse(r#"{"command":"update","payload":{"STL1":1.0,"status":"x"}}"#)
            .expect("parses");
        let reply = handle_inbound(&mut session, update, &bounds).expect("sensor reply");
        assert_eq!(session.tick().0, 1);
        assert_eq!(reply.command, "sensors");
        let payload = reply.payload.as_object().expect("object payload");
        assert_eq!(payload.len(), 2);
        assert_eq!(payload["MTS"], json!(0.0));
    }

    #[test]
    fn envelopes_serialize_like_the_host_expects() {
        let text = Envelope::init().with_callback(7).to_json().expect("serializes");
        let value: Value = serde_json::from_str(&text).expect("round trips");
        assert_eq!(value, json!({ "command": "init", "payload": "", "callback_id": 7 }));

        let plain = serde_json::to_value(Envelope::init()).expect("serializes");
        assert!(plain.get("callback_id").is_none());
    }

    #[test]
    fn callback_ids_wrap() {
        let mut ids = CallbackIds { current: 9_998 };
        assert_eq!(ids.next_id(), 9_999);
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
    }
}
