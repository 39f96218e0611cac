use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Server-assigned connection identity. Unique for the life of the process.
pub type PlayerId = u32;

// === Shared payloads ===

/// One snapshot of a player's pose. `y` is the foot height.
///
/// Every field defaults to zero when absent or `null`, so partial payloads are
/// accepted as-is rather than rejected. JSON encoders write NaN as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerStateWire {
    #[serde(deserialize_with = "null_as_zero")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub z: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub yaw: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub pitch: f64,
    /// Sender wall clock, milliseconds since the UNIX epoch
    #[serde(deserialize_with = "null_as_zero")]
    pub client_timestamp: f64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntryWire {
    pub id: PlayerId,
    pub display_name: String,
    pub state: Option<PlayerStateWire>,
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "players:init")]
    PlayersInit(PlayersInitMsg),
    #[serde(rename = "player:joined")]
    PlayerJoined(PlayerJoinedMsg),
    #[serde(rename = "player:state")]
    PlayerState(PlayerStateMsg),
    #[serde(rename = "player:left")]
    PlayerLeft(PlayerLeftMsg),
}

/// Sent once, to the new connection only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayersInitMsg {
    pub protocol_version: u32,
    pub self_id: PlayerId,
    /// Registered players in join order
    pub players: Vec<PlayerEntryWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoinedMsg {
    pub id: PlayerId,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct PlayerStateMsg {
    pub id: PlayerId,
    pub state: PlayerStateWire,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct PlayerLeftMsg {
    pub id: PlayerId,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "join")]
    Join {
        #[serde(default, rename = "displayName")]
        display_name: Option<String>,
    },
    #[serde(rename = "state")]
    State(PlayerStateWire),
}

/// Display name used when a join carries none.
pub fn default_display_name(id: PlayerId) -> String {
    format!("P-{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn players_init_roundtrip() {
        let msg = ServerMsg::PlayersInit(PlayersInitMsg {
            protocol_version: PROTOCOL_VERSION,
            self_id: 7,
            players: vec![
                PlayerEntryWire {
                    id: 3,
                    display_name: "ada".to_string(),
                    state: Some(PlayerStateWire {
                        x: 1.0,
                        y: 0.0,
                        z: -4.5,
                        yaw: 0.25,
                        pitch: -0.1,
                        client_timestamp: 1_700_000_000_000.0,
                    }),
                },
                PlayerEntryWire {
                    id: 5,
                    display_name: "P-5".to_string(),
                    state: None,
                },
            ],
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"players:init\""));
        assert!(json.contains("\"protocolVersion\":1"));
        assert!(json.contains("\"selfId\":7"));
        assert!(json.contains("\"displayName\":\"ada\""));
        assert!(json.contains("\"state\":null"));
        assert!(json.contains("\"clientTimestamp\""));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::PlayersInit(init) => {
                assert_eq!(init.self_id, 7);
                assert_eq!(init.players.len(), 2);
                assert_eq!(init.players[0].id, 3);
                assert!(init.players[1].state.is_none());
            }
            _ => panic!("Expected PlayersInit"),
        }
    }

    #[test]
    fn player_state_tag_and_shape() {
        let msg = ServerMsg::PlayerState(PlayerStateMsg {
            id: 2,
            state: PlayerStateWire {
                x: 3.0,
                ..Default::default()
            },
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"player:state\""));
        assert!(json.contains("\"id\":2"));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::PlayerState(s) => assert_eq!(s.state.x, 3.0),
            _ => panic!("Expected PlayerState"),
        }
    }

    #[test]
    fn joined_and_left_tags() {
        let joined = serde_json::to_string(&ServerMsg::PlayerJoined(PlayerJoinedMsg {
            id: 4,
            display_name: "bo".to_string(),
        }))
        .unwrap();
        assert!(joined.contains("\"type\":\"player:joined\""));
        assert!(joined.contains("\"displayName\":\"bo\""));

        let left = serde_json::to_string(&ServerMsg::PlayerLeft(PlayerLeftMsg { id: 4 })).unwrap();
        assert_eq!(left, r#"{"type":"player:left","id":4}"#);
    }

    #[test]
    fn join_with_and_without_name() {
        let parsed: ClientMsg =
            serde_json::from_str(r#"{"type":"join","displayName":"cy"}"#).unwrap();
        match parsed {
            ClientMsg::Join { display_name } => assert_eq!(display_name.as_deref(), Some("cy")),
            _ => panic!("Expected Join"),
        }

        let parsed: ClientMsg = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        match parsed {
            ClientMsg::Join { display_name } => assert!(display_name.is_none()),
            _ => panic!("Expected Join"),
        }
    }

    #[test]
    fn partial_state_defaults_missing_fields_to_zero() {
        let parsed: ClientMsg =
            serde_json::from_str(r#"{"type":"state","x":1.5,"y":0.25,"z":-2}"#).unwrap();
        match parsed {
            ClientMsg::State(s) => {
                assert_eq!(s.x, 1.5);
                assert_eq!(s.y, 0.25);
                assert_eq!(s.z, -2.0);
                assert_eq!(s.yaw, 0.0);
                assert_eq!(s.pitch, 0.0);
                assert_eq!(s.client_timestamp, 0.0);
            }
            _ => panic!("Expected State"),
        }
    }

    #[test]
    fn null_fields_read_as_zero() {
        let parsed: ClientMsg = serde_json::from_str(
            r#"{"type":"state","x":1.0,"y":0.0,"z":2.0,"yaw":null,"pitch":null,"clientTimestamp":null}"#,
        )
        .unwrap();
        match parsed {
            ClientMsg::State(s) => {
                assert_eq!(s.x, 1.0);
                assert_eq!(s.z, 2.0);
                assert_eq!(s.yaw, 0.0);
                assert_eq!(s.pitch, 0.0);
                assert_eq!(s.client_timestamp, 0.0);
            }
            _ => panic!("Expected State"),
        }
    }

    #[test]
    fn non_numeric_field_is_still_rejected() {
        assert!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"state","x":"left"}"#).is_err()
        );
    }

    #[test]
    fn state_serializes_flat() {
        let json = serde_json::to_string(&ClientMsg::State(PlayerStateWire {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 0.5,
            pitch: 0.25,
            client_timestamp: 10.0,
        }))
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"state","x":1.0,"y":2.0,"z":3.0,"yaw":0.5,"pitch":0.25,"clientTimestamp":10.0}"#
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"teleport"}"#).is_err());
    }

    #[test]
    fn default_name_uses_identity() {
        assert_eq!(default_display_name(12), "P-12");
    }
}
