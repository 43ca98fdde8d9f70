/// Wire payloads exchanged over the extension message bus
use serde::{Deserialize, Serialize};

/// What a toggle asks the background to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Remove,
}

impl Action {
    /// The action a click performs given the currently displayed state
    pub fn toggling(favorited: bool) -> Action {
        if favorited {
            Action::Remove
        } else {
            Action::Add
        }
    }

    /// Value of the control's `data-action` attribute
    pub fn data_attribute(self) -> &'static str {
        match self {
            Action::Add => "addToFaves",
            Action::Remove => "removeFromFaves",
        }
    }
}

/// One user click, consumed exactly once by turning it into a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleIntent {
    pub action: Action,
    pub identifier: String,
}

impl ToggleIntent {
    pub fn new(action: Action, identifier: impl Into<String>) -> ToggleIntent {
        ToggleIntent {
            action,
            identifier: identifier.into(),
        }
    }

    pub fn into_message(self) -> SyncMessage {
        SyncMessage {
            action: self.action,
            identifier: self.identifier,
        }
    }
}

/// Request payload, also reused as the REMOVE broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub action: Action,
    #[serde(rename = "packageName")]
    pub identifier: String,
}

impl SyncMessage {
    pub fn add(identifier: impl Into<String>) -> SyncMessage {
        SyncMessage {
            action: Action::Add,
            identifier: identifier.into(),
        }
    }

    pub fn remove(identifier: impl Into<String>) -> SyncMessage {
        SyncMessage {
            action: Action::Remove,
            identifier: identifier.into(),
        }
    }

    /// True for a REMOVE concerning `identifier`
    pub fn removes(&self, identifier: &str) -> bool {
        self.action == Action::Remove && self.identifier == identifier
    }
}

/// Direct reply to a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub result: bool,
}

impl SyncResponse {
    pub fn ok() -> SyncResponse {
        SyncResponse { result: true }
    }

    pub fn failed() -> SyncResponse {
        SyncResponse { result: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let message = SyncMessage::add("left-pad");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value, json!({ "action": "add", "packageName": "left-pad" }));
    }

    #[test]
    fn test_parse_remove_broadcast() {
        let value = json!({ "action": "remove", "packageName": "@types/node" });
        let message: SyncMessage = serde_json::from_value(value).unwrap();

        assert!(message.removes("@types/node"));
        assert!(!message.removes("@types/react"));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let value = json!({ "action": "toggle", "packageName": "left-pad" });
        assert!(serde_json::from_value::<SyncMessage>(value).is_err());
    }

    #[test]
    fn test_toggling() {
        assert_eq!(Action::toggling(false), Action::Add);
        assert_eq!(Action::toggling(true), Action::Remove);
    }

    #[test]
    fn test_data_attribute() {
        assert_eq!(Action::Add.data_attribute(), "addToFaves");
        assert_eq!(Action::Remove.data_attribute(), "removeFromFaves");
    }

    #[test]
    fn test_intent_into_message() {
        let message = ToggleIntent::new(Action::Remove, "left-pad").into_message();
        assert_eq!(message, SyncMessage::remove("left-pad"));
    }

    #[test]
    fn test_response_shape() {
        assert_eq!(
            serde_json::to_value(SyncResponse::failed()).unwrap(),
            json!({ "result": false })
        );
    }
}
