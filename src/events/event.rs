use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadStep {
    pub step: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadSpeed {
    pub speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadPan {
    pub diff: [f32; 2],
    pub new_pan: [f32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadZoom {
    pub new_zoom: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadNodeSelect {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadNodeDeselect {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    StepChanged(PayloadStep),
    PlaybackStarted(PayloadStep),
    PlaybackPaused(PayloadStep),
    PlaybackStopped,
    SpeedChanged(PayloadSpeed),
    Pan(PayloadPan),
    Zoom(PayloadZoom),
    NodeSelect(PayloadNodeSelect),
    NodeDeselect(PayloadNodeDeselect),
    /// Selection dropped because a filter hid the selected node.
    SelectionCleared(PayloadNodeDeselect),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_contract_step_changed() {
        let event = Event::StepChanged(PayloadStep { step: 3 });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"StepChanged":{"step":3}}"#);

        let event: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, Event::StepChanged(PayloadStep { step: 3 }));
    }

    #[test]
    fn test_contract_zoom() {
        let event = Event::Zoom(PayloadZoom { new_zoom: 1.5 });
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"Zoom":{"new_zoom":1.5}}"#);
    }

    #[test]
    fn test_contract_stopped() {
        let json = serde_json::to_string(&Event::PlaybackStopped).unwrap();
        assert_eq!(json, r#""PlaybackStopped""#);
    }
}
