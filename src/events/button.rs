use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние кнопки мыши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Код кнопки мыши (evdev BTN_* коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonCode(pub u16);

impl ButtonCode {
    #[allow(dead_code)]
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ButtonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BTN_{}", self.0)
    }
}

/// Событие кнопки мыши, полученное от слушателя устройства
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    pub code: ButtonCode,
    pub state: ButtonState,
    pub timestamp: std::time::Instant,
    pub device_name: String,
}

impl ButtonEvent {
    pub fn new(code: ButtonCode, state: ButtonState, device_name: String) -> Self {
        Self {
            code,
            state,
            timestamp: std::time::Instant::now(),
            device_name,
        }
    }

    #[allow(dead_code)]
    pub fn is_pressed(&self) -> bool {
        self.state == ButtonState::Pressed
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {:?} ({})",
            self.code,
            self.device_name,
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_event_creation() {
        let event = ButtonEvent::new(ButtonCode::new(276), ButtonState::Pressed, "test".to_string());

        assert_eq!(event.code.value(), 276);
        assert!(event.is_pressed());
    }

    #[test]
    fn test_button_code_display() {
        assert_eq!(format!("{}", ButtonCode::new(276)), "BTN_276");
    }

    #[test]
    fn test_released_is_not_pressed() {
        let event = ButtonEvent::new(ButtonCode::new(275), ButtonState::Released, "test".to_string());

        assert!(!event.is_pressed());
    }
}
