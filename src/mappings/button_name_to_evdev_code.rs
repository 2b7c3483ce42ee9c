/// Преобразование имён кнопок мыши в evdev коды
/// Отвечает за трансляцию имени кнопки-триггера из конфигурации в BTN_* код
pub struct ButtonNameToEvdevCode;

impl ButtonNameToEvdevCode {
    /// Получить evdev код кнопки мыши по её имени
    pub fn translate(button_name: &str) -> Result<u16, String> {
        let normalized = button_name.to_lowercase();
        let code = match normalized.as_str() {
            "left" => 272,     // BTN_LEFT
            "right" => 273,    // BTN_RIGHT
            "middle" => 274,   // BTN_MIDDLE
            "side" => 275,     // BTN_SIDE (первая боковая, "Mouse 4")
            "extra" => 276,    // BTN_EXTRA (вторая боковая, "Mouse 5")
            "forward" => 277,  // BTN_FORWARD
            "back" => 278,     // BTN_BACK

            _ => return Err(format!("Неизвестное имя кнопки мыши: '{}'", button_name)),
        };

        Ok(code)
    }
}
