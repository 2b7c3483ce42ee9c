/// Преобразование имён клавиш в evdev коды
/// Отвечает за трансляцию строкового имени эмитируемой клавиши в числовой код evdev
pub struct KeyNameToEvdevCode;

impl KeyNameToEvdevCode {
    /// Получить evdev код клавиши по её имени
    pub fn translate(key_name: &str) -> Result<u16, String> {
        let normalized = key_name.to_lowercase();
        let code = match normalized.as_str() {
            // Буквенные клавиши
            "a" => 30,   // KEY_A
            "b" => 48,   // KEY_B
            "c" => 46,   // KEY_C
            "d" => 32,   // KEY_D
            "e" => 18,   // KEY_E
            "f" => 33,   // KEY_F
            "g" => 34,   // KEY_G
            "h" => 35,   // KEY_H
            "i" => 23,   // KEY_I
            "j" => 36,   // KEY_J
            "k" => 37,   // KEY_K
            "l" => 38,   // KEY_L
            "m" => 50,   // KEY_M
            "n" => 49,   // KEY_N
            "o" => 24,   // KEY_O
            "p" => 25,   // KEY_P
            "q" => 16,   // KEY_Q
            "r" => 19,   // KEY_R
            "s" => 31,   // KEY_S
            "t" => 20,   // KEY_T
            "u" => 22,   // KEY_U
            "v" => 47,   // KEY_V
            "w" => 17,   // KEY_W
            "x" => 45,   // KEY_X
            "y" => 21,   // KEY_Y
            "z" => 44,   // KEY_Z

            // Цифровые клавиши (верхний ряд)
            "1" => 2,    // KEY_1
            "2" => 3,    // KEY_2
            "3" => 4,    // KEY_3
            "4" => 5,    // KEY_4
            "5" => 6,    // KEY_5
            "6" => 7,    // KEY_6
            "7" => 8,    // KEY_7
            "8" => 9,    // KEY_8
            "9" => 10,   // KEY_9
            "0" => 11,   // KEY_0

            // Специальные клавиши
            "space" => 57,   // KEY_SPACE
            "enter" => 28,   // KEY_ENTER
            "escape" => 1,   // KEY_ESC
            "tab" => 15,     // KEY_TAB

            _ => return Err(format!("Неизвестное имя клавиши: '{}'", key_name)),
        };

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_default_key() {
        assert_eq!(KeyNameToEvdevCode::translate("x"), Ok(45));
    }

    #[test]
    fn test_translate_is_case_insensitive() {
        assert_eq!(KeyNameToEvdevCode::translate("X"), Ok(45));
        assert_eq!(KeyNameToEvdevCode::translate("Space"), Ok(57));
    }

    #[test]
    fn test_translate_rejects_unknown_name() {
        assert!(KeyNameToEvdevCode::translate("hyperkey").is_err());
    }
}
