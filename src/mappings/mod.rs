pub mod button_name_to_evdev_code;
pub mod key_name_to_evdev_code;

pub use button_name_to_evdev_code::ButtonNameToEvdevCode;
pub use key_name_to_evdev_code::KeyNameToEvdevCode;
