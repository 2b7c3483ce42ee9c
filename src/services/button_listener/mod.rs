mod button_listener;
mod dry_button_listener;
mod r#trait;

pub use self::r#trait::{create_button_listener, ButtonListenerTrait};
