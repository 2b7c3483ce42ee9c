pub mod button_listener;
pub mod change_detector;
pub mod key_sender;
pub mod monitor_controller;
pub mod pixel_sampler;
pub mod virtual_device;

pub use button_listener::create_button_listener;
pub use key_sender::{KeySenderTrait, NaturalKeySender};
pub use monitor_controller::MonitorController;
pub use pixel_sampler::create_pixel_sampler;
pub use virtual_device::VirtualDevice;
