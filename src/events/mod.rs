pub mod button;
pub mod pixel;

pub use button::{ButtonCode, ButtonEvent, ButtonState};
pub use pixel::{ColourSample, DisplayRect, Rgb, SamplePoint};
