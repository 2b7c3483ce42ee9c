pub mod device_finder;
pub mod permissions;

pub use device_finder::DeviceFinder;

// ✅ Макрос условного логирования для горячего цикла опроса
#[macro_export]
macro_rules! debug_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}
