use thiserror::Error;

#[derive(Error, Debug)]
pub enum CcaError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Ошибка захвата экрана: {0}")]
    Capture(String),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl CcaError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(CcaError::DeviceNotFound(msg.into()))
    }

    pub fn capture<T>(msg: impl Into<String>) -> Result<T> {
        Err(CcaError::Capture(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, CcaError>;
