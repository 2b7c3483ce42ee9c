use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::{CcaError, Result};
use crate::events::{ButtonCode, ButtonEvent, ButtonState};
use crate::services::MonitorController;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType};
use std::sync::Arc;
use tracing::{error, info};

use super::r#trait::ButtonListenerTrait;

/// Слушатель кнопок мыши поверх evdev.
///
/// Устройство открывается БЕЗ эксклюзивного захвата: мы только наблюдаем
/// за кликами, обычная работа мыши не должна прерываться.
pub struct RealButtonListener {
    device: Device,
    device_name: String,
    controller: Arc<MonitorController>,
}

impl RealButtonListener {
    pub fn new(config: Arc<Config>, controller: Arc<MonitorController>) -> Result<Self> {
        info!("Инициализация RealButtonListener");

        let device_path = DeviceFinder::find_pointer_device(&config.input.device_path)?;

        let device = Device::open(&device_path).map_err(|e| {
            CcaError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        let device_name = device.name().unwrap_or("Unknown").to_string();

        info!("Устройство: {}", device_name);
        info!("Физический путь: {:?}", device.physical_path());

        Ok(Self {
            device,
            device_name,
            controller,
        })
    }

    async fn run_impl(mut self) -> Result<()> {
        info!("RealButtonListener запущен, начинаем чтение событий");

        loop {
            // Обработка событий мыши (неблокирующая)
            let events_vec = match self.device.fetch_events() {
                Ok(events) => events.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            for event in events_vec {
                self.handle_event(event);
            }

            // Небольшая задержка для предотвращения 100% загрузки CPU
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
        }
    }

    fn handle_event(&self, event: evdev::InputEvent) {
        if event.event_type() != EventType::KEY {
            return;
        }

        let state = match event.value() {
            0 => ButtonState::Released,
            1 => ButtonState::Pressed,
            // 2 - автоповтор, кнопкам мыши не свойственен
            _ => return,
        };

        let button_event = ButtonEvent::new(
            ButtonCode(event.code()),
            state,
            self.device_name.clone(),
        );

        debug_if_enabled!("Событие кнопки: {}", button_event);

        // Ошибки обработки (например, сбой снятия базовой выборки) не
        // должны останавливать чтение событий - логируем и слушаем дальше
        if let Err(e) = self.controller.handle_button_event(&button_event) {
            error!("Ошибка при обработке события в MonitorController: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl ButtonListenerTrait for RealButtonListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
