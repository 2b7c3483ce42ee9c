use crate::config::Config;
use crate::error::{CcaError, Result};
use crate::events::{ButtonCode, ButtonEvent, ButtonState};
use crate::services::MonitorController;
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};
use tracing::{error, info};

use super::r#trait::ButtonListenerTrait;

pub struct DryRunButtonListener {
    config: Arc<Config>,
    controller: Arc<MonitorController>,
}

impl DryRunButtonListener {
    pub fn new(config: Arc<Config>, controller: Arc<MonitorController>) -> Result<Self> {
        info!("Инициализация DryRunButtonListener");
        Ok(Self { config, controller })
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - ButtonListener работает в режиме эмуляции");

        let trigger = self
            .config
            .trigger_button_code()
            .map_err(CcaError::Config)?;

        let mut cycle = interval(Duration::from_secs(10));

        loop {
            cycle.tick().await;

            info!("Dry-run: эмулируем удержание кнопки-триггера (2с)");

            let press = ButtonEvent::new(
                ButtonCode(trigger),
                ButtonState::Pressed,
                "dry-run".to_string(),
            );
            if let Err(e) = self.controller.handle_button_event(&press) {
                error!("Ошибка обработки эмулированного нажатия: {}", e);
                continue;
            }

            sleep(Duration::from_secs(2)).await;

            let release = ButtonEvent::new(
                ButtonCode(trigger),
                ButtonState::Released,
                "dry-run".to_string(),
            );
            if let Err(e) = self.controller.handle_button_event(&release) {
                error!("Ошибка обработки эмулированного отпускания: {}", e);
            }
        }
    }
}

#[async_trait::async_trait]
impl ButtonListenerTrait for DryRunButtonListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
