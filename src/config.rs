use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::mappings::{ButtonNameToEvdevCode, KeyNameToEvdevCode};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub detection: DetectionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
    pub trigger_button: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Максимальное манхэттенское расстояние цвета, ещё не считающееся изменением
    pub tolerance: u32,
    /// Сколько точек кластера должно измениться, чтобы сработал триггер
    pub min_changed_pixels: usize,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub key: String,
    pub press_delay_min_ms: u64,
    pub press_delay_max_ms: u64,
    pub hold_min_ms: u64,
    pub hold_max_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "cca_rust=info".to_string(),
            },
            input: InputConfig {
                device_path: "auto".to_string(),
                trigger_button: "extra".to_string(),
            },
            detection: DetectionConfig {
                tolerance: 18,
                min_changed_pixels: 1,
                poll_interval_ms: 20,
            },
            output: OutputConfig {
                key: "x".to_string(),
                press_delay_min_ms: 30,
                press_delay_max_ms: 80,
                hold_min_ms: 10,
                hold_max_ms: 40,
            },
        }
    }
}

impl Config {
    /// Загрузить конфигурацию: значения по умолчанию, затем TOML файл
    /// (если существует), затем переменные окружения CCA_*
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("CCA_"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация кнопки-триггера и эмитируемой клавиши
        if let Err(e) = ButtonNameToEvdevCode::translate(&self.input.trigger_button) {
            anyhow::bail!("Неверная кнопка-триггер: {}", e);
        }

        if let Err(e) = KeyNameToEvdevCode::translate(&self.output.key) {
            anyhow::bail!("Неверная эмитируемая клавиша: {}", e);
        }

        // Валидация настроек детекции
        if self.detection.min_changed_pixels == 0 {
            anyhow::bail!("min_changed_pixels должно быть больше 0");
        }

        if self.detection.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms должно быть больше 0");
        }

        // Валидация диапазонов задержек
        if self.output.press_delay_min_ms > self.output.press_delay_max_ms {
            anyhow::bail!(
                "press_delay_min_ms ({}) больше press_delay_max_ms ({})",
                self.output.press_delay_min_ms,
                self.output.press_delay_max_ms
            );
        }

        if self.output.hold_min_ms > self.output.hold_max_ms {
            anyhow::bail!(
                "hold_min_ms ({}) больше hold_max_ms ({})",
                self.output.hold_min_ms,
                self.output.hold_max_ms
            );
        }

        Ok(())
    }

    /// Код кнопки-триггера (валидируется при загрузке)
    pub fn trigger_button_code(&self) -> Result<u16> {
        ButtonNameToEvdevCode::translate(&self.input.trigger_button)
            .map_err(|e| anyhow::anyhow!(e))
    }

    /// Код эмитируемой клавиши (валидируется при загрузке)
    pub fn output_key_code(&self) -> Result<u16> {
        KeyNameToEvdevCode::translate(&self.output.key).map_err(|e| anyhow::anyhow!(e))
    }
}
