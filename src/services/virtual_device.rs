use crate::error::{CcaError, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Виртуальная клавиатура uinput для инъекции синтетических нажатий.
/// Устройство разделяется между задачами через Arc, поэтому запись
/// сериализуется внутренним мьютексом.
pub struct VirtualDevice {
    device: Option<Mutex<uinput::Device>>,
    device_name: String,
    dry_run: bool,
}

impl VirtualDevice {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация VirtualDevice '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Mutex::new(Self::create_virtual_device(device_name)?))
        };

        Ok(Self {
            device,
            device_name: device_name.to_string(),
            dry_run,
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!(
            "Создание виртуального устройства uinput '{}' для инъекции клавиш",
            device_name
        );

        let virtual_device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    pub fn press(&self, key_code: u16) -> Result<()> {
        self.emit(key_code, 1)
    }

    pub fn release(&self, key_code: u16) -> Result<()> {
        self.emit(key_code, 0)
    }

    fn emit(&self, key_code: u16, value: i32) -> Result<()> {
        if self.dry_run {
            info!(
                "[DRY RUN] Виртуальное событие: KEY_{} -> {}",
                key_code, value
            );
            return Ok(());
        }

        if let Some(device) = &self.device {
            let mut device = device.lock();

            // Событие клавиши (EV_KEY)
            if let Err(e) = device.write(1, i32::from(key_code), value) {
                return Err(CcaError::Internal(format!(
                    "Не удалось отправить событие клавиши {}: {}",
                    key_code, e
                )));
            }

            // Синхронизация (EV_SYN)
            if let Err(e) = device.write(0, 0, 0) {
                return Err(CcaError::Internal(format!(
                    "Не удалось синхронизировать события: {}",
                    e
                )));
            }

            debug!("Виртуальное событие KEY_{} -> {} отправлено", key_code, value);
            Ok(())
        } else {
            Err(CcaError::Internal(
                "Виртуальное устройство недоступно".to_string(),
            ))
        }
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства '{}'", self.device_name);
        }
    }
}
