use crate::error::{CcaError, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use tracing::{info, warn};

/// Проверить права доступа к необходимым ресурсам
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    // Чтение событий мыши требует доступа к /dev/input/
    check_input_devices_access()?;

    // Инъекция клавиш требует доступа к /dev/uinput
    check_uinput_access()?;

    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    let input_dir = "/dev/input";

    if !std::path::Path::new(input_dir).exists() {
        return Err(CcaError::Permission(format!(
            "Директория {} не существует",
            input_dir
        )));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir);
            Ok(())
        }
        Err(e) => Err(CcaError::Permission(format!(
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir, e
        ))),
    }
}

fn check_uinput_access() -> Result<()> {
    let uinput_device = "/dev/uinput";

    if !std::path::Path::new(uinput_device).exists() {
        warn!(
            "{} не существует, возможно модуль uinput не загружен (sudo modprobe uinput)",
            uinput_device
        );
        return Ok(());
    }

    match fs::metadata(uinput_device) {
        Ok(metadata) => {
            let mode = metadata.permissions().mode();

            // Обычно 660 или 666
            if mode & 0o006 == 0 && mode & 0o060 == 0 {
                return Err(CcaError::Permission(format!(
                    "Нет прав доступа к {}. Добавьте пользователя в группу 'uinput' или 'input'",
                    uinput_device
                )));
            }

            info!("Доступ к {} подтвержден", uinput_device);
            Ok(())
        }
        Err(e) => Err(CcaError::Permission(format!(
            "Не удалось проверить права доступа к {}: {}",
            uinput_device, e
        ))),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Рекомендуется: sudo usermod -a -G input,uinput $USER");
            warn!("   и запуск от имени обычного пользователя");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}
