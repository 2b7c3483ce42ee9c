use crate::error::{CcaError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти подходящее указательное устройство (мышь с боковыми кнопками)
    pub fn find_pointer_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                CcaError::device_not_found(format!(
                    "Указанное устройство не найдено: {:?}",
                    path
                ))
            };
        }

        Self::auto_find_pointer()
    }

    fn auto_find_pointer() -> Result<PathBuf> {
        info!("Начинаем автопоиск указательного устройства...");

        if let Ok(device) = Self::find_by_id() {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices() {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        CcaError::device_not_found(
            "Не удалось найти мышь с боковыми кнопками. \
             Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    fn find_by_id() -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");

        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return CcaError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| CcaError::Permission(format!("Нет доступа к /dev/input/by-id: {}", e)))?;

        let mut candidates = Vec::new();

        for entry in entries {
            let entry = entry.map_err(CcaError::Io)?;
            let path = entry.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");

            if name.contains("mouse") && name.contains("event") {
                debug!("Найдено потенциальное указательное устройство: {:?}", path);

                if Self::is_device_accessible(&path) {
                    candidates.push((path.clone(), name.to_string()));
                } else {
                    warn!("Устройство {:?} недоступно", path);
                }
            }
        }

        let mut pointers = Vec::new();

        for (path, name) in candidates {
            // Клавиатуры с составными именами тоже содержат "event" - отсеиваем
            if name.contains("kbd") || name.contains("keyboard") {
                debug!("Исключаем как клавиатуру: {} -> {}", name, path.display());
                continue;
            }

            if Self::is_pointer_device(&path)? {
                let priority = if Self::has_side_buttons(&path) {
                    100 // Высший приоритет: есть боковые кнопки, ради них мы и здесь
                } else if name.ends_with("event-mouse") {
                    50
                } else {
                    10
                };

                pointers.push((path, priority));
            } else {
                debug!("Устройство не прошло проверку как мышь: {}", name);
            }
        }

        pointers.sort_by(|a, b| b.1.cmp(&a.1));

        if let Some((pointer, priority)) = pointers.into_iter().next() {
            info!("Выбрана мышь: {:?} (приоритет: {})", pointer, priority);
            Ok(pointer)
        } else {
            CcaError::device_not_found("Указательное устройство не найдено в by-id")
        }
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let input_dir = Path::new("/dev/input");

        let entries = fs::read_dir(input_dir)
            .map_err(|e| CcaError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices = Vec::new();

        for entry in entries {
            let entry = entry.map_err(CcaError::Io)?;
            let path = entry.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");

            if name.starts_with("event") {
                event_devices.push(path);
            }
        }

        event_devices.sort();

        // Среди всех мышей предпочитаем ту, что реально сообщает боковые кнопки
        let mut fallback = None;

        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);

            if !Self::is_device_accessible(&device_path) {
                continue;
            }

            if Self::is_pointer_device(&device_path)? {
                if Self::has_side_buttons(&device_path) {
                    return Ok(device_path);
                }
                fallback.get_or_insert(device_path);
            }
        }

        match fallback {
            Some(path) => {
                warn!(
                    "Мышь {:?} не сообщает боковые кнопки - события триггера могут не приходить",
                    path
                );
                Ok(path)
            }
            None => CcaError::device_not_found(
                "Не найдена доступная мышь среди event устройств",
            ),
        }
    }

    fn is_pointer_device(device_path: &Path) -> Result<bool> {
        match evdev::Device::open(device_path) {
            Ok(device) => {
                let device_name = device.name().unwrap_or("Unknown").to_lowercase();

                if device_name.contains("keyboard") || device_name.contains("kbd") {
                    debug!(
                        "Исключаем устройство как клавиатуру: {:?} ({})",
                        device_path, device_name
                    );
                    return Ok(false);
                }

                // Мышь обязана сообщать хотя бы левую кнопку
                let has_buttons = device.supported_keys().map_or(false, |keys| {
                    keys.contains(evdev::KeyCode::BTN_LEFT)
                });

                if has_buttons {
                    info!("Устройство {:?} подходит как мышь", device_path);
                    debug!("Имя устройства: {:?}", device.name());
                }

                Ok(has_buttons)
            }
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                Ok(false)
            }
        }
    }

    fn has_side_buttons(device_path: &Path) -> bool {
        match evdev::Device::open(device_path) {
            Ok(device) => device.supported_keys().map_or(false, |keys| {
                keys.contains(evdev::KeyCode::BTN_SIDE)
                    || keys.contains(evdev::KeyCode::BTN_EXTRA)
            }),
            Err(_) => false,
        }
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}
