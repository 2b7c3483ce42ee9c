use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use services::{
    create_button_listener, create_pixel_sampler, KeySenderTrait, MonitorController,
    NaturalKeySender, VirtualDevice,
};

#[derive(Parser, Debug)]
#[command(name = "cca-rust")]
#[command(about = "Утилита для синтеза нажатий клавиш при изменении пикселей экрана")]
struct Args {
    /// Путь к файлу конфигурации (необязателен - есть значения по умолчанию)
    #[arg(short, long, default_value = "cca.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск CCA Rust v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Проверка прав доступа
    if !args.dry_run {
        utils::permissions::check_permissions()?;
    }

    // Инициализация компонентов: одно виртуальное устройство, один сэмплер,
    // один контроллер мониторинга
    let virtual_device = Arc::new(VirtualDevice::new("CCA-Rust Virtual Device", args.dry_run)?);
    let pixel_sampler = create_pixel_sampler(args.dry_run)?;
    let key_sender: Arc<dyn KeySenderTrait> =
        Arc::new(NaturalKeySender::new(&config, virtual_device)?);
    let controller = Arc::new(MonitorController::new(
        config.clone(),
        pixel_sampler,
        Arc::clone(&key_sender),
    )?);
    let button_listener = create_button_listener(config.clone(), controller.clone(), args.dry_run)?;

    info!("Все компоненты инициализированы");

    // Слушатель кнопок - единственный долгоживущий сервис
    let mut listener_handle = tokio::spawn(async move { button_listener.run().await });

    info!("Сервис запущен, ожидаем удержание кнопки-триггера");

    // Ожидание сигнала завершения; преждевременный выход слушателя фатален
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
        }
        result = &mut listener_handle => {
            match result {
                Ok(Ok(())) => error!("Слушатель кнопок неожиданно завершился"),
                Ok(Err(e)) => error!("Фатальная ошибка слушателя кнопок: {}", e),
                Err(e) => error!("Задача слушателя аварийно завершилась: {}", e),
            }
            controller.shutdown().await;
            anyhow::bail!("слушатель событий ввода завершился преждевременно");
        }
    }

    info!("Завершение работы...");

    // Корректная остановка мониторинга с ожиданием цикла опроса
    controller.shutdown().await;

    // Дополнительно гарантируем отсутствие залипшей клавиши
    if let Err(e) = key_sender.release_failsafe() {
        warn!("Не удалось выполнить финальное отпускание клавиши: {}", e);
    }

    // Прерываем задачу слушателя и ждём её завершения (с таймаутом)
    listener_handle.abort();

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = listener_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("CCA Rust завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
