use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{ButtonEvent, ButtonState, ColourSample};
use crate::services::change_detector::ChangeDetector;
use crate::services::key_sender::KeySenderTrait;
use crate::services::pixel_sampler::PixelSamplerTrait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{error, info, warn};

/// Координирует выборку пикселей, детекцию изменений и эмиссию нажатий.
///
/// Машина состояний Inactive/Active: нажатие кнопки-триггера снимает
/// базовую выборку и запускает цикл опроса, отпускание останавливает его.
/// Инвариант: в любой момент активен не более одного цикла опроса.
pub struct MonitorController {
    sampler: Arc<dyn PixelSamplerTrait>,
    detector: ChangeDetector,
    sender: Arc<dyn KeySenderTrait>,
    trigger_button: u16,
    poll_interval: Duration,
    state: Arc<Mutex<MonitorState>>,
}

/// Состояние мониторинга под единственным мьютексом.
///
/// Счётчик session служит токеном циклу опроса: цикл, переживший свою
/// сессию, не может ни продолжить работу, ни перезаписать базовую
/// выборку более новой сессии.
#[derive(Default)]
struct MonitorState {
    monitoring: bool,
    session: u64,
    baseline: Option<ColourSample>,
    poll_task: Option<JoinHandle<()>>,
}

impl MonitorController {
    pub fn new(
        config: Arc<Config>,
        sampler: Arc<dyn PixelSamplerTrait>,
        sender: Arc<dyn KeySenderTrait>,
    ) -> Result<Self> {
        let trigger_button = config.trigger_button_code().map_err(crate::error::CcaError::Config)?;

        info!(
            "Инициализация MonitorController: триггер '{}' (код {}), интервал опроса {}мс",
            config.input.trigger_button, trigger_button, config.detection.poll_interval_ms
        );

        Ok(Self {
            sampler,
            detector: ChangeDetector::new(
                config.detection.tolerance,
                config.detection.min_changed_pixels,
            ),
            sender,
            trigger_button,
            poll_interval: Duration::from_millis(config.detection.poll_interval_ms),
            state: Arc::new(Mutex::new(MonitorState::default())),
        })
    }

    /// Обработка события кнопки мыши от слушателя
    pub fn handle_button_event(&self, event: &ButtonEvent) -> Result<()> {
        if event.code.value() != self.trigger_button {
            debug_if_enabled!("Событие не кнопки-триггера - игнорируется: {}", event);
            return Ok(());
        }

        match event.state {
            ButtonState::Pressed => self.begin_monitoring(),
            ButtonState::Released => {
                self.stop_monitoring();
                Ok(())
            }
        }
    }

    /// Начать мониторинг: снять базовую выборку и запустить цикл опроса.
    /// Повторное нажатие при активном мониторинге игнорируется.
    fn begin_monitoring(&self) -> Result<()> {
        let mut state = self.state.lock();

        if state.monitoring {
            debug_if_enabled!("Мониторинг уже активен - повторное нажатие игнорируется");
            return Ok(());
        }

        // Без валидного базового состояния сессия стартовать не может
        let baseline = self.sampler.sample()?;

        state.session += 1;
        state.monitoring = true;
        state.baseline = Some(baseline);

        let token = state.session;
        info!("Начало мониторинга (сессия #{})", token);

        let handle = tokio::spawn(Self::poll_task(
            Arc::clone(&self.state),
            Arc::clone(&self.sampler),
            self.detector,
            Arc::clone(&self.sender),
            self.poll_interval,
            token,
        ));
        state.poll_task = Some(handle);

        Ok(())
    }

    /// Остановить мониторинг. Остановка кооперативная: цикл опроса
    /// увидит сброшенный флаг на следующей проверке состояния.
    fn stop_monitoring(&self) {
        let mut state = self.state.lock();

        if !state.monitoring {
            debug_if_enabled!("Отпускание без активного мониторинга - игнорируется");
            return;
        }

        state.monitoring = false;
        state.baseline = None;
        state.poll_task.take();

        info!("Мониторинг остановлен (сессия #{})", state.session);
    }

    /// Корректная остановка при завершении процесса: сбросить состояние
    /// и дождаться выхода цикла опроса
    pub async fn shutdown(&self) {
        let task = {
            let mut state = self.state.lock();
            state.monitoring = false;
            state.baseline = None;
            state.poll_task.take()
        };

        if let Some(task) = task {
            info!("Ожидание завершения цикла опроса...");
            if timeout(Duration::from_secs(1), task).await.is_err() {
                warn!("Таймаут при ожидании завершения цикла опроса");
            }
        }
    }

    /// Цикл опроса: выборка - сравнение - сон, пока сессия активна.
    ///
    /// Захват и сон выполняются вне мьютекса состояния, чтобы
    /// конкурентное отпускание кнопки никогда не ждало медленный захват.
    async fn poll_task(
        state: Arc<Mutex<MonitorState>>,
        sampler: Arc<dyn PixelSamplerTrait>,
        detector: ChangeDetector,
        sender: Arc<dyn KeySenderTrait>,
        poll_interval: Duration,
        token: u64,
    ) {
        debug_if_enabled!(
            "Запуск цикла опроса (сессия #{}), интервал {}мс",
            token,
            poll_interval.as_millis()
        );

        let mut tick: u64 = 0;

        loop {
            let baseline = {
                let state = state.lock();
                if !state.monitoring || state.session != token {
                    break;
                }
                match state.baseline.clone() {
                    Some(baseline) => baseline,
                    None => break,
                }
            };

            tick += 1;

            let current = match sampler.sample() {
                Ok(current) => current,
                Err(e) => {
                    // Одиночный сбой захвата не фатален: считаем тик
                    // "без изменений" и продолжаем
                    debug_if_enabled!("Сбой выборки на тике #{}: {} - пропускаем", tick, e);
                    sleep(poll_interval).await;
                    continue;
                }
            };

            if detector.has_changed(&baseline, &current) {
                info!("Обнаружено изменение пикселей на тике #{} (сессия #{})", tick, token);

                if let Err(e) = sender.tap().await {
                    error!("Не удалось отправить нажатие клавиши: {}", e);
                }

                // Перебазирование: следующее сравнение идёт от только что
                // снятой выборки, а не от начала сессии - одно устойчивое
                // изменение даёт ровно один tap
                let mut state = state.lock();
                if state.monitoring && state.session == token {
                    state.baseline = Some(current);
                }
            }

            sleep(poll_interval).await;
        }

        debug_if_enabled!(
            "Цикл опроса (сессия #{}) завершён после {} тиков",
            token,
            tick
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CcaError;
    use crate::events::{ButtonCode, Rgb};
    use smallvec::smallvec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TRIGGER: u16 = 276; // BTN_EXTRA
    const OTHER: u16 = 272; // BTN_LEFT

    fn flat(colour: Rgb) -> ColourSample {
        smallvec![colour; 10]
    }

    fn press(code: u16) -> ButtonEvent {
        ButtonEvent::new(ButtonCode::new(code), ButtonState::Pressed, "test".to_string())
    }

    fn release(code: u16) -> ButtonEvent {
        ButtonEvent::new(ButtonCode::new(code), ButtonState::Released, "test".to_string())
    }

    /// Сэмплер по сценарию: выдаёт кадры по порядку, последний кадр
    /// повторяется; None в сценарии означает сбой захвата
    struct ScriptedSampler {
        frames: Vec<Option<ColourSample>>,
        calls: AtomicUsize,
    }

    impl ScriptedSampler {
        fn new(frames: Vec<Option<ColourSample>>) -> Arc<Self> {
            Arc::new(Self {
                frames,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PixelSamplerTrait for ScriptedSampler {
        fn sample(&self) -> crate::error::Result<ColourSample> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let idx = call.min(self.frames.len() - 1);
            match &self.frames[idx] {
                Some(frame) => Ok(frame.clone()),
                None => Err(CcaError::Capture("scripted failure".to_string())),
            }
        }
    }

    struct CountingSender {
        taps: AtomicUsize,
    }

    impl CountingSender {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                taps: AtomicUsize::new(0),
            })
        }

        fn taps(&self) -> usize {
            self.taps.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl KeySenderTrait for CountingSender {
        async fn tap(&self) -> crate::error::Result<()> {
            self.taps.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release_failsafe(&self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn controller(
        sampler: Arc<ScriptedSampler>,
        sender: Arc<CountingSender>,
    ) -> MonitorController {
        let mut config = Config::default();
        config.detection.poll_interval_ms = 10;

        MonitorController::new(Arc::new(config), sampler, sender).unwrap()
    }

    #[tokio::test]
    async fn test_idempotent_start() {
        let sampler = ScriptedSampler::new(vec![Some(flat(Rgb::new(10, 10, 10)))]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(TRIGGER)).unwrap();
        controller.handle_button_event(&press(TRIGGER)).unwrap();

        {
            let state = controller.state.lock();
            assert!(state.monitoring);
            assert_eq!(state.session, 1, "повторное нажатие запустило вторую сессию");
        }

        sleep(Duration::from_millis(80)).await;
        assert_eq!(sender.taps(), 0);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_other_buttons_are_ignored() {
        let sampler = ScriptedSampler::new(vec![Some(flat(Rgb::new(10, 10, 10)))]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(OTHER)).unwrap();

        let state = controller.state.lock();
        assert!(!state.monitoring);
        assert_eq!(sampler.calls(), 0, "чужая кнопка вызвала выборку");
    }

    #[tokio::test]
    async fn test_single_change_taps_once_and_rebases() {
        let baseline = flat(Rgb::new(10, 10, 10));
        let mut changed = baseline.clone();
        changed[9] = Rgb::new(200, 10, 10); // красный канал +190

        // Первый вызов - базовая выборка, дальше устойчиво новый кадр
        let sampler = ScriptedSampler::new(vec![Some(baseline), Some(changed.clone())]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(TRIGGER)).unwrap();
        sleep(Duration::from_millis(150)).await;

        assert_eq!(
            sender.taps(),
            1,
            "устойчивое изменение должно дать ровно один tap"
        );

        {
            let state = controller.state.lock();
            assert_eq!(
                state.baseline.as_deref(),
                Some(changed.as_slice()),
                "базовая выборка не перебазирована на момент изменения"
            );
        }

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_change_below_tolerance_never_taps() {
        let baseline = flat(Rgb::new(10, 10, 10));
        let mut drifted = baseline.clone();
        drifted[9] = Rgb::new(20, 10, 10); // дельта 10 < 18

        let sampler = ScriptedSampler::new(vec![Some(baseline), Some(drifted)]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(TRIGGER)).unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(sender.taps(), 0);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_release_stops_loop_within_one_cycle() {
        let sampler = ScriptedSampler::new(vec![Some(flat(Rgb::new(10, 10, 10)))]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(TRIGGER)).unwrap();
        sleep(Duration::from_millis(50)).await;

        controller.handle_button_event(&release(TRIGGER)).unwrap();
        let calls_at_release = sampler.calls();

        sleep(Duration::from_millis(100)).await;

        {
            let state = controller.state.lock();
            assert!(!state.monitoring);
            assert!(state.baseline.is_none(), "базовая выборка пережила остановку");
        }

        assert!(
            sampler.calls() <= calls_at_release + 1,
            "после отпускания цикл сделал больше одного полного прохода: {} -> {}",
            calls_at_release,
            sampler.calls()
        );
    }

    #[tokio::test]
    async fn test_release_without_session_is_noop() {
        let sampler = ScriptedSampler::new(vec![Some(flat(Rgb::new(10, 10, 10)))]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&release(TRIGGER)).unwrap();

        let state = controller.state.lock();
        assert!(!state.monitoring);
        assert_eq!(state.session, 0);
    }

    #[tokio::test]
    async fn test_failed_initial_capture_aborts_start() {
        let sampler = ScriptedSampler::new(vec![None]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        let result = controller.handle_button_event(&press(TRIGGER));
        assert!(result.is_err(), "старт без базовой выборки должен падать");

        let state = controller.state.lock();
        assert!(!state.monitoring);
        assert_eq!(state.session, 0);
    }

    #[tokio::test]
    async fn test_transient_capture_failures_are_tolerated() {
        let baseline = flat(Rgb::new(10, 10, 10));
        let mut changed = baseline.clone();
        changed[0] = Rgb::new(200, 10, 10);

        // Базовая выборка, два сбоя захвата, затем изменение
        let sampler = ScriptedSampler::new(vec![
            Some(baseline),
            None,
            None,
            Some(changed),
        ]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(TRIGGER)).unwrap();
        sleep(Duration::from_millis(150)).await;

        assert_eq!(
            sender.taps(),
            1,
            "сбои захвата не должны останавливать сессию"
        );

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_joins_poll_task() {
        let sampler = ScriptedSampler::new(vec![Some(flat(Rgb::new(10, 10, 10)))]);
        let sender = CountingSender::new();
        let controller = controller(Arc::clone(&sampler), Arc::clone(&sender));

        controller.handle_button_event(&press(TRIGGER)).unwrap();
        sleep(Duration::from_millis(30)).await;

        let started = std::time::Instant::now();
        controller.shutdown().await;

        assert!(
            started.elapsed() < Duration::from_secs(1),
            "shutdown упёрся в таймаут вместо кооперативного выхода"
        );

        let state = controller.state.lock();
        assert!(!state.monitoring);
        assert!(state.poll_task.is_none());
    }
}
