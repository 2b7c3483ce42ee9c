use crate::config::Config;
use crate::error::Result;
use crate::services::VirtualDevice;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Trait for key senders so the controller can be driven by a stub in tests
#[async_trait::async_trait]
pub trait KeySenderTrait: Send + Sync {
    /// Perform one press-then-release tap of the configured key
    async fn tap(&self) -> Result<()>;

    /// Release the key unconditionally (shutdown failsafe)
    fn release_failsafe(&self) -> Result<()>;
}

/// Отправляет нажатия клавиши с небольшими случайными задержками,
/// чтобы каденция выглядела человеческой.
///
/// Синтетический ввод с фиксированным интервалом - узнаваемая сигнатура,
/// поэтому обе задержки выбираются заново на каждый tap и никогда не
/// переиспользуются. Вся последовательность нажатие-отпускание
/// сериализуется мьютексом: два tap не могут перемежаться.
pub struct NaturalKeySender {
    virtual_device: Arc<VirtualDevice>,
    key_code: u16,
    press_delay_ms: (u64, u64),
    hold_ms: (u64, u64),
    tap_lock: Mutex<()>,
}

impl NaturalKeySender {
    pub fn new(config: &Config, virtual_device: Arc<VirtualDevice>) -> Result<Self> {
        let key_code = config.output_key_code()?;

        info!(
            "Инициализация NaturalKeySender: клавиша '{}' (код {})",
            config.output.key, key_code
        );

        Ok(Self {
            virtual_device,
            key_code,
            press_delay_ms: (config.output.press_delay_min_ms, config.output.press_delay_max_ms),
            hold_ms: (config.output.hold_min_ms, config.output.hold_max_ms),
            tap_lock: Mutex::new(()),
        })
    }

    /// Равномерная выборка задержки из диапазона [min, max] миллисекунд
    fn sample_delay(range_ms: (u64, u64)) -> Duration {
        let (min, max) = range_ms;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[async_trait::async_trait]
impl KeySenderTrait for NaturalKeySender {
    async fn tap(&self) -> Result<()> {
        let _guard = self.tap_lock.lock().await;

        let press_delay = Self::sample_delay(self.press_delay_ms);
        let hold = Self::sample_delay(self.hold_ms);

        debug!(
            "Tap клавиши {}: задержка {}мс, удержание {}мс",
            self.key_code,
            press_delay.as_millis(),
            hold.as_millis()
        );

        sleep(press_delay).await;
        self.virtual_device.press(self.key_code)?;
        sleep(hold).await;
        self.virtual_device.release(self.key_code)?;

        Ok(())
    }

    fn release_failsafe(&self) -> Result<()> {
        self.virtual_device.release(self.key_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn dry_sender() -> NaturalKeySender {
        let config = Config::default();
        let virtual_device = Arc::new(VirtualDevice::new("test-device", true).unwrap());
        NaturalKeySender::new(&config, virtual_device).unwrap()
    }

    #[test]
    fn test_sample_delay_stays_within_bounds() {
        for _ in 0..200 {
            let delay = NaturalKeySender::sample_delay((30, 80));
            assert!(delay >= Duration::from_millis(30));
            assert!(delay <= Duration::from_millis(80));
        }
    }

    #[test]
    fn test_sample_delay_varies_between_draws() {
        let draws: Vec<Duration> = (0..200)
            .map(|_| NaturalKeySender::sample_delay((10, 40)))
            .collect();

        let first = draws[0];
        assert!(
            draws.iter().any(|d| *d != first),
            "200 выборок задержки дали одно и то же значение"
        );
    }

    #[test]
    fn test_degenerate_range_is_allowed() {
        let delay = NaturalKeySender::sample_delay((25, 25));
        assert_eq!(delay, Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_tap_takes_at_least_minimum_delays() {
        let sender = dry_sender();

        let started = Instant::now();
        sender.tap().await.unwrap();
        let elapsed = started.elapsed();

        // Минимум: 30мс до нажатия + 10мс удержания
        assert!(
            elapsed >= Duration::from_millis(40),
            "tap завершился за {:?}",
            elapsed
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_taps_are_serialized() {
        let sender = Arc::new(dry_sender());

        let started = Instant::now();
        let first = {
            let sender = Arc::clone(&sender);
            tokio::spawn(async move { sender.tap().await })
        };
        let second = {
            let sender = Arc::clone(&sender);
            tokio::spawn(async move { sender.tap().await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        let elapsed = started.elapsed();

        // Два сериализованных tap не могут уложиться быстрее, чем
        // две суммы минимальных задержек
        assert!(
            elapsed >= Duration::from_millis(80),
            "параллельные tap перемежались: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_release_failsafe_succeeds_in_dry_run() {
        let sender = dry_sender();
        assert!(sender.release_failsafe().is_ok());
    }
}
