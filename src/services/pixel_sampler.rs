use crate::error::{CcaError, Result};
use crate::events::{ColourSample, DisplayRect, Rgb, SamplePoint};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Смещения точек выборки относительно центра экрана.
///
/// Кластер из 10 точек в форме плюса: центр, четыре ортогональных
/// соседа, четыре диагональных соседа и одна точка двумя строками ниже
/// центра. Порог детекции (tolerance) подобран под кластер именно такого
/// размера - при изменении набора смещений порог нужно перепроверять.
const DEFAULT_CLUSTER_OFFSETS: [(i32, i32); 10] = [
    (0, 0),
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
    (0, 2),
];

/// Trait for pixel samplers that can run in different modes
pub trait PixelSamplerTrait: Send + Sync {
    /// Capture the current colours of the configured sample points
    fn sample(&self) -> Result<ColourSample>;
}

/// Factory function to create an appropriate pixel sampler based on the dry_run flag
pub fn create_pixel_sampler(dry_run: bool) -> Result<Arc<dyn PixelSamplerTrait>> {
    if dry_run {
        Ok(Arc::new(DryRunPixelSampler::new()))
    } else {
        Ok(Arc::new(ScreenPixelSampler::new()?))
    }
}

// Handle захвата xcap не разделяется между потоками: каждый поток
// лениво создаёт свой экземпляр и использует его до конца жизни потока.
thread_local! {
    static CAPTURE_HANDLE: RefCell<Option<xcap::Monitor>> = const { RefCell::new(None) };
}

/// Выборка цветов из центральной области основного монитора
pub struct ScreenPixelSampler {
    rect: DisplayRect,
    sample_points: Vec<SamplePoint>,
}

impl ScreenPixelSampler {
    pub fn new() -> Result<Self> {
        Self::with_offsets(&DEFAULT_CLUSTER_OFFSETS)
    }

    pub fn with_offsets(offsets: &[(i32, i32)]) -> Result<Self> {
        let rect = Self::primary_display_rect()?;
        let sample_points = compute_sample_points(rect, offsets);

        info!(
            "PixelSampler инициализирован: монитор {}x{} @ ({}, {}), {} точек выборки",
            rect.width,
            rect.height,
            rect.left,
            rect.top,
            sample_points.len()
        );

        Ok(Self {
            rect,
            sample_points,
        })
    }

    #[allow(dead_code)]
    pub fn sample_points(&self) -> &[SamplePoint] {
        &self.sample_points
    }

    /// Геометрия основного монитора как {left, top, width, height}
    fn primary_display_rect() -> Result<DisplayRect> {
        Self::with_thread_handle(|monitor| {
            let left = monitor
                .x()
                .map_err(|e| CcaError::Capture(format!("Не удалось прочитать x монитора: {}", e)))?;
            let top = monitor
                .y()
                .map_err(|e| CcaError::Capture(format!("Не удалось прочитать y монитора: {}", e)))?;
            let width = monitor.width().map_err(|e| {
                CcaError::Capture(format!("Не удалось прочитать ширину монитора: {}", e))
            })?;
            let height = monitor.height().map_err(|e| {
                CcaError::Capture(format!("Не удалось прочитать высоту монитора: {}", e))
            })?;

            Ok(DisplayRect::new(left, top, width, height))
        })
    }

    fn find_primary_monitor() -> Result<xcap::Monitor> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| CcaError::Capture(format!("Не удалось перечислить мониторы: {}", e)))?;

        monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or_else(|| CcaError::Capture("Основной монитор не найден".to_string()))
    }

    fn with_thread_handle<T>(f: impl FnOnce(&xcap::Monitor) -> Result<T>) -> Result<T> {
        CAPTURE_HANDLE.with(|cell| {
            let mut slot = cell.borrow_mut();

            if slot.is_none() {
                debug!("Создание handle захвата для текущего потока");
                *slot = Some(Self::find_primary_monitor()?);
            }

            match slot.as_ref() {
                Some(monitor) => f(monitor),
                None => Err(CcaError::Internal(
                    "Потоковый handle захвата не инициализирован".to_string(),
                )),
            }
        })
    }

    /// Захватить цвет одного пикселя (регион 1x1)
    fn grab_pixel(&self, point: SamplePoint) -> Result<Rgb> {
        // Точка могла уйти за край экрана после смены разрешения
        if !self.rect.contains(point) {
            return CcaError::capture(format!("Точка выборки {} вне экрана", point));
        }

        let rel_x = (point.x - self.rect.left) as u32;
        let rel_y = (point.y - self.rect.top) as u32;

        Self::with_thread_handle(|monitor| {
            let image = monitor.capture_region(rel_x, rel_y, 1, 1).map_err(|e| {
                CcaError::Capture(format!("Не удалось захватить пиксель {}: {}", point, e))
            })?;

            let pixel = image.get_pixel(0, 0);
            Ok(Rgb::new(pixel[0], pixel[1], pixel[2]))
        })
    }
}

impl PixelSamplerTrait for ScreenPixelSampler {
    fn sample(&self) -> Result<ColourSample> {
        let mut colours = ColourSample::new();

        for point in &self.sample_points {
            colours.push(self.grab_pixel(*point)?);
        }

        Ok(colours)
    }
}

/// Вычислить абсолютные точки выборки: центр экрана плюс смещения кластера
fn compute_sample_points(rect: DisplayRect, offsets: &[(i32, i32)]) -> Vec<SamplePoint> {
    let (centre_x, centre_y) = rect.centre();

    offsets
        .iter()
        .map(|(dx, dy)| SamplePoint::new(centre_x + dx, centre_y + dy))
        .collect()
}

/// Эмуляция выборки для dry-run режима: цвет кластера периодически
/// меняется, чтобы прогнать цикл детекции без реального захвата экрана
pub struct DryRunPixelSampler {
    calls: AtomicUsize,
}

impl DryRunPixelSampler {
    const PHASE_LENGTH: usize = 100;

    pub fn new() -> Self {
        info!("Dry-run режим - PixelSampler работает в режиме эмуляции");
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl PixelSamplerTrait for DryRunPixelSampler {
    fn sample(&self) -> Result<ColourSample> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let colour = if (call / Self::PHASE_LENGTH) % 2 == 0 {
            Rgb::new(10, 10, 10)
        } else {
            Rgb::new(200, 10, 10)
        };

        Ok(std::iter::repeat(colour)
            .take(DEFAULT_CLUSTER_OFFSETS.len())
            .collect())
    }
}
