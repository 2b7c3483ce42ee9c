use crate::events::Rgb;

/// Решает, изменился ли кластер пикселей достаточно сильно.
///
/// Пиксель считается изменившимся, когда манхэттенское расстояние между
/// базовым и текущим цветом превышает tolerance. Общий результат - true,
/// как только число изменившихся пикселей достигает min_changed_pixels.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    tolerance: u32,
    min_changed_pixels: usize,
}

impl ChangeDetector {
    pub fn new(tolerance: u32, min_changed_pixels: usize) -> Self {
        Self {
            tolerance,
            min_changed_pixels,
        }
    }

    /// Сравнить текущую выборку с базовой.
    ///
    /// Последовательности считаются одинаковой длины и позиционно
    /// выровненными по точкам кластера - это ответственность вызывающего.
    pub fn has_changed(&self, baseline: &[Rgb], current: &[Rgb]) -> bool {
        self.has_changed_pairs(baseline.iter().copied().zip(current.iter().copied()))
    }

    /// Итераторное ядро сравнения: прерывает обход, как только счётчик
    /// изменившихся пикселей достигает порога
    pub fn has_changed_pairs<I>(&self, pairs: I) -> bool
    where
        I: IntoIterator<Item = (Rgb, Rgb)>,
    {
        let mut changes = 0;

        for (base, cur) in pairs {
            if base.delta(cur) > self.tolerance {
                changes += 1;
                if changes >= self.min_changed_pixels {
                    return true;
                }
            }
        }

        false
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(18, 1)
    }
}
