use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Цвет пикселя в пространстве RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Манхэттенское расстояние между двумя цветами
    /// (сумма модулей разностей по каналам)
    pub fn delta(&self, other: Rgb) -> u32 {
        u32::from(self.r.abs_diff(other.r))
            + u32::from(self.g.abs_diff(other.g))
            + u32::from(self.b.abs_diff(other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Упорядоченная выборка цветов, по одному на каждую точку кластера.
/// Индекс i в двух выборках всегда относится к одной и той же точке.
pub type ColourSample = SmallVec<[Rgb; 10]>;

/// Абсолютная экранная координата точки выборки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplePoint {
    pub x: i32,
    pub y: i32,
}

impl SamplePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for SamplePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Ограничивающий прямоугольник основного монитора
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl DisplayRect {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Центр прямоугольника (целочисленное деление)
    pub fn centre(&self) -> (i32, i32) {
        (
            self.left + (self.width / 2) as i32,
            self.top + (self.height / 2) as i32,
        )
    }

    pub fn contains(&self, point: SamplePoint) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x < self.left + self.width as i32
            && point.y < self.top + self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_manhattan_distance() {
        let a = Rgb::new(10, 20, 30);
        let b = Rgb::new(15, 10, 30);

        assert_eq!(a.delta(b), 15);
        assert_eq!(b.delta(a), 15);
    }

    #[test]
    fn test_delta_of_identical_colours_is_zero() {
        let colour = Rgb::new(128, 64, 255);
        assert_eq!(colour.delta(colour), 0);
    }

    #[test]
    fn test_delta_does_not_overflow_on_extremes() {
        let black = Rgb::new(0, 0, 0);
        let white = Rgb::new(255, 255, 255);

        assert_eq!(black.delta(white), 765);
    }

    #[test]
    fn test_rect_centre_uses_integer_division() {
        let rect = DisplayRect::new(0, 0, 1921, 1081);
        assert_eq!(rect.centre(), (960, 540));
    }

    #[test]
    fn test_rect_centre_respects_origin_offset() {
        let rect = DisplayRect::new(-1920, 100, 1920, 1080);
        assert_eq!(rect.centre(), (-960, 640));
    }

    #[test]
    fn test_rect_contains() {
        let rect = DisplayRect::new(0, 0, 100, 100);

        assert!(rect.contains(SamplePoint::new(0, 0)));
        assert!(rect.contains(SamplePoint::new(99, 99)));
        assert!(!rect.contains(SamplePoint::new(100, 50)));
        assert!(!rect.contains(SamplePoint::new(-1, 50)));
    }
}
