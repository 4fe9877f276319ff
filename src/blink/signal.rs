//! 睁眼比值计算
//!
//! 检测器本身是外部黑盒，这里只负责把它们的输出（眼部关键点、检测框）
//! 换算成分类器使用的标量比值。

use serde::{Deserialize, Serialize};

use crate::constants::EYE_LANDMARK_POINTS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 检测框尺寸（只关心宽高）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// 单眼 6 点 EAR
///
/// 公式: EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|)
/// - p1, p4: 眼角点（水平方向）
/// - p2, p3: 上眼睑点
/// - p5, p6: 下眼睑点
///
/// 眼角距离退化为 0 时返回 `None`。
pub fn eye_aspect_ratio(eye: &[Point; EYE_LANDMARK_POINTS]) -> Option<f64> {
    let horizontal = eye[0].distance(&eye[3]);
    if horizontal < 1e-6 {
        return None;
    }
    let vertical1 = eye[1].distance(&eye[5]);
    let vertical2 = eye[2].distance(&eye[4]);
    Some((vertical1 + vertical2) / (2.0 * horizontal))
}

/// 双眼 EAR 取平均；任一眼退化则整体无效
pub fn binocular_ear(
    left: &[Point; EYE_LANDMARK_POINTS],
    right: &[Point; EYE_LANDMARK_POINTS],
) -> Option<f64> {
    let left_ear = eye_aspect_ratio(left)?;
    let right_ear = eye_aspect_ratio(right)?;
    Some((left_ear + right_ear) / 2.0)
}

/// 眼部检测框总面积与面部面积之比
///
/// 未检测到眼睛或面部面积为 0 时返回 0。
pub fn eye_area_ratio(face: BoxSize, eyes: &[BoxSize]) -> f64 {
    let face_area = face.area();
    if eyes.is_empty() || face_area <= 0.0 {
        return 0.0;
    }
    let eye_area: f64 = eyes.iter().map(BoxSize::area).sum();
    eye_area / face_area
}

/// 把 12 个坐标值（x, y 交替）转为 6 个关键点
pub fn landmarks_from_coords(coords: &[f64]) -> Option<[Point; EYE_LANDMARK_POINTS]> {
    if coords.len() != EYE_LANDMARK_POINTS * 2 {
        return None;
    }
    let mut points = [Point::new(0.0, 0.0); EYE_LANDMARK_POINTS];
    for (point, pair) in points.iter_mut().zip(coords.chunks_exact(2)) {
        *point = Point::new(pair[0], pair[1]);
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_eye() -> [Point; 6] {
        [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 1.0),
            Point::new(3.0, 0.0),
            Point::new(2.0, -1.0),
            Point::new(1.0, -1.0),
        ]
    }

    fn closed_eye() -> [Point; 6] {
        [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, 0.1),
            Point::new(3.0, 0.0),
            Point::new(2.0, -0.1),
            Point::new(1.0, -0.1),
        ]
    }

    #[test]
    fn ear_matches_formula() {
        // (2 + 2) / (2 * 3)
        let ear = eye_aspect_ratio(&open_eye()).unwrap();
        assert!((ear - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn closed_eye_has_low_ear() {
        let ear = eye_aspect_ratio(&closed_eye()).unwrap();
        assert!(ear < 0.1);
    }

    #[test]
    fn degenerate_eye_returns_none() {
        let eye = [Point::new(1.0, 1.0); 6];
        assert!(eye_aspect_ratio(&eye).is_none());
        assert!(binocular_ear(&open_eye(), &eye).is_none());
    }

    #[test]
    fn binocular_averages_both_eyes() {
        let left = eye_aspect_ratio(&open_eye()).unwrap();
        let right = eye_aspect_ratio(&closed_eye()).unwrap();
        let both = binocular_ear(&open_eye(), &closed_eye()).unwrap();
        assert!((both - (left + right) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn area_ratio_sums_eye_boxes() {
        let face = BoxSize::new(100.0, 100.0);
        let eyes = [BoxSize::new(20.0, 10.0), BoxSize::new(30.0, 10.0)];
        assert!((eye_area_ratio(face, &eyes) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn area_ratio_is_zero_without_eyes_or_face() {
        assert_eq!(eye_area_ratio(BoxSize::new(100.0, 80.0), &[]), 0.0);
        assert_eq!(
            eye_area_ratio(BoxSize::new(0.0, 80.0), &[BoxSize::new(5.0, 5.0)]),
            0.0
        );
    }

    #[test]
    fn landmarks_require_twelve_coords() {
        assert!(landmarks_from_coords(&[0.0; 11]).is_none());
        let points = landmarks_from_coords(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]).unwrap();
        assert_eq!(points[5], Point::new(10.0, 11.0));
    }
}
