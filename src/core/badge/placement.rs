// Fixed recipe for laying the display name onto a badge face.

use super::scene::{Transform, Vec3};

/// Text may cover at most this share of the badge width.
pub const MAX_TEXT_WIDTH_RATIO: f32 = 0.75;

/// Uniform in-plane scale that fits `text_width` into the badge.
pub fn text_scale_factor(badge_width: f32, text_width: f32) -> f32 {
    let max_width = badge_width * MAX_TEXT_WIDTH_RATIO;
    if text_width > max_width {
        max_width / text_width
    } else {
        1.0
    }
}

/// Transform for a text node of `text_size` laid on a badge of `badge_size` at `anchor`:
/// scaled down to fit, centered on its own bounds, pushed forward by half the badge depth and
/// down by a tenth of the badge height.
pub fn place_text(badge_size: Vec3, anchor: Vec3, text_size: Vec3) -> Transform {
    let factor = text_scale_factor(badge_size.x, text_size.x);
    Transform {
        scale: Vec3::new(factor, factor, 1.0),
        origin: -(text_size * 0.5),
        position: anchor + Vec3::new(0.0, -badge_size.y / 10.0, badge_size.z / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_text_is_scaled_down() {
        assert!((text_scale_factor(10.0, 20.0) - 0.375).abs() < f32::EPSILON);
    }

    #[test]
    fn test_narrow_text_keeps_size() {
        assert_eq!(text_scale_factor(10.0, 5.0), 1.0);
        assert_eq!(text_scale_factor(10.0, 7.5), 1.0);
    }

    #[test]
    fn test_place_text_offsets() {
        let badge = Vec3::new(10.0, 4.0, 2.0);
        let anchor = Vec3::new(1.0, 1.0, 0.0);
        let text = Vec3::new(20.0, 1.0, 2.0);

        let t = place_text(badge, anchor, text);

        assert_eq!(t.scale.z, 1.0);
        assert!((t.scale.x - 0.375).abs() < 1e-6);
        assert_eq!(t.scale.x, t.scale.y);
        assert_eq!(t.origin, Vec3::new(-10.0, -0.5, -1.0));
        assert!((t.position.x - 1.0).abs() < 1e-6);
        assert!((t.position.y - 0.6).abs() < 1e-6);
        assert!((t.position.z - 1.0).abs() < 1e-6);
    }
}
