use std::time::Duration;

use image::RgbaImage;
use sef_core::lao::AnimationInfo;

use crate::surface::Rect;

/// A looping animation stored as a vertical strip of equally tall frames.
#[derive(Debug, Clone)]
pub struct Animation {
    strip: RgbaImage,
    frame_height: u32,
    frame_duration: Duration,
    /// Top-left corner in map pixels.
    pub x: i32,
    pub y: i32,
}

impl Animation {
    pub fn new(strip: RgbaImage, info: AnimationInfo, x: i32, y: i32) -> Self {
        Self {
            strip,
            frame_height: u32::from(info.height),
            frame_duration: Duration::from_millis(u64::from(info.duration)),
            x,
            y,
        }
    }

    pub fn strip(&self) -> &RgbaImage {
        &self.strip
    }

    #[inline]
    pub fn frame_width(&self) -> u32 {
        self.strip.width()
    }

    #[inline]
    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Number of whole frames in the strip.
    pub fn frame_count(&self) -> u32 {
        if self.frame_height == 0 {
            0
        } else {
            self.strip.height() / self.frame_height
        }
    }

    /// Frame shown after `elapsed` since the level started. A zero duration
    /// pins the first frame.
    pub fn frame_at(&self, elapsed: Duration) -> u32 {
        let count = self.frame_count();
        if count == 0 || self.frame_duration.is_zero() {
            return 0;
        }
        let step = elapsed.as_millis() / self.frame_duration.as_millis();
        (step % u128::from(count)) as u32
    }

    /// Region of the strip holding `frame`.
    pub fn frame_rect(&self, frame: u32) -> Rect {
        Rect::new(
            0,
            (frame * self.frame_height) as i32,
            self.frame_width(),
            self.frame_height,
        )
    }

    /// Map-space bounds of one frame.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.frame_width(), self.frame_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animation(frames: u32, height: u16, duration: u16) -> Animation {
        let strip = RgbaImage::new(8, frames * u32::from(height));
        Animation::new(strip, AnimationInfo { height, duration }, 10, 20)
    }

    #[test]
    fn frames_advance_with_elapsed_time() {
        let anim = animation(4, 16, 100);
        assert_eq!(anim.frame_count(), 4);
        assert_eq!(anim.frame_at(Duration::ZERO), 0);
        assert_eq!(anim.frame_at(Duration::from_millis(99)), 0);
        assert_eq!(anim.frame_at(Duration::from_millis(250)), 2);
        assert_eq!(anim.frame_at(Duration::from_millis(400)), 0);
        assert_eq!(anim.frame_at(Duration::from_millis(1_050)), 2);
        assert_eq!(anim.frame_rect(2), Rect::new(0, 32, 8, 16));
        assert_eq!(anim.bounds(), Rect::new(10, 20, 8, 16));
    }

    #[test]
    fn degenerate_tables_pin_the_first_frame() {
        assert_eq!(animation(3, 10, 0).frame_at(Duration::from_secs(5)), 0);
        let flat = Animation::new(
            RgbaImage::new(4, 4),
            AnimationInfo { height: 0, duration: 50 },
            0,
            0,
        );
        assert_eq!(flat.frame_count(), 0);
        assert_eq!(flat.frame_at(Duration::from_secs(1)), 0);
    }
}
