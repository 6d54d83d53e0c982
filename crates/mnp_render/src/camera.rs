//! 2D camera for a y-down pixel world.
//!
//! The game simulates in tilemap pixel coordinates where y grows downward
//! (the convention of the map and physics data), so the orthographic
//! projection places larger y at the bottom of the screen.

use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

pub struct Camera2D {
    pub position: Vec2,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            viewport: (viewport_width, viewport_height),
        }
    }

    /// Center the camera on a world position (camera follow).
    pub fn follow(&mut self, x: f32, y: f32) {
        self.position.x = x;
        self.position.y = y;
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half_w = (self.viewport.0 as f32) / 2.0;
        let half_h = (self.viewport.1 as f32) / 2.0;

        // y-down: world y increases toward the bottom edge of the viewport.
        let proj = Mat4::orthographic_rh(
            self.position.x - half_w,
            self.position.x + half_w,
            self.position.y + half_h,
            self.position.y - half_h,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_recenters_projection() {
        let mut camera = Camera2D::new(800, 400);
        camera.follow(108.0, 50.0);
        assert_eq!(camera.position, Vec2::new(108.0, 50.0));
    }

    #[test]
    fn world_below_center_maps_to_lower_ndc() {
        let camera = Camera2D::new(800, 400);
        let proj = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);
        let above = proj * glam::Vec4::new(0.0, -100.0, 0.0, 1.0);
        let below = proj * glam::Vec4::new(0.0, 100.0, 0.0, 1.0);
        // Larger world y (further down the map) must land lower on screen.
        assert!(below.y < above.y);
    }
}
