use glam::{Mat4, Vec2, Vec3};

/// Look-at camera with position, target, up vector, and vertical
/// field-of-view in degrees. Mutated in place by [`FreeFly`] every frame;
/// lives for the process duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::new(1.0, 1.0, 10.0),
            up: Vec3::Y,
            fov_y_degrees: 45.0,
        }
    }
}

impl Camera {
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Inverse view transform, recomputed from live state on every call.
    ///
    /// A degenerate camera (target on top of position, up parallel to the
    /// view direction) yields a best-effort non-finite matrix rather than a
    /// panic; rendering may look wrong for that frame but the process keeps
    /// running.
    pub fn view_inverse(&self) -> Mat4 {
        self.view_matrix().inverse()
    }
}

/// Per-frame input sample consumed by the free-fly controller.
///
/// The windowing layer translates raw key/mouse events into this; the
/// driver stays free of any windowing types.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub dt: f32,
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub boost: bool,
    /// Accumulated mouse-look delta in pixels since the last frame.
    pub look_delta: Vec2,
}

/// Free-fly camera controller: WASD-style translation moves position and
/// target together, mouse look re-aims the target around the position.
#[derive(Debug, Clone, Copy)]
pub struct FreeFly {
    pub speed: f32,
    pub boost_multiplier: f32,
    pub sensitivity: f32,
}

impl Default for FreeFly {
    fn default() -> Self {
        Self {
            speed: 10.0,
            boost_multiplier: 3.0,
            sensitivity: 0.003,
        }
    }
}

impl FreeFly {
    const PITCH_LIMIT: f32 = 89.0;

    pub fn apply(&self, camera: &mut Camera, input: &FrameInput) {
        self.translate(camera, input);
        self.look(camera, input.look_delta);
    }

    fn translate(&self, camera: &mut Camera, input: &FrameInput) {
        let mut step = self.speed * input.dt;
        if input.boost {
            step *= self.boost_multiplier;
        }

        let forward = camera.forward();
        let right = camera.right();

        let mut delta = Vec3::ZERO;
        if input.move_forward {
            delta += forward * step;
        }
        if input.move_backward {
            delta -= forward * step;
        }
        if input.move_right {
            delta += right * step;
        }
        if input.move_left {
            delta -= right * step;
        }
        if input.move_up {
            delta += camera.up * step;
        }
        if input.move_down {
            delta -= camera.up * step;
        }

        camera.position += delta;
        camera.target += delta;
    }

    fn look(&self, camera: &mut Camera, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }

        let offset = camera.target - camera.position;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }

        let dir = offset / distance;
        let mut yaw = dir.z.atan2(dir.x);
        let mut pitch = dir.y.asin();

        yaw += delta.x * self.sensitivity;
        pitch -= delta.y * self.sensitivity;
        pitch = pitch.clamp(
            -Self::PITCH_LIMIT.to_radians(),
            Self::PITCH_LIMIT.to_radians(),
        );

        let new_dir = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        camera.target = camera.position + new_dir * distance;
    }
}
