//! Sheep physics: integration, speed limits and body contact

/// Outcome of separating two overlapping bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResolution {
    pub a_pos: (f32, f32),
    pub b_pos: (f32, f32),
    pub a_vel: (f32, f32),
    pub b_vel: (f32, f32),
}

/// Physics system for updating sheep positions and velocities
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance position by velocity, then apply drag and the speed cap.
    /// Returns (new_x, new_y, new_vel_x, new_vel_y)
    pub fn integrate(
        x: f32,
        y: f32,
        vel_x: f32,
        vel_y: f32,
        drag: f32,
        max_speed: f32,
        dt: f32,
    ) -> (f32, f32, f32, f32) {
        let new_x = x + vel_x * dt;
        let new_y = y + vel_y * dt;

        let (new_vel_x, new_vel_y) = Self::clamp_speed(vel_x * drag, vel_y * drag, max_speed);

        (new_x, new_y, new_vel_x, new_vel_y)
    }

    /// Rescale (never per-axis clip) a velocity down to `max_speed`.
    pub fn clamp_speed(vel_x: f32, vel_y: f32, max_speed: f32) -> (f32, f32) {
        let speed = (vel_x * vel_x + vel_y * vel_y).sqrt();
        if speed > max_speed {
            let scale = max_speed / speed;
            (vel_x * scale, vel_y * scale)
        } else {
            (vel_x, vel_y)
        }
    }

    /// Keep a body inside the world rectangle, reflecting and damping the
    /// velocity component that hit the wall.
    pub fn bounce_off_walls(
        x: f32,
        y: f32,
        vel_x: f32,
        vel_y: f32,
        radius: f32,
        width: f32,
        height: f32,
        restitution: f32,
    ) -> (f32, f32, f32, f32) {
        let (mut x, mut y, mut vel_x, mut vel_y) = (x, y, vel_x, vel_y);

        if x < radius {
            x = radius;
            vel_x *= -restitution;
        } else if x > width - radius {
            x = width - radius;
            vel_x *= -restitution;
        }

        if y < radius {
            y = radius;
            vel_y *= -restitution;
        } else if y > height - radius {
            y = height - radius;
            vel_y *= -restitution;
        }

        (x, y, vel_x, vel_y)
    }

    /// Check whether two bodies are closer than `min_dist`
    pub fn check_overlap(x1: f32, y1: f32, x2: f32, y2: f32, min_dist: f32) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        dx * dx + dy * dy < min_dist * min_dist
    }

    /// Push two overlapping bodies apart along their normal, half each, and
    /// cancel part of their closing speed.
    pub fn resolve_contact(
        a: (f32, f32, f32, f32),
        b: (f32, f32, f32, f32),
        min_dist: f32,
        restitution: f32,
    ) -> Option<ContactResolution> {
        let (x1, y1, vx1, vy1) = a;
        let (x2, y2, vx2, vy2) = b;

        let dx = x2 - x1;
        let dy = y2 - y1;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist >= min_dist {
            return None; // No contact
        }

        let (nx, ny) = if dist < 0.001 {
            // Stacked on the same spot, push apart along x
            (1.0, 0.0)
        } else {
            (dx / dist, dy / dist)
        };

        let push = (min_dist - dist) * 0.5;
        let a_pos = (x1 - nx * push, y1 - ny * push);
        let b_pos = (x2 + nx * push, y2 + ny * push);

        let contact_vel = (vx2 - vx1) * nx + (vy2 - vy1) * ny;
        let (a_vel, b_vel) = if contact_vel < 0.0 {
            let impulse = -contact_vel * restitution * 0.5;
            (
                (vx1 - nx * impulse, vy1 - ny * impulse),
                (vx2 + nx * impulse, vy2 + ny * impulse),
            )
        } else {
            ((vx1, vy1), (vx2, vy2))
        };

        Some(ContactResolution {
            a_pos,
            b_pos,
            a_vel,
            b_vel,
        })
    }

    /// Sample `samples` points on the body's rim; on the first one inside
    /// terrain, step away from it and damp the velocity.
    /// Returns the corrected (x, y, vel_x, vel_y) if a sample hit.
    pub fn correct_against_terrain(
        x: f32,
        y: f32,
        vel_x: f32,
        vel_y: f32,
        radius: f32,
        samples: usize,
        push: f32,
        damping: f32,
        is_obstacle: impl Fn(f32, f32) -> bool,
    ) -> Option<(f32, f32, f32, f32)> {
        let step = std::f32::consts::TAU / samples as f32;
        (0..samples).find_map(|i| {
            let angle = i as f32 * step;
            let check_x = x + angle.cos() * radius;
            let check_y = y + angle.sin() * radius;
            if !is_obstacle(check_x, check_y) {
                return None;
            }

            let dx = x - check_x;
            let dy = y - check_y;
            let len = (dx * dx + dy * dy).sqrt().max(1e-9);
            Some((
                x + dx / len * push,
                y + dy / len * push,
                vel_x * damping,
                vel_y * damping,
            ))
        })
    }
}
