use rand::Rng;

/// Pixels per tick the CPU paddle can travel.
pub const CPU_SPEED: f64 = 4.0;
// Exclusive upper bound of the per-call tracking slack.
const MAX_SLACK: u32 = 15;

/// Next Y for the CPU paddle. Moves one `CPU_SPEED` step towards `ball_y`
/// unless the paddle already sits within a fresh random slack of it, so the
/// tracking jitters. Call once per tick.
pub fn guess_ball_position<R: Rng + ?Sized>(
    rng: &mut R,
    ball_y: f64,
    paddle_y: f64,
    paddle_height: f64,
    screen_height: f64,
    field_border_width: f64,
) -> f64 {
    let delta = rng.random_range(0..MAX_SLACK) as f64;
    let mut y = paddle_y;

    if y < ball_y - delta {
        y += CPU_SPEED;
    }

    if y > ball_y + delta {
        y -= CPU_SPEED;
    }

    keep_in_bounds(y, paddle_height, screen_height, field_border_width)
}

fn keep_in_bounds(y: f64, height: f64, screen_height: f64, field_border_width: f64) -> f64 {
    let max_y = screen_height - height - field_border_width;
    if y < 0.0 {
        return 0.0;
    }

    if y > max_y {
        return max_y;
    }

    y
}
