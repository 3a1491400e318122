use rand::seq::SliceRandom;
use rand::Rng;

const SYMBOLS: [char; 6] = ['*', '+', '•', '✦', '✧', '◆'];
const BANNERS: [&str; 4] = ["APROVADO!", "EXCELENTE!", "MUITO BEM!", "PARABÉNS!"];

/// Seconds the confetti stays on screen.
const DURATION_SECS: f64 = 3.0;
const GRAVITY: f64 = 12.0;

/// A single piece of confetti
#[derive(Debug, Clone)]
pub struct Confetto {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
}

impl Confetto {
    fn spawn<R: Rng + ?Sized>(rng: &mut R, width: f64) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: rng.gen_range(-4.0..0.0),
            vel_x: rng.gen_range(-2.0..2.0),
            vel_y: rng.gen_range(0.5..3.0),
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
        }
    }

    fn update(&mut self, dt: f64) {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
    }
}

/// Confetti shown over the summary of a passed session
#[derive(Debug)]
pub struct Celebration {
    pub confetti: Vec<Confetto>,
    pub banner: &'static str,
    pub elapsed: f64,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            confetti: Vec::new(),
            banner: BANNERS[0],
            elapsed: 0.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.width = width as f64;
        self.height = height as f64;
        self.elapsed = 0.0;
        self.is_active = true;
        self.banner = BANNERS.choose(&mut rng).copied().unwrap_or(BANNERS[0]);

        let count = (width as usize / 2).clamp(10, 60);
        self.confetti = (0..count)
            .map(|_| Confetto::spawn(&mut rng, self.width))
            .collect();
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.confetti.clear();
    }

    /// Advances the animation by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }

        self.elapsed += dt;
        if self.elapsed >= DURATION_SECS {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.confetti.retain_mut(|c| {
            c.update(dt);
            c.y <= height + 1.0 && c.x >= -2.0 && c.x <= width + 2.0
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
