use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One synthetic sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub distance_cm: f64,
    pub temperature_c: f64,
    pub humidity_pct: u8,
}

impl std::fmt::Display for SensorReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dist: {:.1}cm, Temp: {:.1}°C, Hum: {}%",
            self.distance_cm, self.temperature_c, self.humidity_pct
        )
    }
}

/// Stand-in for the robot's sensors until a real link exists
pub struct SensorSimulator<R: Rng = StdRng> {
    rng: R,
}

impl SensorSimulator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SensorSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn sample(&mut self) -> SensorReading {
        SensorReading {
            distance_cm: self.rng.gen_range(5.0..200.0),
            temperature_c: self.rng.gen_range(10.0..40.0),
            humidity_pct: self.rng.gen_range(30..=80),
        }
    }
}
