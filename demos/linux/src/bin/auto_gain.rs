//! Automatic gain control example
//!
//! This example demonstrates how to:
//! - Change gain at runtime with `set_mode`
//! - Back off when channel 0 approaches saturation
//! - Step the gain up again in low light

use embedded_hal::delay::DelayNs;
use ltr329als::{Gain, IntegrationTime, Ltr329, MeasurementRate, Unmanaged};

// This example uses linux-embedded-hal for demonstration
use linux_embedded_hal::{Delay, I2cdev};

const SATURATION_THRESHOLD: u16 = (u16::MAX / 10) * 9; // 90% of full scale
const LOW_LIGHT_THRESHOLD: u16 = u16::MAX / 100; // 1% of full scale

const GAIN_STEPS: [Gain; 6] = [
    Gain::Gain1x,
    Gain::Gain2x,
    Gain::Gain4x,
    Gain::Gain8x,
    Gain::Gain48x,
    Gain::Gain96x,
];

struct AutoGainController {
    step: usize,
    stable_readings: u8,
    min_stable_readings: u8,
}

impl AutoGainController {
    fn new() -> Self {
        Self {
            step: 0,
            stable_readings: 0,
            min_stable_readings: 3,
        }
    }

    fn gain(&self) -> Gain {
        GAIN_STEPS[self.step]
    }

    /// Returns the new gain if it should change
    fn update(&mut self, ch0: u16) -> Option<Gain> {
        let next = if ch0 > SATURATION_THRESHOLD && self.step > 0 {
            Some(self.step - 1)
        } else if ch0 < LOW_LIGHT_THRESHOLD
            && self.stable_readings >= self.min_stable_readings
            && self.step + 1 < GAIN_STEPS.len()
        {
            Some(self.step + 1)
        } else {
            None
        };

        match next {
            Some(step) => {
                self.step = step;
                self.stable_readings = 0;
                Some(self.gain())
            }
            None => {
                self.stable_readings = self.stable_readings.saturating_add(1);
                None
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut delay = Delay;

    let mut sensor = Ltr329::new(Unmanaged(i2c));
    let mut agc = AutoGainController::new();

    println!("Initializing LTR-329ALS sensor with automatic gain control...");
    sensor.identify().map_err(|e| format!("{e:?}"))?;

    let mut interval_ms = 0;
    sensor
        .configure(&mut |ms: u32| interval_ms = ms)
        .map_err(|e| format!("{e:?}"))?;

    println!("- Initial gain: {:?}", agc.gain());
    println!("- Saturation threshold: {} counts", SATURATION_THRESHOLD);
    println!("- Low light threshold: {} counts", LOW_LIGHT_THRESHOLD);
    println!("Press Ctrl+C to exit\n");

    let mut reading_count = 0u32;

    loop {
        delay.delay_ms(interval_ms);

        let lux = match sensor.sample(&mut |_: &'static str, _: f32| {}) {
            Ok(lux) => lux,
            Err(e) => {
                println!("Sample failed: {e:?}");
                continue;
            }
        };
        reading_count += 1;

        let ch0 = sensor.registers().channels.ch0();
        println!(
            "Reading #{:3}: CH0: {:6} | Lux: {:8.2} | Gain: {:?}",
            reading_count,
            ch0,
            lux,
            agc.gain()
        );

        if let Some(gain) = agc.update(ch0) {
            println!("Switching gain to {:?}", gain);
            sensor
                .set_mode(
                    gain as u8,
                    IntegrationTime::Ms100 as u8,
                    MeasurementRate::Ms500 as u8,
                )
                .map_err(|e| format!("{e:?}"))?;
        }
    }
}
