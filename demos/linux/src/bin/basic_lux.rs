//! Basic lux reading example
//!
//! This example demonstrates how to:
//! - Identify and configure the LTR-329ALS
//! - Pick gain, integration time and measurement rate
//! - Sample on the interval the driver asks for
//! - Print the register report

use embedded_hal::delay::DelayNs;
use ltr329als::{Gain, IntegrationTime, Ltr329, MeasurementRate, Unmanaged};

// This example uses linux-embedded-hal for demonstration
// Replace with your platform's I2C implementation
use linux_embedded_hal::{Delay, I2cdev};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize I2C interface
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut delay = Delay;

    // Create sensor instance
    let mut sensor = Ltr329::new(Unmanaged(i2c));

    println!("Identifying LTR-329ALS sensor...");
    sensor.identify().map_err(|e| format!("{e:?}"))?;

    // The driver asks for its sampling cadence once
    let mut interval_ms = 0;
    sensor
        .configure(&mut |ms: u32| interval_ms = ms)
        .map_err(|e| format!("{e:?}"))?;

    // 4x gain, 200ms integration, new data every 500ms
    sensor
        .set_mode(
            Gain::Gain4x as u8,
            IntegrationTime::Ms200 as u8,
            MeasurementRate::Ms500 as u8,
        )
        .map_err(|e| format!("{e:?}"))?;

    let mut report = String::new();
    sensor.report_all(&mut report)?;
    print!("{report}");

    println!("Sampling every {interval_ms}ms. Press Ctrl+C to exit\n");

    loop {
        delay.delay_ms(interval_ms);

        let mut publish = |key: &'static str, lux: f32| println!("{key}: {lux:8.2} lux");
        if let Err(e) = sensor.sample(&mut publish) {
            // the previous value stays valid, try again on the next tick
            println!("Sample failed: {e:?}");
        }
    }
}
