//! Contracts with the host firmware
//!
//! The driver does not own a timer or a publishing fabric. It registers the
//! cadence it wants with a [`Schedule`] once and pushes each converted value
//! into a [`Publish`] sink; the host calls [`crate::Ltr329::sample`] on every
//! tick.

/// Receives converted illuminance values, fire-and-forget
pub trait Publish {
    /// Publish `lux` under the sensor's key
    fn publish(&mut self, key: &'static str, lux: f32);
}

impl<F> Publish for F
where
    F: FnMut(&'static str, f32),
{
    fn publish(&mut self, key: &'static str, lux: f32) {
        self(key, lux)
    }
}

/// Host scheduler that will call back into the driver periodically
pub trait Schedule {
    /// Arrange for [`crate::Ltr329::sample`] to be called every `interval_ms`
    fn register_periodic(&mut self, interval_ms: u32);
}

impl<F> Schedule for F
where
    F: FnMut(u32),
{
    fn register_periodic(&mut self, interval_ms: u32) {
        self(interval_ms)
    }
}
