//! # LTR-329ALS Ambient Light Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the Lite-On LTR-329ALS digital ambient light
//! sensor, built using the [`embedded-hal`] traits for I2C communication.
//!
//! The LTR-329ALS is a dual photodiode light sensor that provides:
//! - Channel 0 (visible + IR) and channel 1 (IR only) 16-bit counts
//! - Programmable gain (1x to 96x)
//! - Programmable integration time (50ms to 400ms)
//! - Programmable measurement rate (50ms to 2000ms)
//! - I2C interface (address 0x29)
//!
//! ## Features
//!
//! - **Identify/configure sequence** checking manufacturer and part IDs
//! - **Lux calculation** with the datasheet's piecewise channel-ratio formula
//! - **Runtime reconfiguration** of gain, integration time and measurement rate
//! - **Diagnostic report** of the mirrored register file
//! - **defmt logging** with the `defmt-03` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ltr329als::{Gain, IntegrationTime, Ltr329, MeasurementRate, Unmanaged};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut sensor = Ltr329::new(Unmanaged(i2c));
//!
//! // Check that the chip is an LTR-329ALS
//! sensor.identify().unwrap();
//!
//! // Power it up; the host timer is armed once with the sampling interval
//! sensor
//!     .configure(&mut |interval_ms: u32| {
//!         // start a periodic timer calling `sample`
//! #       let _ = interval_ms;
//!     })
//!     .unwrap();
//!
//! // Configure measurement settings
//! sensor
//!     .set_mode(
//!         Gain::Gain4x as u8,
//!         IntegrationTime::Ms200 as u8,
//!         MeasurementRate::Ms500 as u8,
//!     )
//!     .unwrap();
//!
//! // On every tick
//! let lux = sensor
//!     .sample(&mut |key: &'static str, lux: f32| {
//!         // hand the value to whoever consumes it
//! #       let _ = (key, lux);
//!     })
//!     .unwrap();
//! # let _ = lux;
//! # }
//! ```
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

use core::fmt;

use embedded_hal::i2c::I2c;

pub mod host;
pub mod ll;

pub use host::{Publish, Schedule};
pub use ll::{
    BusTiming, ChannelData, Control, Endpoint, MeasRate, Mode, PartId, Register, Registers,
    Status, Unmanaged, I2C_ADDRESS,
};

use ll::{DeviceInterface, GAIN_MULTIPLIER, INTEGRATION_FRACTION, MANUFACTURER_ID, PART_NUMBER};

/// Light sensor gain settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Gain {
    /// 1x gain, 1 to 64k lux
    Gain1x = 0b000,
    /// 2x gain, 0.5 to 32k lux
    Gain2x = 0b001,
    /// 4x gain, 0.25 to 16k lux
    Gain4x = 0b010,
    /// 8x gain, 0.125 to 8k lux
    Gain8x = 0b011,
    /// 48x gain, 0.02 to 1.3k lux
    Gain48x = 0b110,
    /// 96x gain, 0.01 to 600 lux
    Gain96x = 0b111,
}

impl Gain {
    /// Amplification factor
    pub fn multiplier(self) -> f32 {
        f32::from(GAIN_MULTIPLIER[self as usize])
    }
}

impl TryFrom<u8> for Gain {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0b000 => Ok(Gain::Gain1x),
            0b001 => Ok(Gain::Gain2x),
            0b010 => Ok(Gain::Gain4x),
            0b011 => Ok(Gain::Gain8x),
            0b110 => Ok(Gain::Gain48x),
            0b111 => Ok(Gain::Gain96x),
            _ => Err(()),
        }
    }
}

/// Light sensor integration time settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 100ms, chip default
    Ms100 = 0b000,
    /// 50ms
    Ms50 = 0b001,
    /// 200ms
    Ms200 = 0b010,
    /// 400ms
    Ms400 = 0b011,
    /// 150ms
    Ms150 = 0b100,
    /// 250ms
    Ms250 = 0b101,
    /// 300ms
    Ms300 = 0b110,
    /// 350ms
    Ms350 = 0b111,
}

impl IntegrationTime {
    /// Integration time in units of 100ms
    pub fn fraction(self) -> f32 {
        INTEGRATION_FRACTION[self as usize]
    }
}

impl TryFrom<u8> for IntegrationTime {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0b000 => Ok(IntegrationTime::Ms100),
            0b001 => Ok(IntegrationTime::Ms50),
            0b010 => Ok(IntegrationTime::Ms200),
            0b011 => Ok(IntegrationTime::Ms400),
            0b100 => Ok(IntegrationTime::Ms150),
            0b101 => Ok(IntegrationTime::Ms250),
            0b110 => Ok(IntegrationTime::Ms300),
            0b111 => Ok(IntegrationTime::Ms350),
            _ => Err(()),
        }
    }
}

/// Light sensor measurement rate settings
///
/// Codes 6 and 7 are accepted by the chip and behave like [`MeasurementRate::Ms2000`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum MeasurementRate {
    /// 50ms measurement rate
    Ms50 = 0b000,
    /// 100ms measurement rate
    Ms100 = 0b001,
    /// 200ms measurement rate
    Ms200 = 0b010,
    /// 500ms measurement rate, chip default
    Ms500 = 0b011,
    /// 1000ms measurement rate
    Ms1000 = 0b100,
    /// 2000ms measurement rate
    Ms2000 = 0b101,
}

/// All possible errors in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// Identity registers do not belong to an LTR-329ALS
    WrongDevice {
        /// Expected register content
        expected: u8,
        /// Found register content
        found: u8,
    },
    /// Operation attempted before identify/configure succeeded
    InvalidState,
    /// Out of range or reserved gain, integration time or measurement rate
    InvalidParameter(&'static str),
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// 7-bit bus address
    pub address: u8,
    /// Speed and timeout applied to the endpoint during identification
    pub bus_timing: BusTiming,
    /// Interval registered with the host scheduler
    pub sample_interval_ms: u32,
    /// Key the illuminance is published under
    pub sensor_key: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: I2C_ADDRESS,
            bus_timing: BusTiming::default(),
            sample_interval_ms: 1000,
            sensor_key: "ltr329als",
        }
    }
}

impl Config {
    /// Use a different bus address
    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Use a different bus speed and timeout
    pub const fn with_bus_timing(mut self, bus_timing: BusTiming) -> Self {
        self.bus_timing = bus_timing;
        self
    }

    /// Use a different sampling interval
    pub const fn with_sample_interval_ms(mut self, sample_interval_ms: u32) -> Self {
        self.sample_interval_ms = sample_interval_ms;
        self
    }

    /// Publish under a different key
    pub const fn with_sensor_key(mut self, sensor_key: &'static str) -> Self {
        self.sensor_key = sensor_key;
        self
    }
}

/// Convert raw channel counts to lux.
///
/// Uses the datasheet's piecewise fit over the IR ratio `ch1 / (ch0 + ch1)`,
/// normalized by gain and integration time. Dark readings and readings with
/// a ratio of 0.85 or more give 0.
pub fn raw_to_lux(ch0: u16, ch1: u16, gain: Gain, time: IntegrationTime) -> f32 {
    let total = u32::from(ch0) + u32::from(ch1);
    if total == 0 {
        return 0.0;
    }

    let ch0 = f32::from(ch0);
    let ch1 = f32::from(ch1);
    let ratio = ch1 / total as f32;

    let combined = if ratio < 0.45 {
        1.7743 * ch0 + 1.1059 * ch1
    } else if ratio < 0.64 {
        4.2785 * ch0 - 1.9548 * ch1
    } else if ratio < 0.85 {
        0.5926 * ch0 + 0.1185 * ch1
    } else {
        return 0.0;
    };

    combined / (gain.multiplier() * time.fraction())
}

/// High-level LTR-329ALS driver
pub struct Ltr329<I2C> {
    iface: DeviceInterface<I2C>,
    config: Config,
    regs: Registers,
    identified: bool,
    configured: bool,
    tick_registered: bool,
    last_lux: Option<f32>,
}

impl<I2C> Ltr329<I2C> {
    /// Create a new driver instance with the default configuration
    pub fn new(i2c: I2C) -> Self {
        Self::with_config(i2c, Config::default())
    }

    /// Create a new driver instance
    pub fn with_config(i2c: I2C, config: Config) -> Self {
        Self {
            iface: DeviceInterface {
                i2c,
                address: config.address,
            },
            config,
            regs: Registers::default(),
            identified: false,
            configured: false,
            tick_registered: false,
            last_lux: None,
        }
    }

    /// Mirrored register file
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True once the identity registers matched
    pub fn is_identified(&self) -> bool {
        self.identified
    }

    /// True once the operating registers were programmed
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Last successfully published illuminance
    pub fn last_lux(&self) -> Option<f32> {
        self.last_lux
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.iface.i2c
    }
}

impl<I2C, E> Ltr329<I2C>
where
    I2C: I2c<Error = E> + Endpoint,
{
    /// Verify the chip identity.
    ///
    /// Applies the configured bus timing to the endpoint, then checks the
    /// manufacturer ID (0x05) and part number (0xA). The driver is disarmed
    /// first, so a failed identify leaves it neither identified nor
    /// configured; the ID registers are only recorded when both match.
    pub fn identify(&mut self) -> Result<(), Error<E>> {
        self.identified = false;
        self.configured = false;
        self.iface.i2c.apply_timing(self.config.bus_timing);

        let manufacturer_id = self.read_register(Register::ManufacturerId)?;
        if manufacturer_id != MANUFACTURER_ID {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("LTR-329: unexpected manufacturer ID 0x{:02x}", manufacturer_id);
            return Err(Error::WrongDevice {
                expected: MANUFACTURER_ID,
                found: manufacturer_id,
            });
        }

        let part_id = PartId(self.read_register(Register::PartId)?);
        if part_id.part() != PART_NUMBER {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("LTR-329: unexpected part number 0x{:x}", part_id.part());
            return Err(Error::WrongDevice {
                expected: PART_NUMBER,
                found: part_id.part(),
            });
        }

        self.regs.manufacturer_id = manufacturer_id;
        self.regs.part_id = part_id;
        self.identified = true;
        #[cfg(feature = "defmt-03")]
        defmt::debug!("LTR-329: identified, revision {}", part_id.revision());
        Ok(())
    }

    /// Put the chip in active mode at the lowest gain and seed the register
    /// image from the chip.
    ///
    /// The sampling tick is registered with `scheduler` on the first
    /// successful call only. On failure the driver is left unconfigured.
    pub fn configure<S>(&mut self, scheduler: &mut S) -> Result<(), Error<E>>
    where
        S: Schedule + ?Sized,
    {
        if !self.identified {
            return Err(Error::InvalidState);
        }
        self.configured = false;

        let control = Control::default()
            .with_mode(Mode::Active)
            .with_gain(Gain::Gain1x as u8);
        self.write_register(Register::Control, control.bits())?;
        self.regs.control = control;

        let meas_rate = MeasRate(self.read_register(Register::MeasRate)?);
        let status = Status(self.read_register(Register::Status)?);
        self.regs.meas_rate = meas_rate;
        self.regs.status = status;
        self.configured = true;

        if !self.tick_registered {
            scheduler.register_periodic(self.config.sample_interval_ms);
            self.tick_registered = true;
            #[cfg(feature = "defmt-03")]
            defmt::debug!(
                "LTR-329: sampling every {}ms",
                self.config.sample_interval_ms
            );
        }

        #[cfg(feature = "defmt-03")]
        defmt::debug!(
            "LTR-329: configured, MEAS_RATE=0x{:02x} STATUS=0x{:02x}",
            meas_rate.bits(),
            status.bits()
        );
        Ok(())
    }

    /// Check the chip still answers. Registers and state are left alone.
    pub fn reconfigure(&mut self) -> Result<(), Error<E>> {
        self.read_register(Register::ManufacturerId).map(|_| ())
    }

    /// Read the four data registers, convert them to lux and publish the result.
    ///
    /// Any failed read aborts the cycle: nothing is published and the
    /// previously published value stays current.
    pub fn sample<P>(&mut self, publisher: &mut P) -> Result<f32, Error<E>>
    where
        P: Publish + ?Sized,
    {
        if !self.configured {
            return Err(Error::InvalidState);
        }

        let mut raw = [0u8; 4];
        for (byte, register) in raw.iter_mut().zip(Register::DATA) {
            match self.read_register(register) {
                Ok(value) => *byte = value,
                Err(e) => {
                    #[cfg(feature = "defmt-03")]
                    defmt::warn!("LTR-329: sample aborted at {}", register);
                    return Err(e);
                }
            }
        }

        let gain = Gain::try_from(self.regs.control.gain())
            .map_err(|_| Error::InvalidState)?;
        let time = IntegrationTime::try_from(self.regs.meas_rate.time())
            .map_err(|_| Error::InvalidState)?;

        let channels = ChannelData(raw);
        let lux = raw_to_lux(channels.ch0(), channels.ch1(), gain, time);
        #[cfg(feature = "defmt-03")]
        defmt::trace!(
            "LTR-329: ch0={} ch1={} lux={}",
            channels.ch0(),
            channels.ch1(),
            lux
        );

        self.regs.channels = channels;
        self.last_lux = Some(lux);
        publisher.publish(self.config.sensor_key, lux);
        Ok(lux)
    }

    /// Change gain, integration time and measurement rate.
    ///
    /// All three codes are validated before anything is written: gain must
    /// be 0..=7 except the reserved 4 and 5, time and rate must be 0..=7.
    /// The control register is written first; if the measurement rate write
    /// then fails, the register image keeps the new gain and the old
    /// time/rate, matching the chip.
    pub fn set_mode(&mut self, gain: u8, time: u8, rate: u8) -> Result<(), Error<E>> {
        let gain = Gain::try_from(gain).map_err(|_| Error::InvalidParameter("gain"))?;
        let time = IntegrationTime::try_from(time)
            .map_err(|_| Error::InvalidParameter("integration time"))?;
        if rate > 0b111 {
            return Err(Error::InvalidParameter("measurement rate"));
        }
        if !self.configured {
            return Err(Error::InvalidState);
        }

        let control = self.regs.control.with_gain(gain as u8);
        self.write_register(Register::Control, control.bits())?;
        self.regs.control = control;

        let meas_rate = self.regs.meas_rate.with_time(time as u8).with_rate(rate);
        self.write_register(Register::MeasRate, meas_rate.bits())?;
        self.regs.meas_rate = meas_rate;

        #[cfg(feature = "defmt-03")]
        defmt::debug!(
            "LTR-329: gain={} time={}ms rate={}ms",
            gain,
            meas_rate.integration_ms(),
            meas_rate.period_ms()
        );
        Ok(())
    }

    /// Refresh the status register and return it
    pub fn diagnostics(&mut self) -> Result<Status, Error<E>> {
        if !self.identified {
            return Err(Error::InvalidState);
        }
        let status = Status(self.read_register(Register::Status)?);
        self.regs.status = status;
        Ok(status)
    }

    /// Write a human-readable dump of the endpoint and the register image.
    ///
    /// Uses the mirrored registers only; no bus traffic.
    pub fn report_all(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.iface.i2c.report(out)?;

        let control = self.regs.control;
        writeln!(
            out,
            "\tCONTROL: 0x{:02X}  gain={} ({}x)  mode={}",
            control.bits(),
            control.gain(),
            GAIN_MULTIPLIER[control.gain() as usize],
            control.mode().name()
        )?;

        let meas_rate = self.regs.meas_rate;
        writeln!(
            out,
            "\tMEAS_RATE: 0x{:02X}  time={} ({:.1}ms)  rate={} ({}ms)",
            meas_rate.bits(),
            meas_rate.time(),
            meas_rate.integration_ms(),
            meas_rate.rate(),
            meas_rate.period_ms()
        )?;

        writeln!(
            out,
            "\tMANUFAC_ID: 0x{:02X}  PART={}  REV={}",
            self.regs.manufacturer_id,
            self.regs.part_id.part(),
            self.regs.part_id.revision()
        )?;

        let status = self.regs.status;
        writeln!(
            out,
            "\tSTATUS: 0x{:02X}  valid={}  gain={}  intr={}  data={}",
            status.bits(),
            status.data_invalid() as u8,
            status.gain(),
            status.interrupt() as u8,
            status.data_ready() as u8
        )
    }

    // Helper methods for register access
    fn read_register(&mut self, register: Register) -> Result<u8, Error<E>> {
        self.iface.read_register(register).map_err(Error::I2c)
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), Error<E>> {
        self.iface
            .write_register(register, value)
            .map_err(Error::I2c)
    }
}
