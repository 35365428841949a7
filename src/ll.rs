//! Low-level register and interface definitions for the LTR-329ALS
//!
//! Every register is modelled as a newtype over its raw byte with explicit
//! bit-field accessors, so the in-memory image is always bit-exact with what
//! was last read from or written to the chip.

use core::fmt;

use embedded_hal::i2c::{ErrorType, I2c, Operation};

/// 7-bit I2C address of the LTR-329ALS
pub const I2C_ADDRESS: u8 = 0x29;

/// Expected content of the manufacturer ID register
pub const MANUFACTURER_ID: u8 = 0x05;

/// Expected part number in the upper nibble of the part ID register
pub const PART_NUMBER: u8 = 0x0A;

/// Gain multiplier per gain code. Codes 4 and 5 are reserved.
pub const GAIN_MULTIPLIER: [u8; 8] = [1, 2, 4, 8, 0, 0, 48, 96];

/// Integration time per time code, in units of 100ms
pub const INTEGRATION_FRACTION: [f32; 8] = [1.0, 0.5, 2.0, 4.0, 1.5, 2.5, 3.0, 3.5];

/// Measurement repeat period per rate code, in ms
pub const MEASUREMENT_PERIOD_MS: [u16; 8] = [50, 100, 200, 500, 1000, 2000, 2000, 2000];

/// Register map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// ALS_CONTR: mode, software reset and gain
    Control = 0x80,
    /// ALS_MEAS_RATE: integration time and measurement rate
    MeasRate = 0x85,
    /// PART_ID: part number and revision
    PartId = 0x86,
    /// MANUFAC_ID
    ManufacturerId = 0x87,
    /// ALS_DATA_CH1_0
    DataCh1Low = 0x88,
    /// ALS_DATA_CH1_1
    DataCh1High = 0x89,
    /// ALS_DATA_CH0_0
    DataCh0Low = 0x8A,
    /// ALS_DATA_CH0_1
    DataCh0High = 0x8B,
    /// ALS_STATUS
    Status = 0x8C,
}

impl Register {
    /// Data registers in the order they have to be read. The chip latches
    /// all four bytes when the CH1 low byte is accessed.
    pub const DATA: [Register; 4] = [
        Register::DataCh1Low,
        Register::DataCh1High,
        Register::DataCh0Low,
        Register::DataCh0High,
    ];

    /// Bus address of the register
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Operating mode of the ALS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Mode {
    /// No measurements, lowest supply current
    Standby = 0,
    /// Measurements repeat at the programmed rate
    Active = 1,
}

impl Mode {
    /// Name used in reports
    pub const fn name(self) -> &'static str {
        match self {
            Mode::Standby => "Standby",
            Mode::Active => "Active",
        }
    }
}

/// ALS_CONTR register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Control(pub u8);

impl Control {
    const MODE: u8 = 0x01;
    const RESET: u8 = 0x02;
    const GAIN_SHIFT: u8 = 2;
    const GAIN_MASK: u8 = 0x07 << Self::GAIN_SHIFT;

    /// Raw register value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Active or standby
    pub const fn mode(self) -> Mode {
        if self.0 & Self::MODE != 0 {
            Mode::Active
        } else {
            Mode::Standby
        }
    }

    /// Software reset flag
    pub const fn reset(self) -> bool {
        self.0 & Self::RESET != 0
    }

    /// 3-bit gain code
    pub const fn gain(self) -> u8 {
        (self.0 & Self::GAIN_MASK) >> Self::GAIN_SHIFT
    }

    /// Returns a copy with the mode bit replaced
    pub const fn with_mode(self, mode: Mode) -> Self {
        Self((self.0 & !Self::MODE) | mode as u8)
    }

    /// Returns a copy with the reset flag replaced
    pub const fn with_reset(self, reset: bool) -> Self {
        Self((self.0 & !Self::RESET) | if reset { Self::RESET } else { 0 })
    }

    /// Returns a copy with the gain code replaced. Only the low 3 bits are used.
    pub const fn with_gain(self, gain: u8) -> Self {
        Self((self.0 & !Self::GAIN_MASK) | ((gain & 0x07) << Self::GAIN_SHIFT))
    }
}

/// ALS_MEAS_RATE register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MeasRate(pub u8);

impl MeasRate {
    const RATE_MASK: u8 = 0x07;
    const TIME_SHIFT: u8 = 3;
    const TIME_MASK: u8 = 0x07 << Self::TIME_SHIFT;

    /// Raw register value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// 3-bit measurement rate code
    pub const fn rate(self) -> u8 {
        self.0 & Self::RATE_MASK
    }

    /// 3-bit integration time code
    pub const fn time(self) -> u8 {
        (self.0 & Self::TIME_MASK) >> Self::TIME_SHIFT
    }

    /// Returns a copy with the rate code replaced
    pub const fn with_rate(self, rate: u8) -> Self {
        Self((self.0 & !Self::RATE_MASK) | (rate & 0x07))
    }

    /// Returns a copy with the integration time code replaced
    pub const fn with_time(self, time: u8) -> Self {
        Self((self.0 & !Self::TIME_MASK) | ((time & 0x07) << Self::TIME_SHIFT))
    }

    /// Integration time in ms
    pub fn integration_ms(self) -> f32 {
        INTEGRATION_FRACTION[self.time() as usize] * 100.0
    }

    /// Measurement repeat period in ms
    pub fn period_ms(self) -> u16 {
        MEASUREMENT_PERIOD_MS[self.rate() as usize]
    }
}

/// PART_ID register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct PartId(pub u8);

impl PartId {
    /// Raw register value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Part number, 0xA for the LTR-329ALS
    pub const fn part(self) -> u8 {
        self.0 >> 4
    }

    /// Silicon revision
    pub const fn revision(self) -> u8 {
        self.0 & 0x0F
    }
}

/// ALS_STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    const DATA_READY: u8 = 0x04;
    const INTERRUPT: u8 = 0x08;
    const GAIN_SHIFT: u8 = 4;
    const INVALID: u8 = 0x80;

    /// Raw register value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bit 7: set while the channel data is invalid
    pub const fn data_invalid(self) -> bool {
        self.0 & Self::INVALID != 0
    }

    /// Gain code the current data was measured with
    pub const fn gain(self) -> u8 {
        (self.0 >> Self::GAIN_SHIFT) & 0x07
    }

    /// Interrupt flag
    pub const fn interrupt(self) -> bool {
        self.0 & Self::INTERRUPT != 0
    }

    /// New data not yet read
    pub const fn data_ready(self) -> bool {
        self.0 & Self::DATA_READY != 0
    }
}

/// The four data bytes in register order: CH1 low, CH1 high, CH0 low, CH0 high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ChannelData(pub [u8; 4]);

impl ChannelData {
    /// Visible + IR count
    pub const fn ch0(self) -> u16 {
        u16::from_le_bytes([self.0[2], self.0[3]])
    }

    /// IR only count
    pub const fn ch1(self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }
}

/// In-memory mirror of the register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Registers {
    /// ALS_CONTR
    pub control: Control,
    /// ALS_MEAS_RATE
    pub meas_rate: MeasRate,
    /// PART_ID
    pub part_id: PartId,
    /// MANUFAC_ID
    pub manufacturer_id: u8,
    /// ALS_DATA_CH1_0 ..= ALS_DATA_CH0_1
    pub channels: ChannelData,
    /// ALS_STATUS
    pub status: Status,
}

/// Bus timing the chip needs from its endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct BusTiming {
    /// SCL frequency in Hz
    pub frequency_hz: u32,
    /// Transaction timeout in ms
    pub timeout_ms: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            frequency_hz: 400_000,
            timeout_ms: 25,
        }
    }
}

/// Management side of a bus endpoint.
///
/// The driver hands its timing needs to the endpoint once during
/// identification and asks it to describe itself when reporting. Both
/// methods default to doing nothing, which suits buses whose speed is fixed
/// at construction.
pub trait Endpoint {
    /// Apply the speed and timeout the device requires
    fn apply_timing(&mut self, timing: BusTiming) {
        let _ = timing;
    }

    /// Describe the endpoint (address, speed, health counters)
    fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let _ = out;
        Ok(())
    }
}

impl<T: Endpoint + ?Sized> Endpoint for &mut T {
    fn apply_timing(&mut self, timing: BusTiming) {
        T::apply_timing(self, timing)
    }

    fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        T::report(self, out)
    }
}

/// Adapter for a plain [`I2c`] bus without endpoint management
#[derive(Debug)]
pub struct Unmanaged<I2C>(pub I2C);

impl<I2C> Unmanaged<I2C> {
    /// Release the wrapped bus
    pub fn into_inner(self) -> I2C {
        self.0
    }
}

impl<I2C> Endpoint for Unmanaged<I2C> {}

impl<I2C: ErrorType> ErrorType for Unmanaged<I2C> {
    type Error = I2C::Error;
}

impl<I2C: I2c> I2c for Unmanaged<I2C> {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.0.read(address, read)
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.0.write(address, write)
    }

    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.0.write_read(address, write, read)
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.0.transaction(address, operations)
    }
}

/// Device interface implementation
#[derive(Debug)]
pub struct DeviceInterface<I2C> {
    /// The I2C interface
    pub i2c: I2C,
    /// 7-bit device address
    pub address: u8,
}

impl<I2C: I2c> DeviceInterface<I2C> {
    /// Read one register: address write followed by a 1 byte read
    pub fn read_register(&mut self, register: Register) -> Result<u8, I2C::Error> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register.addr()], &mut buffer)?;
        Ok(buffer[0])
    }

    /// Write one register in a single 2 byte transaction
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register.addr(), value])
    }
}
