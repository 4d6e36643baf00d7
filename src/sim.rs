//! Simulated ADNS-5020 for host tests.
//!
//! Every handle shares one chip model and one event log, so tests can check the relative
//! order of chip-select, SDIO direction, bus traffic, reset and delays.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin, PinState};
use embedded_hal::spi::{self, Mode, SpiBus};

use crate::config::Config;
use crate::device::Adns5020;
use crate::interface::spi::SpiInterface;
use crate::interface::{ClockMode, SdioDirection, UnsupportedMode};
use crate::params::PIXEL_COUNT;
use crate::registers::{Register, ADDRESS_MASK, WRITE_FLAG};

/// Byte seen on a floating SDIO line.
const FLOATING: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ClockMode(Mode),
    Cs(PinState),
    Sdio(Direction),
    Exchange { out: u8, received: u8 },
    Flush,
    Reset(PinState),
    DelayMs(u32),
    DelayNs(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

impl spi::Error for SimError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for SimError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Command,
    WriteData(u8),
    ReadData(u8),
    Complete,
}

struct Chip {
    registers: [u8; 128],
    pixels: [u8; PIXEL_COUNT],
    pixel_cursor: usize,
    phase: Phase,
    selected: bool,
    sdio: Direction,
    in_reset: bool,
    exchanges: usize,
    fail_exchange: Option<usize>,
    fail_reset_pin: bool,
    fail_sdio_input: bool,
    fail_sdio_output: bool,
    fail_cs_release: bool,
    violations: Vec<&'static str>,
    events: Vec<Event>,
}

impl Chip {
    fn new() -> Self {
        Self {
            registers: [0; 128],
            pixels: [0; PIXEL_COUNT],
            pixel_cursor: 0,
            phase: Phase::Command,
            selected: false,
            sdio: Direction::Output,
            in_reset: false,
            exchanges: 0,
            fail_exchange: None,
            fail_reset_pin: false,
            fail_sdio_input: false,
            fail_sdio_output: false,
            fail_cs_release: false,
            violations: Vec::new(),
            events: Vec::new(),
        }
    }

    fn exchange(&mut self, out: u8) -> Result<u8, SimError> {
        let index = self.exchanges;
        self.exchanges += 1;
        if self.fail_exchange == Some(index) {
            return Err(SimError);
        }

        let received = self.clock_byte(out);
        self.events.push(Event::Exchange { out, received });
        Ok(received)
    }

    fn clock_byte(&mut self, out: u8) -> u8 {
        if !self.selected {
            self.violations.push("byte clocked while deselected");
            return FLOATING;
        }
        if self.in_reset {
            self.violations.push("byte clocked while in reset");
            return FLOATING;
        }

        match self.phase {
            Phase::Command => {
                if self.sdio == Direction::Input {
                    self.violations.push("address sent with SDIO released");
                }
                let address = out & ADDRESS_MASK;
                self.phase = if out & WRITE_FLAG != 0 {
                    Phase::WriteData(address)
                } else {
                    Phase::ReadData(address)
                };
                FLOATING
            }
            Phase::WriteData(address) => {
                if self.sdio == Direction::Input {
                    self.violations.push("data written with SDIO released");
                }
                self.store(address, out);
                self.phase = Phase::Complete;
                FLOATING
            }
            Phase::ReadData(address) => {
                if self.sdio == Direction::Output {
                    self.violations.push("host drove SDIO during the response");
                }
                self.phase = Phase::Complete;
                self.load(address)
            }
            Phase::Complete => {
                self.violations.push("extra byte in transaction");
                FLOATING
            }
        }
    }

    fn store(&mut self, address: u8, value: u8) {
        if address == Register::PixelGrab.addr() {
            self.pixel_cursor = 0;
        } else {
            self.registers[usize::from(address)] = value;
        }
    }

    fn load(&mut self, address: u8) -> u8 {
        if address == Register::PixelGrab.addr() {
            let value = self.pixels[self.pixel_cursor % PIXEL_COUNT];
            self.pixel_cursor += 1;
            return value;
        }

        let slot = &mut self.registers[usize::from(address)];
        let value = *slot;
        if address == Register::Motion.addr() {
            *slot &= !0x80;
        }
        value
    }

    fn set_cs(&mut self, state: PinState) {
        self.events.push(Event::Cs(state));
        match state {
            PinState::Low => {
                if self.selected {
                    self.violations.push("chip-select asserted twice");
                }
                self.selected = true;
                self.phase = Phase::Command;
            }
            PinState::High => {
                if self.sdio == Direction::Input {
                    self.violations.push("deselected with SDIO released");
                }
                self.selected = false;
                self.phase = Phase::Command;
            }
        }
    }

    fn set_sdio(&mut self, direction: Direction) {
        self.events.push(Event::Sdio(direction));
        if direction == Direction::Input && !matches!(self.phase, Phase::ReadData(_)) {
            self.violations.push("SDIO released outside a read response");
        }
        self.sdio = direction;
    }
}

/// Simulated sensor plus the handles wired to it.
#[derive(Clone)]
pub struct Sim {
    chip: Rc<RefCell<Chip>>,
}

pub type SimInterface = SpiInterface<SimBus, SimCs, SimSdio>;
pub type SimDriver = Adns5020<SimInterface, SimReset>;

impl Sim {
    pub fn new() -> Self {
        Self {
            chip: Rc::new(RefCell::new(Chip::new())),
        }
    }

    pub fn interface(&self) -> SimInterface {
        SpiInterface::new(
            SimBus { sim: self.clone() },
            SimCs { sim: self.clone() },
            SimSdio { sim: self.clone() },
        )
    }

    pub fn reset_pin(&self) -> SimReset {
        SimReset { sim: self.clone() }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay { sim: self.clone() }
    }

    pub fn driver(&self, config: Config) -> SimDriver {
        Adns5020::new(self.interface(), self.reset_pin(), config)
    }

    /// Builds a driver that has completed `init` without delays, with the log cleared.
    pub fn ready_driver(&self) -> SimDriver {
        let config = Config::new().startup_delay_ms(0).reset_hold_ms(0).build();
        let mut driver = self.driver(config);
        driver.init(&mut self.delay()).unwrap();
        self.clear_events();
        driver
    }

    pub fn set_register(&self, register: Register, value: u8) {
        self.set_address(register.addr(), value);
    }

    /// Presets a register the driver has no typed accessor for.
    pub fn set_address(&self, address: u8, value: u8) {
        self.chip.borrow_mut().registers[usize::from(address & ADDRESS_MASK)] = value;
    }

    pub fn register(&self, register: Register) -> u8 {
        self.chip.borrow().registers[usize::from(register.addr())]
    }

    pub fn set_pixels(&self, pixels: [u8; PIXEL_COUNT]) {
        self.chip.borrow_mut().pixels = pixels;
    }

    /// Fails the `n`-th byte exchange counted from now.
    pub fn fail_exchange_in(&self, n: usize) {
        let mut chip = self.chip.borrow_mut();
        chip.fail_exchange = Some(chip.exchanges + n);
    }

    pub fn fail_reset_pin(&self) {
        self.chip.borrow_mut().fail_reset_pin = true;
    }

    /// Fails the next switch of SDIO to input.
    pub fn fail_sdio_input(&self) {
        self.chip.borrow_mut().fail_sdio_input = true;
    }

    /// Fails the next switch of SDIO back to output.
    pub fn fail_sdio_output(&self) {
        self.chip.borrow_mut().fail_sdio_output = true;
    }

    /// Fails the next chip-select release.
    pub fn fail_cs_release(&self) {
        self.chip.borrow_mut().fail_cs_release = true;
    }

    pub fn events(&self) -> Vec<Event> {
        self.chip.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.chip.borrow_mut().events.clear();
    }

    pub fn violations(&self) -> Vec<&'static str> {
        self.chip.borrow().violations.clone()
    }

    /// Bytes the host clocked out, in order.
    pub fn bytes_sent(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Exchange { out, .. } => Some(out),
                _ => None,
            })
            .collect()
    }
}

pub struct SimBus {
    sim: Sim,
}

impl spi::ErrorType for SimBus {
    type Error = SimError;
}

impl SpiBus<u8> for SimBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        for word in words.iter_mut() {
            *word = chip.exchange(0x00)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        for &word in words {
            chip.exchange(word)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        for index in 0..read.len().max(write.len()) {
            let received = chip.exchange(write.get(index).copied().unwrap_or(0x00))?;
            if let Some(slot) = read.get_mut(index) {
                *slot = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        for word in words.iter_mut() {
            *word = chip.exchange(*word)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.sim.chip.borrow_mut().events.push(Event::Flush);
        Ok(())
    }
}

impl ClockMode for SimBus {
    fn set_clock_mode(&mut self, mode: Mode) -> Result<(), UnsupportedMode> {
        self.sim.chip.borrow_mut().events.push(Event::ClockMode(mode));
        Ok(())
    }
}

pub struct SimCs {
    sim: Sim,
}

impl digital::ErrorType for SimCs {
    type Error = SimError;
}

impl OutputPin for SimCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.sim.chip.borrow_mut().set_cs(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        if core::mem::take(&mut chip.fail_cs_release) {
            return Err(SimError);
        }
        chip.set_cs(PinState::High);
        Ok(())
    }
}

pub struct SimSdio {
    sim: Sim,
}

impl SdioDirection for SimSdio {
    type Error = SimError;

    fn set_input(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        if core::mem::take(&mut chip.fail_sdio_input) {
            return Err(SimError);
        }
        chip.set_sdio(Direction::Input);
        Ok(())
    }

    fn set_output(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.sim.chip.borrow_mut();
        if core::mem::take(&mut chip.fail_sdio_output) {
            return Err(SimError);
        }
        chip.set_sdio(Direction::Output);
        Ok(())
    }
}

pub struct SimReset {
    sim: Sim,
}

impl SimReset {
    fn drive(&mut self, state: PinState) -> Result<(), SimError> {
        let mut chip = self.sim.chip.borrow_mut();
        if chip.fail_reset_pin {
            return Err(SimError);
        }
        chip.events.push(Event::Reset(state));
        chip.in_reset = state == PinState::Low;
        Ok(())
    }
}

impl digital::ErrorType for SimReset {
    type Error = SimError;
}

impl OutputPin for SimReset {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::High)
    }
}

pub struct SimDelay {
    sim: Sim,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sim.chip.borrow_mut().events.push(Event::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sim.chip.borrow_mut().events.push(Event::DelayMs(ms));
    }
}
