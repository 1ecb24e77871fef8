use core::cell::RefCell;
use core::fmt;

use cortex_m::interrupt::{self, Mutex};
use embedded_hal::digital::v2::InputPin;
use embedded_hal::serial::{Read, Write};
use log::warn;
use nb::block;
use stm32f1xx_hal::{
    gpio::{self, ErasedPin, Input, Output, PullDown, PushPull},
    pac,
    prelude::*,
    rcc::Clocks,
    serial::{self, Rx, Serial, StopBits, Tx},
};
use switch_hal::{ActiveHigh, IntoSwitch, OutputSwitch, Switch};

use fpga_echo::HardwareInterface;

use crate::config;

pub type Led = Switch<gpio::gpiob::PB1<Output<PushPull>>, ActiveHigh>;
pub type Strobe = Switch<gpio::gpioc::PC13<Output<PushPull>>, ActiveHigh>;
pub type BufferEmpty = gpio::gpioc::PC14<Input<PullDown>>;

pub type EchoRx = Rx<pac::USART3>;
pub type ReportTx = Tx<pac::USART1>;

// Host side serial port, shared by the session report and the logger
static REPORT_TX: Mutex<RefCell<Option<ReportTx>>> = Mutex::new(RefCell::new(None));

/// Handle to the host serial port.
///
/// Each byte is sent in its own critical section so SysTick is never held
/// off for longer than one character time.
#[derive(Clone, Copy, Default)]
pub struct ReportPort;

impl fmt::Write for ReportPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            interrupt::free(|cs| {
                if let Some(tx) = REPORT_TX.borrow(cs).borrow_mut().as_mut() {
                    block!(Write::write(tx, byte)).ok();
                }
            });
        }
        Ok(())
    }
}

/// PA0-PA7, written in one go through BSRR.
pub struct ParallelBus {
    _pins: [ErasedPin<Output<PushPull>>; 8],
}

impl ParallelBus {
    pub fn new(pins: [ErasedPin<Output<PushPull>>; 8]) -> Self {
        ParallelBus { _pins: pins }
    }

    pub fn write(&mut self, value: u8) {
        // low half sets, high half resets
        let bits = u32::from(value) | (u32::from(!value) << 16);

        // SAFETY: BSRR writes are atomic and only touch the lines owned by `_pins`
        let gpioa = unsafe { &*pac::GPIOA::ptr() };
        gpioa.bsrr.write(|w| unsafe { w.bits(bits) });
    }
}

pub struct Hardware {
    bus: ParallelBus,
    strobe: Strobe,
    buffer_empty: BufferEmpty,
    echo: EchoRx,
    led: Led,
    clocks: Clocks,
}

impl Hardware {
    /// Bring up clocks, pins and both serial ports.
    ///
    /// The host serial port is installed as the shared [`ReportPort`].
    pub fn initialize(device: pac::Peripherals) -> Self {
        let mut flash = device.FLASH.constrain();
        let rcc = device.RCC.constrain();

        let clocks = rcc
            .cfgr
            .use_hse(config::HSE_MHZ.MHz())
            .sysclk(config::SYSCLK_MHZ.MHz())
            .freeze(&mut flash.acr);

        let mut afio = device.AFIO.constrain();
        let mut gpioa = device.GPIOA.split();
        let mut gpiob = device.GPIOB.split();
        let mut gpioc = device.GPIOC.split();

        // USART1: report channel to the host
        let tx = gpioa.pa9.into_alternate_push_pull(&mut gpioa.crh);
        let rx = gpioa.pa10;
        let report = Serial::new(
            device.USART1,
            (tx, rx),
            &mut afio.mapr,
            serial::Config::default()
                .baudrate(config::SESSION.report_baud.bps())
                .parity_none()
                .stopbits(StopBits::STOP1),
            &clocks,
        );
        let (report_tx, _) = report.split();
        interrupt::free(|cs| REPORT_TX.borrow(cs).replace(Some(report_tx)));

        // USART3: echo channel from the FPGA
        let tx = gpiob.pb10.into_alternate_push_pull(&mut gpiob.crh);
        let rx = gpiob.pb11;
        let echo = Serial::new(
            device.USART3,
            (tx, rx),
            &mut afio.mapr,
            serial::Config::default()
                .baudrate(config::SESSION.echo_baud.bps())
                .parity_none()
                .stopbits(StopBits::STOP1),
            &clocks,
        );
        let (_, echo) = echo.split();

        let bus = ParallelBus::new([
            gpioa.pa0.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa1.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa2.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa3.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa4.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa5.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa6.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa7.into_push_pull_output(&mut gpioa.crl).erase(),
        ]);

        let mut strobe = gpioc
            .pc13
            .into_push_pull_output(&mut gpioc.crh)
            .into_active_high_switch();
        strobe.off().ok();

        let buffer_empty = gpioc.pc14.into_pull_down_input(&mut gpioc.crh);

        let mut led = gpiob
            .pb1
            .into_push_pull_output(&mut gpiob.crl)
            .into_active_high_switch();
        led.off().ok();

        Hardware {
            bus,
            strobe,
            buffer_empty,
            echo,
            led,
            clocks,
        }
    }

    pub fn clocks(&self) -> &Clocks {
        &self.clocks
    }
}

impl HardwareInterface for Hardware {
    fn write_bus(&mut self, value: u8) {
        self.bus.write(value);
    }

    fn set_strobe(&mut self, high: bool) {
        if high {
            self.strobe.on().ok();
        } else {
            self.strobe.off().ok();
        }
    }

    fn read(&mut self) -> Option<u8> {
        match Read::read(&mut self.echo) {
            Ok(data) => Some(data),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(e)) => {
                warn!("USART3 receive error: {:?}", e);
                None
            }
        }
    }

    fn buffer_empty(&mut self) -> bool {
        InputPin::is_high(&self.buffer_empty).unwrap_or(false)
    }

    fn set_status_led(&mut self, on: bool) {
        if on {
            self.led.on().ok();
        } else {
            self.led.off().ok();
        }
    }
}
