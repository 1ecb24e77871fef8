#![no_std]
#![no_main]

#[cfg(not(feature = "semihosting"))]
use panic_halt as _;
#[cfg(feature = "semihosting")]
use panic_semihosting as _;

use cortex_m::peripheral::syst::SystClkSource;
use log::error;
use rtic::app;

use fpga_echo::{Session, Ticker};

use bluepill::config;
use bluepill::hardware::{Hardware, ReportPort};
use bluepill::logger;

static TICKS: Ticker = Ticker::new();

#[app(device = stm32f1xx_hal::pac, peripherals = true)]
const APP: () = {
    struct Resources {
        hardware: Hardware,
    }

    #[init]
    fn init(cx: init::Context) -> init::LateResources {
        let hardware = Hardware::initialize(cx.device);
        logger::init();

        // 1ms tick from HCLK / 8
        let mut syst = cx.core.SYST;
        syst.set_clock_source(SystClkSource::External);
        syst.set_reload(hardware.clocks().hclk().raw() / 8 / config::TICK_HZ - 1);
        syst.clear_current();
        syst.enable_counter();
        syst.enable_interrupt();

        init::LateResources { hardware }
    }

    #[idle(resources = [hardware])]
    fn idle(cx: idle::Context) -> ! {
        let mut session = match Session::new(cx.resources.hardware, &TICKS, ReportPort, config::SESSION) {
            Ok(session) => session,
            Err(e) => {
                error!("invalid session config: {}", e);
                loop {
                    cortex_m::asm::wfi();
                }
            }
        };

        session.start();

        loop {
            session.run_once();
        }
    }

    #[task(binds = SysTick)]
    fn systick(_: systick::Context) {
        TICKS.tick();
    }
};
