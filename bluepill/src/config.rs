//! Board wiring and build time settings.
//!
//! | Signal              | Pin        |
//! |---------------------|------------|
//! | parallel bus        | PA0 - PA7  |
//! | start send (strobe) | PC13       |
//! | tx buffer empty     | PC14       |
//! | USART3 (FPGA)       | PB10, PB11 |
//! | USART1 (host)       | PA9, PA10  |
//! | status LED          | PB1        |

use log::LevelFilter;

pub use fpga_echo::Config;

pub const HSE_MHZ: u32 = 8;
pub const SYSCLK_MHZ: u32 = 24;

/// SysTick rate.
pub const TICK_HZ: u32 = 1_000;

pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

pub const SESSION: Config = Config::DEFAULT;
