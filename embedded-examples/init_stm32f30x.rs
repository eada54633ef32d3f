//! Full example code for setting up an ST7558 display. This runs on an STM32F303RE, using a
//! Motorola C115 LCD module connected to I2C1 (PB6 SCL, PB7 SDA) and PA9 for RESET.

#![deny(unsafe_code)]
#![no_main]
#![no_std]

extern crate cortex_m;
extern crate stm32f30x;
extern crate stm32f30x_hal as hal;
#[macro_use]
extern crate cortex_m_rt;
extern crate panic_abort;
extern crate st7558;

use cortex_m::asm;
use cortex_m_rt::ExceptionFrame;
use hal::i2c::I2c;
use hal::prelude::*;
use st7558 as lcd;

entry!(main);

exception!(*, default_handler);
exception!(HardFault, hard_fault);

fn hard_fault(_ef: &ExceptionFrame) -> ! {
    asm::bkpt();
    loop {}
}

fn default_handler(_irqn: i16) {
    loop {}
}

fn main() -> ! {
    // Get peripherals and set up RCC.
    let cp = cortex_m::Peripherals::take().unwrap();
    let dp = stm32f30x::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash.acr);
    let mut delay = hal::delay::Delay::new(cp.SYST, clocks);

    // Set up I2C1, which is Alternate Function 4 for GPIOs PB6,7.
    let mut gpiob = dp.GPIOB.split(&mut rcc.ahb);
    let scl = gpiob.pb6.into_af4(&mut gpiob.moder, &mut gpiob.afrl);
    let sda = gpiob.pb7.into_af4(&mut gpiob.moder, &mut gpiob.afrl);
    let disp_i2c = I2c::i2c1(dp.I2C1, (scl, sda), 100.khz(), clocks, &mut rcc.apb1);

    // PA9 is the display's RESET pin, driven by the driver during init.
    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let disp_rst = gpioa
        .pa9
        .into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper);

    // Create the I2cInterface and Display.
    let mut disp = lcd::Display::new(
        lcd::I2cInterface::new(disp_i2c, lcd::interface::i2c::DEFAULT_ADDRESS),
        disp_rst,
    );

    // Reset and bring up the chip. The C115 module runs with the stock configuration; panels
    // wired differently can override Vop, boost, VLCD range, or mirroring on the Config.
    disp.init(&mut delay, lcd::Config::new()).unwrap();

    // Draw a border and a checkerboard patch, then push the framebuffer to the panel.
    disp.draw_rect(0, 0, disp.width(), disp.height(), true);
    for y in 0..16 {
        for x in 0..16 {
            disp.set_pixel(40 + x, 24 + y, (x + y) % 2 == 0);
        }
    }
    disp.flush().unwrap();

    loop {
        asm::wfi();
    }
}
