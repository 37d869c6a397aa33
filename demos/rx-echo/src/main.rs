//! Hosted echo demo on the mock backend.
//!
//! Plain heap buffers stand in for the register blocks and the main thread
//! plays the hardware: it latches edge and receive status, then raises the
//! interrupt lines. Two tasks consume the results, one echoing UART bytes,
//! one following button presses on an LED. `RUST_LOG=debug` shows the
//! driver-level trace.

use std::sync::Arc;

use anyhow::{Context, Result};

use lpc40xx_periph::gpio::{Gpio, PortPin, GPIO_LEN};
use lpc40xx_periph::gpio_int::{Edge, GpioInterrupts, GPIO_INT_LEN, GPIO_IRQ_LINE};
use lpc40xx_periph::iocon::{Iocon, IOCON_LEN};
use lpc40xx_periph::syscon::{Syscon, SYSCON_LEN};
use lpc40xx_periph::uart::{Uart, UartId, UART_LEN};
use lpc40xx_periph::SpinLimit;
use rtos_shim::irq;
use rtos_shim::signal::BinarySignal;
use rtos_shim::task::{self, TaskConfig};
use rtos_shim::time::{self, Ticks, FOREVER};

const CPU_CLOCK_HZ: u32 = 96_000_000;

// Simulated-hardware cell offsets, per the part's register layout.
const UART_DATA: usize = 0x00;
const UART_IIR: usize = 0x08;
const UART_LSR: usize = 0x14;
const LSR_RX_READY_THR_EMPTY: u32 = (1 << 0) | (1 << 5);
const INT_STAT_FALLING: usize = 0x08;

fn poke(base: usize, offset: usize, value: u32) {
    unsafe { core::ptr::write_volatile((base + offset) as *mut u32, value) };
}

fn leak_block<const WORDS: usize>() -> usize {
    Box::leak(Box::new([0u32; WORDS])).as_mut_ptr() as usize
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let gpio_base = leak_block::<{ GPIO_LEN / 4 }>();
    let int_base = leak_block::<{ GPIO_INT_LEN / 4 }>();
    let uart_base = leak_block::<{ UART_LEN / 4 }>();
    let syscon_base = leak_block::<{ SYSCON_LEN / 4 }>();
    let iocon_base = leak_block::<{ IOCON_LEN / 4 }>();

    let syscon = unsafe { Syscon::new(syscon_base) };
    let iocon = unsafe { Iocon::new(iocon_base) };
    let gpio = unsafe { Gpio::new(gpio_base) };

    // Channel 3 bring-up, then the one-way switch to interrupt receive.
    let mut uart = unsafe { Uart::new(UartId::Uart3, uart_base) };
    uart.init(&syscon, CPU_CLOCK_HZ, 38_400).context("uart3 init")?;
    uart.configure_pins(&iocon).context("uart3 pin routing")?;
    unsafe { uart.enable_receive_interrupt() }.context("uart3 receive enable")?;
    let uart = Arc::new(uart);

    // Button on P0.29, LED on P1.18.
    let button = PortPin::new(0, 29)?;
    let led = PortPin::new(1, 18)?;
    gpio.set_as_input(button);
    gpio.set_as_output(led);

    let pressed = BinarySignal::new();
    let mut ints = unsafe { GpioInterrupts::new(int_base) };
    let signal = pressed.clone();
    ints.attach(button, Edge::Falling, Box::new(move || signal.give_from_isr()))
        .context("attach button")?;

    let ints = Arc::new(ints);
    let dispatcher = Arc::clone(&ints);
    unsafe { irq::register_handler(GPIO_IRQ_LINE, Box::new(move || dispatcher.dispatch())) }
        .context("register gpio dispatch")?;
    irq::enable_line(GPIO_IRQ_LINE).context("enable gpio line")?;

    let echo_uart = Arc::clone(&uart);
    task::spawn(TaskConfig::new("echo-task", 2), move || loop {
        match echo_uart.get_char_from_queue(FOREVER) {
            Ok(Some(byte)) => {
                log::info!("echo: {:?}", byte as char);
                if echo_uart.polled_write(byte, SpinLimit::Count(10_000)).is_err() {
                    log::warn!("echo: transmitter stuck, dropping {byte:#04x}");
                }
            }
            Ok(None) | Err(_) => break,
        }
    })
    .context("spawn echo task")?;

    let waiter = pressed.clone();
    task::spawn(TaskConfig::new("button-task", 2), move || {
        let mut lit = false;
        while waiter.take(FOREVER) {
            lit = !lit;
            gpio.set_level(led, lit);
            log::info!("button: press, led {}", if lit { "on" } else { "off" });
        }
    })
    .context("spawn button task")?;

    // Paced traffic: every byte should reach the echo task.
    for &byte in b"hello\n" {
        poke(uart_base, UART_DATA, u32::from(byte));
        poke(uart_base, UART_LSR, LSR_RX_READY_THR_EMPTY);
        poke(uart_base, UART_IIR, 0);
        irq::raise(UartId::Uart3.irq_line());
        time::sleep(Ticks::from_ms(20));
    }

    for _ in 0..3 {
        poke(int_base, INT_STAT_FALLING, 1u32 << button.pin());
        irq::raise(GPIO_IRQ_LINE);
        time::sleep(Ticks::from_ms(20));
    }

    // Unpaced burst; the single-slot queue may displace unread bytes.
    for &byte in b"burst" {
        poke(uart_base, UART_DATA, u32::from(byte));
        irq::raise(UartId::Uart3.irq_line());
    }

    time::sleep(Ticks::from_ms(200));
    let overruns = uart.overrun_count();
    if overruns > 0 {
        log::warn!("uart3: {overruns} byte(s) displaced under back-pressure");
    }
    log::info!(
        "done: {} unhandled gpio interrupt(s), {} overrun(s)",
        ints.unhandled_count(),
        overruns
    );
    Ok(())
}
