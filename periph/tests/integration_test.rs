//! Integration tests over simulated register blocks and the mock RTOS
//! backend.
//!
//! Covered workflows:
//! - button edge: latched status -> bank dispatch -> signal -> waiting task
//! - UART receive: data-ready interrupt -> queue -> consumer task, with
//!   back-pressure displacing the unread byte
//! - polled UART bring-up and loopback
//! - SSP bring-up and full-duplex exchange

#![cfg(feature = "mock")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use lpc40xx_periph::gpio::{Gpio, PortPin, GPIO_LEN};
use lpc40xx_periph::gpio_int::{Edge, GpioInterrupts, GPIO_INT_LEN, GPIO_IRQ_LINE};
use lpc40xx_periph::iocon::{Iocon, IOCON_LEN};
use lpc40xx_periph::ssp::{Ssp, SSP_LEN};
use lpc40xx_periph::syscon::{Peripheral, Syscon, SYSCON_LEN};
use lpc40xx_periph::uart::{Uart, UartId, UART_LEN};
use lpc40xx_periph::SpinLimit;
use rtos_shim::irq;
use rtos_shim::queue::ByteQueue;
use rtos_shim::signal::BinarySignal;
use rtos_shim::task::{self, TaskConfig};
use rtos_shim::time::{Ticks, NO_WAIT};

// Hardware layout of the simulated blocks, as the part documents it.
const GPIO_PIN: usize = 0x14;
const INT_STAT_RISING: usize = 0x04;
const INT_STAT_FALLING: usize = 0x08;
const INT_CLEAR: usize = 0x0C;
const UART_DATA: usize = 0x00;
const UART_IER: usize = 0x04;
const UART_IIR: usize = 0x08;
const UART_LCR: usize = 0x0C;
const UART_LSR: usize = 0x14;
const LSR_RX_READY: u32 = 1 << 0;
const LSR_THR_EMPTY: u32 = 1 << 5;
const SSP_CPSR: usize = 0x10;

fn peek(base: usize, offset: usize) -> u32 {
    unsafe { core::ptr::read_volatile((base + offset) as *const u32) }
}

fn poke(base: usize, offset: usize, value: u32) {
    unsafe { core::ptr::write_volatile((base + offset) as *mut u32, value) };
}

/// A button press latched in the bank's falling-edge status wakes a task
/// blocked on a signal, while a second pin's rising edge is serviced from
/// the same interrupt.
#[test]
fn test_button_edge_wakes_waiting_task() {
    // Leaked: the interrupt registry keeps the dispatch closure for the
    // life of the process.
    let gpio_memory = Box::leak(Box::new([0u32; GPIO_LEN / 4]));
    let int_memory = Box::leak(Box::new([0u32; GPIO_INT_LEN / 4]));
    let gpio_base = gpio_memory.as_mut_ptr() as usize;
    let int_base = int_memory.as_mut_ptr() as usize;

    let gpio = unsafe { Gpio::new(gpio_base) };
    let button = PortPin::new(0, 29).expect("pin");
    let spare = PortPin::new(0, 30).expect("pin");
    gpio.set_as_input(button);
    gpio.set_as_input(spare);

    poke(gpio_base, GPIO_PIN, 1 << 29);
    assert!(gpio.level(button));
    assert!(!gpio.level(spare));

    let pressed = BinarySignal::new();
    let spare_edges = Arc::new(AtomicU32::new(0));

    let mut ints = unsafe { GpioInterrupts::new(int_base) };
    let signal = pressed.clone();
    ints.attach(button, Edge::Falling, Box::new(move || signal.give_from_isr()))
        .expect("attach button");
    let counter = Arc::clone(&spare_edges);
    ints.attach(
        spare,
        Edge::Rising,
        Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }),
    )
    .expect("attach spare");

    let ints = Arc::new(ints);
    let dispatcher = Arc::clone(&ints);
    unsafe {
        irq::register_handler(GPIO_IRQ_LINE, Box::new(move || dispatcher.dispatch()))
            .expect("register dispatch");
    }
    irq::enable_line(GPIO_IRQ_LINE).expect("enable line");

    let done = BinarySignal::new();
    let task_done = done.clone();
    let waiter = pressed.clone();
    task::spawn(TaskConfig::new("button-waiter", 2), move || {
        assert!(waiter.take(Ticks::from_ms(5_000)));
        task_done.give();
    })
    .expect("spawn waiter");

    // Both pins latch before the bank's line fires once.
    poke(int_base, INT_STAT_FALLING, 1 << 29);
    poke(int_base, INT_STAT_RISING, 1 << 30);
    assert!(irq::raise(GPIO_IRQ_LINE));

    assert!(done.take(Ticks::from_ms(10_000)));
    assert_eq!(spare_edges.load(Ordering::Relaxed), 1);
    assert_eq!(peek(int_base, INT_CLEAR), (1 << 29) | (1 << 30));
    assert_eq!(ints.unhandled_count(), 0);
}

/// Full receive pipeline on channel 3: bring-up, a data-ready interrupt
/// feeding a consumer task, then back-pressure keeping only the newest byte.
#[test]
fn test_uart_rx_interrupt_pipeline() {
    let uart_memory = Box::leak(Box::new([0u32; UART_LEN / 4]));
    let mut syscon_memory = [0u32; SYSCON_LEN / 4];
    let mut iocon_memory = [0u32; IOCON_LEN / 4];
    let base = uart_memory.as_mut_ptr() as usize;

    let mut uart = unsafe { Uart::new(UartId::Uart3, base) };
    let syscon = unsafe { Syscon::new(syscon_memory.as_mut_ptr() as usize) };
    let iocon = unsafe { Iocon::new(iocon_memory.as_mut_ptr() as usize) };

    uart.init(&syscon, 96_000_000, 38_400).expect("init");
    assert!(syscon.is_powered(Peripheral::Uart3));
    assert_eq!(peek(base, UART_DATA), 156);
    uart.configure_pins(&iocon).expect("pins");
    unsafe { uart.enable_receive_interrupt().expect("enable rx") };
    assert_eq!(peek(base, UART_IER), 1);

    let uart = Arc::new(uart);
    let consumer_uart = Arc::clone(&uart);
    let echoed = ByteQueue::new();
    let echo = echoed.clone();
    task::spawn(TaskConfig::new("rx-consumer", 2), move || {
        if let Ok(Some(byte)) = consumer_uart.get_char_from_queue(Ticks::from_ms(5_000)) {
            echo.send_overwrite_from_isr(byte);
        }
    })
    .expect("spawn consumer");

    poke(base, UART_DATA, u32::from(b'h'));
    poke(base, UART_LSR, LSR_RX_READY);
    poke(base, UART_IIR, 0);
    assert!(irq::raise(UartId::Uart3.irq_line()));
    assert_eq!(echoed.receive(Ticks::from_ms(10_000)), Some(b'h'));

    // Two arrivals with no read between them displace the first.
    poke(base, UART_DATA, u32::from(b'a'));
    assert!(irq::raise(UartId::Uart3.irq_line()));
    poke(base, UART_DATA, u32::from(b'b'));
    assert!(irq::raise(UartId::Uart3.irq_line()));

    assert_eq!(uart.get_char_from_queue(NO_WAIT), Ok(Some(b'b')));
    assert_eq!(uart.overrun_count(), 1);
    assert_eq!(uart.get_char_from_queue(NO_WAIT), Ok(None));
}

/// Polled channel 2 comes up and loops a byte back: the simulated block
/// holds transmit and receive in one cell, so the write reads straight back.
#[test]
fn test_polled_uart_bring_up_and_loopback() {
    let mut uart_memory = [0u32; UART_LEN / 4];
    let mut syscon_memory = [0u32; SYSCON_LEN / 4];
    let mut iocon_memory = [0u32; IOCON_LEN / 4];
    let base = uart_memory.as_mut_ptr() as usize;
    let iocon_base = iocon_memory.as_mut_ptr() as usize;

    let uart = unsafe { Uart::new(UartId::Uart2, base) };
    let syscon = unsafe { Syscon::new(syscon_memory.as_mut_ptr() as usize) };
    let iocon = unsafe { Iocon::new(iocon_base) };

    uart.init(&syscon, 96_000_000, 115_200).expect("init");
    uart.configure_pins(&iocon).expect("pins");

    assert!(syscon.is_powered(Peripheral::Uart2));
    assert_eq!(peek(base, UART_DATA), 52);
    assert_eq!(peek(base, UART_LCR), 0b11);
    assert_eq!(peek(iocon_base, 10 * 4), 0b001);
    assert_eq!(peek(iocon_base, 11 * 4), 0b001);

    poke(base, UART_LSR, LSR_THR_EMPTY | LSR_RX_READY);
    uart.polled_write(b'A', SpinLimit::Count(8)).expect("write");
    assert_eq!(uart.polled_read(SpinLimit::Count(8)), Ok(b'A'));
}

/// SSP2 bring-up: power, pin routing, prescaler, one polled exchange.
#[test]
fn test_ssp_bring_up_and_exchange() {
    let mut ssp_memory = [0u32; SSP_LEN / 4];
    let mut syscon_memory = [0u32; SYSCON_LEN / 4];
    let mut iocon_memory = [0u32; IOCON_LEN / 4];
    let base = ssp_memory.as_mut_ptr() as usize;
    let iocon_base = iocon_memory.as_mut_ptr() as usize;

    let ssp = unsafe { Ssp::new(base) };
    let syscon = unsafe { Syscon::new(syscon_memory.as_mut_ptr() as usize) };
    let iocon = unsafe { Iocon::new(iocon_base) };

    ssp.init(&syscon, 96_000_000, 24_000_000).expect("init");
    ssp.configure_pins(&iocon).expect("pins");

    assert!(syscon.is_powered(Peripheral::Ssp2));
    assert_eq!(peek(base, SSP_CPSR), 4);
    assert_eq!(peek(iocon_base, 32 * 4), 0b100);
    assert_eq!(peek(iocon_base, (32 + 1) * 4), 0b100);
    assert_eq!(peek(iocon_base, (32 + 4) * 4), 0b100);

    assert_eq!(ssp.exchange(0x5A, SpinLimit::Count(8)), Ok(0x5A));
}
