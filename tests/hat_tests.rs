//! Integration tests for the Explorer HAT object model.
//!
//! These tests drive the HAT through the mock GPIO and I2C backends and
//! check what ends up on the pins and registers.

use std::sync::{Arc, Mutex};

use explorer_hat::hal::{MockGpio, MockI2c, PinMode, Pwm};
use explorer_hat::{
    AnalogId, Board, Direction, Error, ExplorerHat, HatConfig, InputId, Level, LightId,
    MotorController, MotorId, OutputId, OutputMode, Pull, Settings, TouchEvent, TouchEventKind,
    TouchId,
};

const TOUCH: u8 = 0x28;
const ADC: u8 = 0x48;
const CAP_STATUS: u8 = 0x03;

fn basic_hat() -> ExplorerHat<MockGpio, MockI2c> {
    ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat(), HatConfig::default()).unwrap()
}

fn pro_hat() -> ExplorerHat<MockGpio, MockI2c> {
    ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat_pro(), HatConfig::default()).unwrap()
}

fn touch(hat: &mut ExplorerHat<MockGpio, MockI2c>, mask: u8) {
    hat.i2c_mut().set_register(TOUCH, CAP_STATUS, &[mask]);
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn test_board_detection() {
    assert_eq!(basic_hat().board(), Board::Basic);
    assert_eq!(pro_hat().board(), Board::Pro);
}

#[test]
fn test_pro_sets_up_motor_pins_low() {
    let hat = pro_hat();
    for pin in [19, 20, 21, 26] {
        assert_eq!(hat.gpio().mode(pin), Some(PinMode::Output));
        assert_eq!(hat.gpio().level(pin), Some(Level::Low));
    }
    for pin in [23, 22, 24, 25] {
        assert_eq!(hat.gpio().mode(pin), Some(PinMode::Input(Pull::Down)));
    }
}

#[test]
fn test_touch_controller_configured_at_startup() {
    let hat = basic_hat();
    // Hardware repeat off, multitouch allowed
    assert_eq!(hat.i2c().register(TOUCH, 0x28), Some(&[0x00][..]));
    assert_eq!(hat.i2c().register(TOUCH, 0x2A), Some(&[0x00][..]));
}

#[test]
fn test_single_touch_config() {
    let config = HatConfig::default().with_settings(Settings::default().with_multitouch(false));
    let hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat(), config).unwrap();
    assert_eq!(hat.i2c().register(TOUCH, 0x2A), Some(&[0x80][..]));
}

// ============================================================================
// Outputs and lights
// ============================================================================

#[test]
fn test_lights_on_off_toggle() {
    let mut hat = basic_hat();

    hat.light(LightId::Blue).on().unwrap();
    assert_eq!(hat.gpio().level(4), Some(Level::High));

    hat.light(LightId::Blue).toggle().unwrap();
    assert_eq!(hat.gpio().level(4), Some(Level::Low));

    hat.set_lights(true).unwrap();
    for pin in [4, 17, 27, 5] {
        assert_eq!(hat.gpio().level(pin), Some(Level::High));
    }

    hat.toggle_lights().unwrap();
    for pin in [4, 17, 27, 5] {
        assert_eq!(hat.gpio().level(pin), Some(Level::Low));
    }
}

#[test]
fn test_outputs_follow_pin_map() {
    let mut hat = basic_hat();
    hat.output(OutputId::Three).on().unwrap();

    assert_eq!(hat.gpio().level(13), Some(Level::High));
    assert_eq!(hat.gpio().level(6), Some(Level::Low));
    assert!(hat.output(OutputId::Three).is_on());
    assert!(!hat.output(OutputId::One).is_on());

    hat.toggle_outputs().unwrap();
    assert_eq!(hat.gpio().level(13), Some(Level::Low));
    assert_eq!(hat.gpio().level(6), Some(Level::High));
}

#[test]
fn test_blink_runs_pwm_until_stopped() {
    let mut hat = basic_hat();
    hat.light(LightId::Yellow).blink(250, 750).unwrap();

    assert_eq!(
        hat.gpio().pwm(17),
        Some(Pwm {
            frequency_hz: 1.0,
            duty: 0.25
        })
    );
    assert_eq!(
        hat.light(LightId::Yellow).mode(),
        OutputMode::Blink {
            on_ms: 250,
            off_ms: 750
        }
    );

    hat.light(LightId::Yellow).stop_blink().unwrap();
    assert_eq!(hat.gpio().pwm(17), None);
    assert_eq!(hat.gpio().level(17), Some(Level::Low));
    assert_eq!(hat.light(LightId::Yellow).mode(), OutputMode::Steady);
}

#[test]
fn test_brightness_uses_configured_frequency() {
    let config = HatConfig::default().with_settings(Settings::default().with_pwm_frequency(200.0));
    let mut hat = ExplorerHat::new(MockGpio::new(), MockI2c::explorer_hat(), config).unwrap();

    hat.output(OutputId::Two).brightness(0.5).unwrap();
    assert_eq!(
        hat.gpio().pwm(12),
        Some(Pwm {
            frequency_hz: 200.0,
            duty: 0.5
        })
    );

    // Full brightness is a plain high level
    hat.output(OutputId::Two).brightness(1.0).unwrap();
    assert_eq!(hat.gpio().pwm(12), None);
    assert_eq!(hat.gpio().level(12), Some(Level::High));
}

// ============================================================================
// Inputs
// ============================================================================

#[test]
fn test_input_reads_level() {
    let mut hat = basic_hat();
    assert!(!hat.input(InputId::Two).read().unwrap());

    hat.gpio_mut().inject(22, Level::High).unwrap();
    assert!(hat.input(InputId::Two).read().unwrap());
    assert_eq!(hat.read_inputs().unwrap(), [false, true, false, false]);
}

#[test]
fn test_input_callbacks() {
    let mut hat = basic_hat();
    let log = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    hat.input(InputId::One)
        .on_changed(move |id, level| sink.lock().unwrap().push((id, level)))
        .unwrap();
    assert_eq!(hat.gpio().subscription(23).map(|(_, bounce)| bounce), Some(50));

    assert!(hat.gpio_mut().inject(23, Level::High).unwrap());
    assert!(hat.gpio_mut().inject(23, Level::Low).unwrap());

    assert_eq!(
        *log.lock().unwrap(),
        vec![(InputId::One, Level::High), (InputId::One, Level::Low)]
    );
}

#[test]
fn test_input_on_high_ignores_falling_edge() {
    let mut hat = basic_hat();
    let count = Arc::new(Mutex::new(0));

    let sink = Arc::clone(&count);
    hat.input(InputId::Four)
        .with_bounce(10)
        .on_high(move |_, _| *sink.lock().unwrap() += 1)
        .unwrap();

    hat.gpio_mut().inject(25, Level::High).unwrap();
    hat.gpio_mut().inject(25, Level::Low).unwrap();
    hat.gpio_mut().inject(25, Level::High).unwrap();

    assert_eq!(*count.lock().unwrap(), 2);
    assert_eq!(hat.gpio().subscription(25).map(|(_, bounce)| bounce), Some(10));
}

// ============================================================================
// Analog
// ============================================================================

#[test]
fn test_analog_read() {
    let mut hat = pro_hat();
    // 1000 counts at the 6.144V range
    hat.i2c_mut().set_register(ADC, 0x00, &(1000u16 << 4).to_be_bytes());

    assert_eq!(hat.analog(AnalogId::One).unwrap().read_mv().unwrap(), 3000);
    let volts = hat.analog(AnalogId::One).unwrap().read().unwrap();
    assert!((volts - 3.0).abs() < 1e-6);

    assert_eq!(hat.read_analogs().unwrap(), [3000; 4]);
}

#[test]
fn test_analog_channels_are_reversed() {
    let mut hat = pro_hat();
    assert_eq!(hat.analog(AnalogId::One).unwrap().channel(), 3);
    assert_eq!(hat.analog(AnalogId::Four).unwrap().channel(), 0);

    hat.i2c_mut().clear_writes();
    hat.analog(AnalogId::One).unwrap().read_mv().unwrap();
    // OS | MUX AIN3 | 6.144V | single shot | 1600SPS | comparator off
    assert_eq!(hat.i2c().writes()[0], (ADC, vec![0x01, 0xF1, 0x83]));
}

#[test]
fn test_analog_negative_reads_zero() {
    let mut hat = pro_hat();
    hat.i2c_mut().set_register(ADC, 0x00, &[0xFF, 0xF0]);
    assert_eq!(hat.analog(AnalogId::Two).unwrap().read_mv().unwrap(), 0);
}

// ============================================================================
// Motors
// ============================================================================

#[test]
fn test_motor_forward_backward() {
    let mut hat = pro_hat();

    hat.motor(MotorId::One).unwrap().forward(50.0).unwrap();
    let pwm = hat.gpio().pwm(20).unwrap();
    assert!((pwm.duty - 0.5).abs() < 1e-6);
    assert_eq!(hat.gpio().pwm(19), None);

    hat.motor(MotorId::One).unwrap().backward(100.0).unwrap();
    assert_eq!(hat.gpio().pwm(20), None);
    assert_eq!(hat.gpio().level(20), Some(Level::Low));
    let pwm = hat.gpio().pwm(19).unwrap();
    assert!((pwm.duty - 1.0).abs() < 1e-6);
    assert_eq!(hat.motor(MotorId::One).unwrap().direction(), Direction::Reverse);
}

#[test]
fn test_motor_invert_swaps_pins() {
    let mut hat = pro_hat();

    {
        let mut motor = hat.motor(MotorId::Two).unwrap();
        motor.invert().unwrap();
        motor.forward(30.0).unwrap();
        assert!(motor.is_inverted());
    }

    assert!(hat.gpio().pwm(21).is_some());
    assert_eq!(hat.gpio().pwm(26), None);
}

#[test]
fn test_stop_motors() {
    let mut hat = pro_hat();
    hat.motor(MotorId::One).unwrap().forward(80.0).unwrap();
    hat.motor(MotorId::Two).unwrap().speed(-80.0).unwrap();

    hat.stop_motors().unwrap();

    for pin in [19, 20, 21, 26] {
        assert_eq!(hat.gpio().pwm(pin), None);
        assert_eq!(hat.gpio().level(pin), Some(Level::Low));
    }
    assert_eq!(hat.motor(MotorId::Two).unwrap().current_speed(), 0.0);
}

#[test]
fn test_motor_controller_trait() {
    let mut hat = pro_hat();
    let mut motor = hat.motor(MotorId::One).unwrap();

    motor.set_speed(0.25).unwrap();
    motor.set_direction(Direction::Forward).unwrap();
    assert!((motor.current_speed() - 25.0).abs() < 1e-4);
    assert_eq!(motor.direction(), Direction::Forward);

    motor.stop().unwrap();
    assert_eq!(motor.direction(), Direction::Stopped);
    assert_eq!(hat.gpio().pwm(20), None);
}

#[test]
fn test_basic_board_has_no_motors_or_analog() {
    let mut hat = basic_hat();
    assert!(matches!(hat.motor(MotorId::One), Err(Error::NotFitted(_))));
    assert!(matches!(hat.read_analogs(), Err(Error::NotFitted(_))));
}

// ============================================================================
// Touch
// ============================================================================

#[test]
fn test_touch_press_release() {
    let mut hat = basic_hat();

    // Pad one is controller input 4
    touch(&mut hat, 1 << 4);
    let events = hat.poll(0).unwrap();
    assert_eq!(
        events.as_slice(),
        &[TouchEvent {
            pad: TouchId::One,
            kind: TouchEventKind::Press
        }]
    );
    assert!(hat.is_touched(TouchId::One));

    touch(&mut hat, 0);
    let events = hat.poll(50).unwrap();
    assert_eq!(events[0].kind, TouchEventKind::Release);
    assert!(!hat.is_touched(TouchId::One));
}

#[test]
fn test_touch_callbacks_and_hold() {
    let mut hat = basic_hat();
    let log = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    let held = Arc::clone(&log);
    hat.touch_pad(TouchId::Eight)
        .pressed(move |e| sink.lock().unwrap().push(e.kind))
        .held(move |e| held.lock().unwrap().push(e.kind));

    // Pad eight is controller input 3
    touch(&mut hat, 1 << 3);
    hat.poll(0).unwrap();
    hat.poll(100).unwrap();
    hat.poll(500).unwrap();
    hat.poll(600).unwrap();
    hat.poll(700).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            TouchEventKind::Press,
            TouchEventKind::Held,
            TouchEventKind::Held
        ]
    );
}

#[test]
fn test_touch_reregistering_replaces_callback() {
    let mut hat = basic_hat();
    let count = Arc::new(Mutex::new(0));

    for _ in 0..3 {
        let sink = Arc::clone(&count);
        hat.touch_pad(TouchId::One)
            .pressed(move |_| *sink.lock().unwrap() += 1);
    }

    touch(&mut hat, 1 << 4);
    hat.poll(0).unwrap();
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn test_touch_all_pads_handler() {
    let mut hat = basic_hat();
    let pads = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&pads);
    hat.touch_pads()
        .released(move |e| sink.lock().unwrap().push(e.pad));

    touch(&mut hat, 0b0001_0001);
    hat.poll(0).unwrap();
    touch(&mut hat, 0);
    hat.poll(20).unwrap();

    assert_eq!(*pads.lock().unwrap(), vec![TouchId::One, TouchId::Five]);
}

// ============================================================================
// Names and reset
// ============================================================================

#[test]
fn test_resolve_names() {
    let hat = basic_hat();
    assert_eq!(hat.resolve("light.red").unwrap().as_slice(), &[27]);
    assert_eq!(hat.resolve("output.2").unwrap().as_slice(), &[12]);
    assert_eq!(hat.resolve("motor.one").unwrap().as_slice(), &[20, 19]);
    assert!(hat.resolve("analog.one").unwrap().is_empty());
    assert!(hat.resolve("buzzer.one").is_err());
}

#[test]
fn test_reset_returns_to_power_on_state() {
    let mut hat = pro_hat();

    hat.set_outputs(true).unwrap();
    hat.light(LightId::Green).blink(100, 100).unwrap();
    hat.motor(MotorId::One).unwrap().forward(100.0).unwrap();
    hat.input(InputId::Three).on_low(|_, _| {}).unwrap();
    hat.touch_pads().pressed(|_| {});

    hat.reset().unwrap();

    for pin in [6, 12, 13, 16, 5, 20] {
        assert_eq!(hat.gpio().level(pin), Some(Level::Low));
        assert_eq!(hat.gpio().pwm(pin), None);
    }
    assert_eq!(hat.gpio().subscription(24), None);

    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    hat.touch_pads().pressed(move |_| *sink.lock().unwrap() += 1);
    touch(&mut hat, 0xFF);
    hat.poll(0).unwrap();
    assert_eq!(*count.lock().unwrap(), 8);
}
