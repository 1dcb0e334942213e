use arduino_hal::{
    default_serial, delay_ms,
    hal::port::{PD0, PD1},
    pac::USART0,
    pins,
    port::{
        mode::{Input, Output},
        Pin, D2, D3, D5, D6,
    },
    prelude::*,
    Peripherals, Pins, Usart,
};
use corexy::{
    Advance, Clock as _, Command, Cursor, Direction, Move, MoveQueue, ParseError, Pen,
    Point, StepOutcome, Stepper as _, DEFAULT_SPEED, MOVE_SPEED,
};
use ufmt::uwriteln;

use crate::devices::{clock::Clock, enable::EnablePin, servo::Servo, stepper::Stepper};

/// Longest accepted command line, excluding the terminating newline.
const INPUT_BUFFER_SZ: usize = 200;

/// Milliseconds between telemetry reports.
const REPORT_INTERVAL_MS: u32 = 500;

/// The whole plotter: devices, motion state and the serial protocol.
///
/// One [Machine::poll] call is one iteration of the cooperative loop:
/// service input and telemetry, advance the active move, pace, then emit
/// at most one motor pulse.
pub struct Machine {
    serial: Usart<USART0, Pin<Input, PD0>, Pin<Output, PD1>>,
    clock: Clock,
    x_motor: Stepper<D2, D5>,
    y_motor: Stepper<D3, D6>,
    pen: Pen<Servo>,
    cursor: Cursor<EnablePin>,
    queue: MoveQueue,
    active: Option<Move>,
    input: heapless::String<INPUT_BUFFER_SZ>,
    last_report_ms: u32,
}

impl Machine {
    const BAUD_RATE: u32 = 57600;

    pub fn new() -> Self {
        let peripherals: Peripherals = unsafe { Peripherals::steal() };
        let pins: Pins = pins!(peripherals);
        let mut serial = default_serial!(peripherals, pins, Self::BAUD_RATE);

        delay_ms(100);
        uwriteln!(&mut serial, "init").unwrap_infallible();

        let clock = Clock::new(peripherals.TC0);
        let servo = Servo::new(peripherals.TC1, pins.d9.into_output());
        let x_motor = Stepper::new(pins.d2.into_output(), pins.d5.into_output());
        let y_motor = Stepper::new(pins.d3.into_output(), pins.d6.into_output());
        let enable = EnablePin::new(pins.d8.into_output_high());

        let pen = Pen::new(servo);
        let mut cursor = Cursor::new(enable);
        cursor.init(Point::default(), 0);

        let mut machine = Self {
            serial,
            clock,
            x_motor,
            y_motor,
            pen,
            cursor,
            queue: MoveQueue::new(),
            active: None,
            input: heapless::String::new(),
            last_report_ms: 0,
        };
        machine.pen_up();
        machine
    }

    /// One iteration of the cooperative loop.
    pub fn poll(&mut self) {
        self.handle_input();
        self.advance();
        self.cursor.delay(&self.clock);

        let pen_ready = self.pen.ready_to_move(&self.clock);
        match self.cursor.step_dir(pen_ready) {
            StepOutcome::Hold => {}
            StepOutcome::OutOfBounds => {
                uwriteln!(&mut self.serial, "out of bounds!").unwrap_infallible();
            }
            StepOutcome::Step(step) => {
                if step.x != 0 {
                    self.x_motor.step(direction_of(step.x));
                } else if step.y != 0 {
                    self.y_motor.step(direction_of(step.y));
                }
            }
        }
    }

    /// Emits periodic telemetry and assembles at most one input line.
    fn handle_input(&mut self) {
        let now = self.clock.millis();
        if now.wrapping_sub(self.last_report_ms) >= REPORT_INTERVAL_MS {
            self.last_report_ms = now;
            let down = if self.pen.is_down() { 1u8 } else { 0 };
            uwriteln!(
                &mut self.serial,
                "STATE {} {} {} {}",
                self.cursor.cur(),
                self.cursor.from(),
                self.cursor.to(),
                down
            )
            .unwrap_infallible();
        }

        loop {
            let byte = match self.serial.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => return,
                Err(nb::Error::Other(infallible)) => match infallible {},
            };

            if byte == b'\n' {
                self.dispatch_line();
                self.input.clear();
                return;
            }

            if self.input.push(byte as char).is_err() {
                uwriteln!(&mut self.serial, "input buffer full, retry").unwrap_infallible();
                self.input.clear();
                return;
            }
        }
    }

    /// Parses the completed line and either runs it or reports why not.
    fn dispatch_line(&mut self) {
        let mut rest: &str = self.input.as_str();
        let command = match Command::parse(&mut rest) {
            Ok(command) => command,
            Err(ParseError::ExpectedComma) => {
                uwriteln!(&mut self.serial, "expected comma").unwrap_infallible();
                return;
            }
            Err(ParseError::TrailingInput) => {
                uwriteln!(&mut self.serial, "expected end of input, got \"{}\"", rest)
                    .unwrap_infallible();
                return;
            }
        };
        self.run(command);
    }

    fn run(&mut self, command: Command) {
        match command {
            Command::Cancel => {
                self.active = None;
                self.queue.clear();
                self.pen_up();
                self.cursor.halt();
            }
            Command::Reset => {
                self.active = None;
                self.queue.clear();
                self.pen_up();
                // Contract: the head has been parked at the new origin.
                self.cursor.reset();
            }
            Command::Lock => self.cursor.lock(),
            Command::Unlock => self.cursor.unlock(),
            Command::Pause => {
                if let Some(active) = self.active.as_mut() {
                    active.pause(&mut self.cursor);
                }
                self.pen_up();
            }
            Command::Resume => {
                let advance = match self.active.as_mut() {
                    Some(active) => active.resume(&mut self.cursor),
                    None => None,
                };
                if let Some(advance) = advance {
                    self.apply_advance(advance);
                }
            }
            Command::Pen(degrees) => {
                if self.reject_busy() {
                    return;
                }
                self.pen.set(&self.clock, degrees);
                uwriteln!(&mut self.serial, "pen at {}", degrees).unwrap_infallible();
            }
            Command::Go(target) => {
                if self.reject_busy() {
                    return;
                }
                self.pen_up();
                self.cursor.init(target, MOVE_SPEED);
            }
            Command::Halt => {
                if self.reject_busy() {
                    return;
                }
                self.cursor.halt();
            }
            Command::Line {
                from,
                to,
                stay_down,
            } => {
                self.enqueue(Move::linear(from, to, DEFAULT_SPEED, stay_down));
            }
            Command::Curve {
                from,
                ctrl1,
                ctrl2,
                to,
                stay_down,
            } => {
                self.enqueue(Move::bezier(from, ctrl1, ctrl2, to, DEFAULT_SPEED, stay_down));
            }
        }
    }

    /// Pops and advances moves until a sub-segment is in flight.
    fn advance(&mut self) {
        loop {
            if self.active.is_none() {
                self.active = self.queue.pop();
            }

            if !self.cursor.at_target() {
                return;
            }

            let advance = match self.active.as_mut() {
                None => {
                    self.cursor.halt();
                    return;
                }
                Some(active) if active.is_paused() => {
                    self.cursor.halt();
                    return;
                }
                Some(active) => active.next(&mut self.cursor),
            };
            self.apply_advance(advance);
        }
    }

    /// Applies the pen transition and completion report an advancement
    /// implies.
    fn apply_advance(&mut self, advance: Advance) {
        match advance {
            Advance::Approach => self.pen_up(),
            Advance::Draw => self.pen_down(),
            Advance::Done { stay_down } => {
                if !stay_down {
                    self.pen_up();
                }
                uwriteln!(&mut self.serial, "done").unwrap_infallible();
                self.active = None;
            }
        }
    }

    /// Queues a move, reporting `busy` if the queue is full.
    fn enqueue(&mut self, mv: Move) {
        if self.queue.push(mv).is_err() {
            uwriteln!(&mut self.serial, "busy").unwrap_infallible();
        }
    }

    /// Rejects commands that cannot run while a move is active.
    fn reject_busy(&mut self) -> bool {
        let busy = match self.active.as_ref() {
            Some(active) => !active.is_paused(),
            None => false,
        };
        if busy {
            uwriteln!(&mut self.serial, "busy").unwrap_infallible();
        }
        busy
    }

    fn pen_up(&mut self) {
        if self.pen.up(&self.clock) {
            uwriteln!(&mut self.serial, "pen up").unwrap_infallible();
        }
    }

    fn pen_down(&mut self) {
        if self.pen.down(&self.clock) {
            uwriteln!(&mut self.serial, "pen down").unwrap_infallible();
        }
    }
}

fn direction_of(sign: i32) -> Direction {
    if sign > 0 {
        Direction::Positive
    } else {
        Direction::Negative
    }
}
