use core::cell::Cell;

use arduino_hal::pac::TC0;

/// Monotonic time source built on TC0.
///
/// TC0 free-runs at clk/64, one tick per 4 us at 16 MHz. The 8-bit
/// hardware counter is widened in software on every read, so the clock
/// must be sampled at least once per 1.024 ms or ticks are lost. The main
/// loop's pacing wait polls `micros()` continuously, which satisfies this
/// by a wide margin without any interrupt handling.
pub struct Clock {
    tc0: TC0,
    last_count: Cell<u8>,
    micros: Cell<u32>,
    millis: Cell<u32>,
    micros_carry: Cell<u32>,
}

impl Clock {
    const US_PER_TICK: u32 = 4;

    /// Takes ownership of TC0 and starts it free-running.
    pub fn new(tc0: TC0) -> Self {
        tc0.tccr0a.reset();
        tc0.tccr0b.write(|w| w.cs0().prescale_64());

        Self {
            tc0,
            last_count: Cell::new(0),
            micros: Cell::new(0),
            millis: Cell::new(0),
            micros_carry: Cell::new(0),
        }
    }

    /// Folds the hardware ticks elapsed since the previous sample into
    /// the widened counters.
    fn sample(&self) -> u32 {
        let count = self.tc0.tcnt0.read().bits();
        let ticks = count.wrapping_sub(self.last_count.get());
        self.last_count.set(count);

        let delta = ticks as u32 * Self::US_PER_TICK;
        let micros = self.micros.get().wrapping_add(delta);
        self.micros.set(micros);

        let carry = self.micros_carry.get() + delta;
        self.millis.set(self.millis.get().wrapping_add(carry / 1000));
        self.micros_carry.set(carry % 1000);

        micros
    }
}

impl corexy::Clock for Clock {
    fn micros(&self) -> u32 {
        self.sample()
    }

    fn millis(&self) -> u32 {
        self.sample();
        self.millis.get()
    }
}
