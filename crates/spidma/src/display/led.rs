//! Status LED as activity display

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use platform::ActivityDisplay;

/// LED on/off time of one startup blink
pub const BLINK_PERIOD_MS: u32 = 100;

/// The rotor toggles the LED every 64 spins
pub const ROTOR_TOGGLE_SHIFT: u32 = 6;

/// A single LED: blinks at startup, flickers while the kernel spins.
pub struct LedActivity<P, D> {
    led: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> LedActivity<P, D> {
    /// `led` is active high; `delay` paces the startup blinks.
    pub fn new(led: P, delay: D) -> Self {
        Self { led, delay }
    }

    /// Give back the pin and delay
    pub fn release(self) -> (P, D) {
        (self.led, self.delay)
    }
}

impl<P: OutputPin, D: DelayNs> ActivityDisplay for LedActivity<P, D> {
    type Error = P::Error;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.led.set_low()
    }

    fn rotor(&mut self, _index: u32, count: u32) {
        let on = count.wrapping_shr(ROTOR_TOGGLE_SHIFT) & 1 == 1;
        let _ = self.led.set_state(on.into());
    }

    fn blink(&mut self, times: u32) {
        for _ in 0..times {
            let _ = self.led.set_high();
            self.delay.delay_ms(BLINK_PERIOD_MS);
            let _ = self.led.set_low();
            self.delay.delay_ms(BLINK_PERIOD_MS);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn blink_toggles_pin_each_time() {
        let expectations: std::vec::Vec<_> = (0..5)
            .flat_map(|_| {
                [
                    PinTransaction::set(PinState::High),
                    PinTransaction::set(PinState::Low),
                ]
            })
            .collect();
        let mut pin = PinMock::new(&expectations);
        let mut led = LedActivity::new(pin.clone(), NoopDelay);
        led.blink(5);
        pin.done();
    }

    #[test]
    fn rotor_flickers_every_sixty_four_spins() {
        let mut pin = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut led = LedActivity::new(pin.clone(), NoopDelay);
        led.rotor(0, 0);
        led.rotor(0, 63);
        led.rotor(0, 64);
        led.rotor(0, 128);
        pin.done();
    }

    #[test]
    fn initialize_switches_led_off() {
        let mut pin = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut led = LedActivity::new(pin.clone(), NoopDelay);
        led.initialize().unwrap();
        pin.done();
    }
}
