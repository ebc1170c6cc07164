/*!
MBC3 real-time clock.

Five live fields (seconds, minutes, hours, 9-bit day counter split across
DL and DH) tick once per wall-clock second; a 0->1 write to the latch
range copies them into the latched set that the register window actually
exposes. DH bit 6 halts the clock, bit 7 is the sticky day-overflow flag.

Two time sources:
- emulated (default): a T-cycle counter divides the CPU clock down to
  seconds, so emulated time is deterministic and save-state friendly;
- real: fields derive from the host clock against a stored epoch, the way
  cartridges keep time while the console is off.
*/

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::state::{StateReader, StateWriter};

/// T-cycles per RTC second (the CPU crystal).
pub const TICKS_PER_SECOND: u64 = 4_194_304;

#[derive(Debug, Default, Clone, Copy)]
pub struct RtcClock {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub day_low: u8,
    pub day_high: u8,
}

impl RtcClock {
    fn compose_seconds(&self) -> u64 {
        let days = (self.day_low as u64) | ((self.day_high as u64 & 0x01) << 8);
        self.seconds as u64 + 60 * (self.minutes as u64 + 60 * (self.hours as u64 + 24 * days))
    }
}

#[derive(Debug, Default)]
pub struct Rtc {
    pub live: RtcClock,
    pub latched: RtcClock,
    real_rtc: bool,
    counter: u64,
    zero_time: u64,
}

fn now_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

impl Rtc {
    pub fn new(real_rtc: bool) -> Self {
        let mut rtc = Rtc { real_rtc, ..Default::default() };
        if real_rtc {
            rtc.zero_time = now_seconds();
        }
        rtc
    }

    #[inline]
    pub fn halted(&self) -> bool {
        self.live.day_high & 0x40 != 0
    }

    /// One T-cycle of the emulated time base.
    pub fn tick(&mut self) {
        if self.real_rtc || self.halted() {
            return;
        }
        self.counter += 1;
        if self.counter == TICKS_PER_SECOND {
            self.counter = 0;
            self.tick_second();
        }
    }

    fn tick_second(&mut self) {
        self.live.seconds += 1;
        if self.live.seconds < 60 {
            return;
        }
        self.live.seconds = 0;
        self.live.minutes += 1;
        if self.live.minutes < 60 {
            return;
        }
        self.live.minutes = 0;
        self.live.hours += 1;
        if self.live.hours < 24 {
            return;
        }
        self.live.hours = 0;
        let (day_low, carry) = self.live.day_low.overflowing_add(1);
        self.live.day_low = day_low;
        if carry {
            if self.live.day_high & 0x01 != 0 {
                // Past day 511: wrap and latch the sticky overflow bit.
                self.live.day_high &= !0x01;
                self.live.day_high |= 0x80;
            } else {
                self.live.day_high |= 0x01;
            }
        }
    }

    /// Refresh the live fields from the host clock (real-RTC mode only).
    fn update_from_host(&mut self) {
        if !self.real_rtc || self.halted() {
            return;
        }
        let diff = now_seconds().saturating_sub(self.zero_time);
        self.live.seconds = (diff % 60) as u8;
        self.live.minutes = (diff / 60 % 60) as u8;
        self.live.hours = (diff / 3600 % 24) as u8;
        let days = diff / 86_400;
        self.live.day_low = days as u8;
        self.live.day_high &= !0x01;
        self.live.day_high |= ((days >> 8) & 0x01) as u8;
        if days > 0x1FF {
            self.live.day_high |= 0x80;
        }
    }

    /// 0->1 write to 0x6000-0x7FFF.
    pub fn latch(&mut self) {
        self.update_from_host();
        self.latched = self.live;
    }

    /// Register window reads (RAM-bank index 0x08-0x0C).
    pub fn read(&self, index: u8) -> u8 {
        match index {
            0x08 => self.latched.seconds,
            0x09 => self.latched.minutes,
            0x0A => self.latched.hours,
            0x0B => self.latched.day_low,
            0x0C => self.latched.day_high,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, index: u8, value: u8) {
        match index {
            0x08 => {
                self.live.seconds = value & 0x3F;
                self.counter = 0;
            }
            0x09 => self.live.minutes = value & 0x3F,
            0x0A => self.live.hours = value & 0x1F,
            0x0B => self.live.day_low = value,
            0x0C => self.live.day_high = value & 0xC1,
            _ => {}
        }
        if self.real_rtc {
            self.zero_time = now_seconds().saturating_sub(self.live.compose_seconds());
        }
    }

    /// Battery-file snapshot: live fields, latched fields, halt flag, and
    /// the epoch second the snapshot was taken at.
    pub fn snapshot(&self) -> [u8; 19] {
        let mut out = [0u8; 19];
        out[0] = self.live.seconds;
        out[1] = self.live.minutes;
        out[2] = self.live.hours;
        out[3] = self.live.day_low;
        out[4] = self.live.day_high;
        out[5] = self.latched.seconds;
        out[6] = self.latched.minutes;
        out[7] = self.latched.hours;
        out[8] = self.latched.day_low;
        out[9] = self.latched.day_high;
        out[10] = self.halted() as u8;
        out[11..19].copy_from_slice(&now_seconds().to_le_bytes());
        out
    }

    /// Restore from a battery-file snapshot. In real-RTC mode the elapsed
    /// wall-clock time since the snapshot is credited to the clock.
    pub fn restore(&mut self, snap: &[u8; 19]) {
        self.live = RtcClock {
            seconds: snap[0],
            minutes: snap[1],
            hours: snap[2],
            day_low: snap[3],
            day_high: snap[4],
        };
        self.latched = RtcClock {
            seconds: snap[5],
            minutes: snap[6],
            hours: snap[7],
            day_low: snap[8],
            day_high: snap[9],
        };
        if self.real_rtc {
            // Credit the wall-clock time that passed while powered off.
            let saved_at = u64::from_le_bytes(snap[11..19].try_into().unwrap());
            self.zero_time = saved_at.saturating_sub(self.live.compose_seconds());
            self.update_from_host();
        }
    }

    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        for clock in [&self.live, &self.latched] {
            w.put_bytes(&[clock.seconds, clock.minutes, clock.hours, clock.day_low, clock.day_high]);
        }
        w.put_u64(self.counter);
        w.put_u64(self.zero_time);
    }

    pub(crate) fn load_state(&mut self, r: &mut StateReader) -> Result<()> {
        for clock in [&mut self.live, &mut self.latched] {
            let mut bytes = [0u8; 5];
            r.get_bytes(&mut bytes)?;
            [clock.seconds, clock.minutes, clock.hours, clock.day_low, clock.day_high] = bytes;
        }
        self.counter = r.get_u64()?;
        self.zero_time = r.get_u64()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Jump the divider to one tick short of a second, then tick once.
    fn advance_seconds(rtc: &mut Rtc, secs: u64) {
        for _ in 0..secs {
            rtc.counter = TICKS_PER_SECOND - 1;
            rtc.tick();
        }
    }

    #[test]
    fn seconds_roll_into_minutes() {
        let mut rtc = Rtc::new(false);
        advance_seconds(&mut rtc, 61);
        rtc.latch();
        assert_eq!(rtc.read(0x08), 1);
        assert_eq!(rtc.read(0x09), 1);
    }

    #[test]
    fn latch_freezes_visible_fields() {
        let mut rtc = Rtc::new(false);
        advance_seconds(&mut rtc, 2);
        rtc.latch();
        advance_seconds(&mut rtc, 3);
        assert_eq!(rtc.read(0x08), 2, "latched copy unaffected by live ticks");
        rtc.latch();
        assert_eq!(rtc.read(0x08), 5);
    }

    #[test]
    fn halt_bit_stops_the_clock() {
        let mut rtc = Rtc::new(false);
        rtc.write(0x0C, 0x40);
        advance_seconds(&mut rtc, 5);
        rtc.latch();
        assert_eq!(rtc.read(0x08), 0);
    }

    #[test]
    fn day_counter_carries_and_overflows_sticky() {
        let mut rtc = Rtc::new(false);
        rtc.write(0x0B, 0xFF);
        rtc.write(0x0C, 0x01); // day 511
        rtc.write(0x0A, 23);
        rtc.write(0x09, 59);
        rtc.write(0x08, 59);
        advance_seconds(&mut rtc, 1);
        rtc.latch();
        assert_eq!(rtc.read(0x0B), 0);
        assert_eq!(rtc.read(0x0C) & 0x01, 0);
        assert_eq!(rtc.read(0x0C) & 0x80, 0x80, "overflow bit set");
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut rtc = Rtc::new(false);
        advance_seconds(&mut rtc, 90);
        rtc.latch();
        let snap = rtc.snapshot();
        let mut other = Rtc::new(false);
        other.restore(&snap);
        assert_eq!(other.live.minutes, 1);
        assert_eq!(other.live.seconds, 30);
        assert_eq!(other.latched.minutes, 1);
    }
}
