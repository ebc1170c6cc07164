/*!
Pieces shared by the APU channels: the volume envelope and the length
counter.

Length counters count up to their limit (64 for pulse/noise, 256 for
wave); reaching the limit with length-enable set silences the channel.
The "obscure length" behavior lives in `write_enable`: setting the enable
bit while the frame sequencer sits on a step that will not clock lengths
next gives the counter one immediate extra clock.
*/

/// Volume envelope (NRx2). A period of 0 disables the envelope, but a
/// trigger still reloads the internal timer with 8.
#[derive(Debug, Default, Clone, Copy)]
pub struct Envelope {
    pub initial_volume: u8,
    pub increase: bool,
    pub period: u8,
    pub volume: u8,
    timer: u8,
}

impl Envelope {
    pub fn write(&mut self, value: u8) {
        self.initial_volume = value >> 4;
        self.increase = value & 0x08 != 0;
        self.period = value & 0x07;
    }

    pub fn read(&self) -> u8 {
        self.initial_volume << 4 | (self.increase as u8) << 3 | self.period
    }

    pub fn trigger(&mut self) {
        self.timer = if self.period != 0 { self.period } else { 8 };
        self.volume = self.initial_volume;
    }

    /// Frame-sequencer step 7.
    pub fn tick(&mut self) {
        if self.period == 0 {
            return;
        }
        self.timer -= 1;
        if self.timer == 0 {
            self.timer = self.period;
            if self.increase && self.volume < 15 {
                self.volume += 1;
            } else if !self.increase && self.volume > 0 {
                self.volume -= 1;
            }
        }
    }

    pub fn save_raw(&self) -> [u8; 3] {
        [self.read(), self.volume, self.timer]
    }

    pub fn load_raw(&mut self, raw: [u8; 3]) {
        self.write(raw[0]);
        self.volume = raw[1];
        self.timer = raw[2];
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LengthCounter {
    pub counter: u16,
    pub enabled: bool,
    max: u16,
}

impl LengthCounter {
    pub fn new(max: u16) -> Self {
        LengthCounter { counter: 0, enabled: false, max }
    }

    pub fn load(&mut self, value: u8) {
        self.counter = if self.max == 256 { value as u16 } else { (value & 0x3F) as u16 };
    }

    /// Frame-sequencer steps 0/2/4/6. Returns true when the channel must
    /// be disabled.
    pub fn tick(&mut self) -> bool {
        if self.enabled && self.counter < self.max {
            self.counter += 1;
            return self.counter == self.max;
        }
        false
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.enabled && self.counter == self.max
    }

    /// NRx4 length-enable write. `next_step_skips_length` is true when
    /// the frame sequencer's next step is not a length step (current step
    /// odd); a rising enable edge then clocks the counter once
    /// immediately. Returns true when that extra clock expires the
    /// counter and no trigger accompanies the write.
    pub fn write_enable(&mut self, enable: bool, triggered: bool, next_step_skips_length: bool) -> bool {
        let rising = !self.enabled && enable;
        self.enabled = enable;
        if rising && next_step_skips_length && self.counter < self.max {
            self.counter += 1;
            if self.counter == self.max && !triggered {
                return true;
            }
        }
        false
    }

    /// Trigger reload: an expired counter restarts from 0, and with
    /// enable set on a non-length step it immediately counts its first
    /// step.
    pub fn trigger(&mut self, next_step_skips_length: bool) {
        if self.counter == self.max {
            self.counter = 0;
            if self.enabled && next_step_skips_length {
                self.counter += 1;
            }
        }
    }
}
