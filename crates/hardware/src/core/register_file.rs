use crate::common::constants::{NUM_REGS, REG_ZERO};

/// Sixteen signed 32-bit registers; `$0` is hardwired to zero.
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    regs: [i32; NUM_REGS],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, idx: usize) -> i32 {
        if idx == REG_ZERO { 0 } else { self.regs[idx] }
    }

    pub fn write(&mut self, idx: usize, val: i32) {
        if idx != REG_ZERO {
            self.regs[idx] = val;
        }
    }

    pub fn snapshot(&self) -> [i32; NUM_REGS] {
        self.regs
    }

    pub fn dump(&self) {
        for i in (0..NUM_REGS).step_by(4) {
            println!(
                "${:<2}={:<11} ${:<2}={:<11} ${:<2}={:<11} ${:<2}={:<11}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1],
                i + 2,
                self.regs[i + 2],
                i + 3,
                self.regs[i + 3]
            );
        }
    }
}
