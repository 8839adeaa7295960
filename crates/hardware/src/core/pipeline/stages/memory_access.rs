//! Memory Access (MEM) Stage.

use crate::common::SimError;
use crate::core::cache::{CacheRead, CacheWrite};
use crate::core::pipeline::{ExMem, MemWb, Pipeline, Stage};
use crate::isa::Opcode;
use crate::system::{BusCommand, System};

/// Performs the cache access of loads and stores.
///
/// On a miss the instruction stays in EX/MEM, the pipeline freezes at this
/// stage and a BusRd (load) or BusRdX (store) is queued. After the bus
/// resolves the miss the access is retried and hits. A store-conditional
/// re-checks its reservation before every attempt.
pub fn mem_stage(pipe: &mut Pipeline, system: &mut System) -> Result<(), SimError> {
    if pipe.is_stalled(Stage::Memory) || !pipe.mem_wb.inst.is_bubble() {
        return Ok(());
    }
    let ExMem {
        pc,
        inst,
        result,
        addr,
        store_data,
    } = pipe.ex_mem;
    if inst.is_bubble() {
        return Ok(());
    }

    let core = pipe.core_id;
    let value = match (inst.op, addr) {
        (Opcode::Load { .. }, Some(addr)) => match system.caches[core].read(addr) {
            CacheRead::Hit(data) => data,
            CacheRead::Miss => {
                pipe.freeze(Stage::Memory);
                system.bus.request(core, BusCommand::BusRd, addr)?;
                return Ok(());
            }
        },
        // Another core wrote the line after this `sc` succeeded: it fails here.
        (Opcode::Store { conditional: true }, Some(addr))
            if !system.bus.conditional_still_held(core, addr) =>
        {
            0
        }
        (Opcode::Store { conditional }, Some(addr)) => {
            match system.caches[core].write(addr, store_data) {
                CacheWrite::Success => {
                    if conditional {
                        system.bus.release_conditional(core, addr);
                    }
                    result
                }
                CacheWrite::Fail => {
                    pipe.freeze(Stage::Memory);
                    system.bus.request(core, BusCommand::BusRdX, addr)?;
                    return Ok(());
                }
            }
        }
        _ => result,
    };

    pipe.ex_mem = ExMem::bubble();
    pipe.mem_wb = MemWb { pc, inst, value };
    pipe.busy(Stage::Memory);
    Ok(())
}
