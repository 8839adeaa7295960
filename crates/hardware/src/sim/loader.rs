use std::fs;
use std::path::Path;

use log::info;

use crate::common::LoadError;
use crate::isa::{Instruction, parse_program};

/// Reads and parses one program file.
pub fn load_program(path: &Path) -> Result<Vec<Instruction>, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let program = parse_program(&text)?;
    info!(
        "[Loader] {} instruction(s) from {}",
        program.len(),
        path.display()
    );
    Ok(program)
}

/// Loads one program per core, in order.
pub fn load_programs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Vec<Instruction>>, LoadError> {
    paths.iter().map(|p| load_program(p.as_ref())).collect()
}
