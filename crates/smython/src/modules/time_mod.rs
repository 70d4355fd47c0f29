//! The `time` module stub. Deliberately empty: scripts may import it, but
//! it exposes nothing.

use crate::{eval::Vm, exceptions::RunResult, types::Module};

pub fn populate(_vm: &mut Vm<'_>, _module: &Module) -> RunResult<()> {
    Ok(())
}
