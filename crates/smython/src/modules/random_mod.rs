//! The `random` module stub: `seed` and `randint`.
//!
//! The generator is owned by the runtime. `seed(n)` makes subsequent draws
//! deterministic; an unseeded generator is initialized from entropy on
//! first use.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    eval::{Args, Vm},
    exceptions::{ExcType, RunResult},
    modules::ModuleFunction,
    types::Module,
    value::Value,
};

pub fn populate(vm: &mut Vm<'_>, module: &Module) -> RunResult<()> {
    module.set(
        vm.interns.intern("seed"),
        Value::ModuleFunction(ModuleFunction::RandomSeed),
    );
    module.set(
        vm.interns.intern("randint"),
        Value::ModuleFunction(ModuleFunction::RandomRandint),
    );
    Ok(())
}

pub fn seed(vm: &mut Vm<'_>, args: &Args) -> RunResult<Value> {
    match args.as_slice() {
        [] => {
            *vm.rng = Some(StdRng::from_entropy());
            Ok(Value::None)
        }
        [value] => match value.as_int() {
            Some(n) => {
                #[expect(clippy::cast_sign_loss, reason = "the seed is a bit pattern")]
                let rng = StdRng::seed_from_u64(n as u64);
                *vm.rng = Some(rng);
                Ok(Value::None)
            }
            None => Err(ExcType::TypeError.raise(format_args!(
                "seed() argument must be an integer, not '{}'",
                value.type_name()
            ))),
        },
        other => Err(ExcType::arg_count("seed", 1, other.len())),
    }
}

/// A random integer in the inclusive range `[a, b]`.
pub fn randint(vm: &mut Vm<'_>, args: &Args) -> RunResult<Value> {
    let (a, b) = match args.as_slice() {
        [a, b] => match (a.as_int(), b.as_int()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(ExcType::TypeError.raise("randint() arguments must be integers"));
            }
        },
        other => return Err(ExcType::arg_count("randint", 2, other.len())),
    };
    if a > b {
        return Err(ExcType::ValueError.raise("empty range for randint()"));
    }
    let rng = vm.rng.get_or_insert_with(StdRng::from_entropy);
    Ok(Value::Int(rng.gen_range(a..=b)))
}
