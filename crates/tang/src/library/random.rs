//! `Random` library (§6.4): `global` (a shared RNG singleton), `default` (seeded
//! from the clock), `seeded(n)` (a factory), all producing `Rng` Values whose
//! `next_int`/`next_float`/`next_bool` draws are implemented in `value::index::period`.
//!
//! All three are registered as [`LibraryAttr::Function`] rather than
//! [`LibraryAttr::Value`]: producing an `Rng` needs a [`GcList`] to register the
//! new heap object against, and `Random.global` additionally needs the owning
//! [`crate::context::ExecutionContext`] to cache the shared generator across
//! accesses, neither of which a bare `fn() -> Value` attribute has access to. A
//! script reads them as `Random.global()`/`Random.default()`/`Random.seeded(n)`.

use ahash::AHashMap;

use crate::gc::GcList;
use crate::scope::hash_identifier;
use crate::value::{ErrorValue, HeapObject, LibraryAttr, NativeFn, RngObject, Value, ValueData};

/// The standard 64-bit Mersenne Twister (MT19937-64) recurrence. Hand-rolled rather
/// than pulled from a crate: §6.4's `next_float` contract ("an integer draw divided
/// by the generator's maximum") needs the exact MT19937-64 stream bit-for-bit, which
/// a general-purpose `rand` crate does not guarantee to reproduce run to run.
#[derive(Debug, Clone)]
pub struct MersenneTwister64 {
    state: [u64; Self::N],
    index: usize,
}

impl MersenneTwister64 {
    const N: usize = 312;
    const M: usize = 156;
    const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
    const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000;
    const LOWER_MASK: u64 = 0x7FFF_FFFF;

    pub fn new(seed: u64) -> Self {
        let mut state = [0u64; Self::N];
        state[0] = seed;
        for i in 1..Self::N {
            state[i] = 6364136223846793005u64
                .wrapping_mul(state[i - 1] ^ (state[i - 1] >> 62))
                .wrapping_add(i as u64);
        }
        Self { state, index: Self::N }
    }

    /// Seeds from the host clock, for `Random.default`/`Random.global` (§6.4).
    pub fn from_clock() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0);
        Self::new(nanos)
    }

    fn regenerate(&mut self) {
        const MAG01: [u64; 2] = [0, Self::MATRIX_A];
        for i in 0..Self::N {
            let x = (self.state[i] & Self::UPPER_MASK) | (self.state[(i + 1) % Self::N] & Self::LOWER_MASK);
            self.state[i] = self.state[(i + Self::M) % Self::N] ^ (x >> 1) ^ MAG01[(x & 1) as usize];
        }
        self.index = 0;
    }

    pub fn next_u64(&mut self) -> u64 {
        if self.index >= Self::N {
            self.regenerate();
        }
        let mut y = self.state[self.index];
        self.index += 1;
        y ^= (y >> 29) & 0x5555_5555_5555_5555;
        y ^= (y << 17) & 0x71D6_7FFF_EDA6_0000;
        y ^= (y << 37) & 0xFFF7_EEE0_0000_0000;
        y ^= y >> 43;
        y
    }
}

pub(crate) fn make_rng_value(state: MersenneTwister64, gc: &mut GcList) -> Value {
    let id = gc.register(HeapObject::Rng(RngObject { state }));
    Value::reference(ValueData::Rng(id), false)
}

fn bad_seed() -> Value {
    Value::error(ErrorValue::Message("Random.seeded expects one integer argument".to_string()))
}

fn global(ctx: &mut crate::context::ExecutionContext, _args: &[Value]) -> Value {
    ctx.global_rng()
}

fn default(ctx: &mut crate::context::ExecutionContext, _args: &[Value]) -> Value {
    make_rng_value(MersenneTwister64::from_clock(), &mut ctx.gc)
}

fn seeded(ctx: &mut crate::context::ExecutionContext, args: &[Value]) -> Value {
    let seed = match args.first().map(|v| &v.data) {
        Some(ValueData::Integer(i)) => *i as u64,
        Some(ValueData::Float(f)) => *f as u64,
        _ => return bad_seed(),
    };
    make_rng_value(MersenneTwister64::new(seed), &mut ctx.gc)
}

pub fn create(gc: &mut GcList) -> Value {
    let mut attrs: AHashMap<u64, LibraryAttr> = AHashMap::new();
    attrs.insert(hash_identifier("global"), LibraryAttr::Function(global as NativeFn));
    attrs.insert(hash_identifier("default"), LibraryAttr::Function(default as NativeFn));
    attrs.insert(hash_identifier("seeded"), LibraryAttr::Function(seeded as NativeFn));
    super::make_library("Random", attrs, gc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_stream() {
        let mut a = MersenneTwister64::new(123);
        let mut b = MersenneTwister64::new(123);
        assert_eq!(a.next_u64(), b.next_u64());
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = MersenneTwister64::new(1);
        let mut b = MersenneTwister64::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn global_rng_is_stable_across_accesses() {
        let mut ctx = crate::context::ExecutionContext::new();
        let first = ctx.global_rng();
        let second = ctx.global_rng();
        assert!(matches!((&first.data, &second.data), (ValueData::Rng(a), ValueData::Rng(b)) if a == b));
    }

    #[test]
    fn seeded_rejects_non_numeric_argument() {
        let mut ctx = crate::context::ExecutionContext::new();
        let result = seeded(&mut ctx, &[Value::string(crate::string::TangString::empty())]);
        assert!(result.is_error());
    }
}
