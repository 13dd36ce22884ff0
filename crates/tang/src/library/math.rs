//! `Math` library (§6.4): a single `pi` attribute, grounded on
//! `examples/original_source/src/library/libraryMath.c`'s `gta_library_math_make_pi`
//! — a cached `Float` singleton returned unconditionally, never recomputed.

use std::sync::OnceLock;

use ahash::AHashMap;

use crate::gc::GcList;
use crate::scope::hash_identifier;
use crate::value::{Flags, LibraryAttr, Value, ValueData};

static PI: OnceLock<Value> = OnceLock::new();

fn pi() -> Value {
    PI.get_or_init(|| Value {
        data: ValueData::Float(std::f64::consts::PI),
        flags: Flags {
            is_true: true,
            is_singleton: true,
            ..Default::default()
        },
    })
    .clone()
}

pub fn create(gc: &mut GcList) -> Value {
    let mut attrs: AHashMap<u64, LibraryAttr> = AHashMap::new();
    attrs.insert(hash_identifier("pi"), LibraryAttr::Value(pi));
    super::make_library("Math", attrs, gc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_is_a_stable_singleton() {
        let a = pi();
        let b = pi();
        assert!(a.is_singleton());
        assert!(matches!((&a.data, &b.data), (ValueData::Float(x), ValueData::Float(y)) if x == y));
    }
}
