//! Capabilities required of keys, elements and payloads.
//!
//! Keys and Set elements must be `Hashable`: equality-comparable and able to
//! feed a deterministic hash, or report that the particular instance cannot
//! be hashed. Payloads only need to be `Nullable`, so the tables can reject
//! null values without knowing the concrete type.

use crate::error::Unhashable;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Runtime type label of a key or element. Compared by the Set's mixed-type
/// diagnostic and carried by `TableError::UnhashableType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag(&'static str);

impl TypeTag {
    pub const fn new(name: &'static str) -> Self {
        TypeTag(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Values that may represent "nothing". Neither container stores a null key,
/// payload or element.
pub trait Nullable {
    fn is_null(&self) -> bool {
        false
    }
}

/// Keys and elements: `Eq` plus a hash that may fail per instance.
///
/// Implementations must keep `try_hash` consistent with `Eq` and
/// deterministic for a given instance; the tables assume but do not check it.
pub trait Hashable: Nullable + Eq {
    /// Feeds `self` into `state`, or reports that this instance is unhashable.
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable>;

    /// Runtime type of this instance. Defaults to the static type name.
    fn type_tag(&self) -> TypeTag {
        TypeTag::new(core::any::type_name::<Self>())
    }
}

macro_rules! hashable_via_hash {
    ($($t:ty),* $(,)?) => {$(
        impl Nullable for $t {}

        impl Hashable for $t {
            #[inline]
            fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
                Hash::hash(self, state);
                Ok(())
            }
        }
    )*};
}

hashable_via_hash!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, (), String, str,
);

// Floats have no `Eq`, so they can be payloads but never keys.
impl Nullable for f32 {}
impl Nullable for f64 {}

impl<T: Nullable + ?Sized> Nullable for &T {
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        (**self).try_hash(state)
    }

    fn type_tag(&self) -> TypeTag {
        (**self).type_tag()
    }
}

impl<T: Nullable + ?Sized> Nullable for Box<T> {
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

impl<T: Hashable + ?Sized> Hashable for Box<T> {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        (**self).try_hash(state)
    }

    fn type_tag(&self) -> TypeTag {
        (**self).type_tag()
    }
}

impl<T> Nullable for Vec<T> {}

impl<T: Hashable> Hashable for Vec<T> {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        state.write_usize(self.len());
        self.iter().try_for_each(|item| item.try_hash(state))
    }
}

impl<T: Nullable> Nullable for Option<T> {
    fn is_null(&self) -> bool {
        match self {
            Some(v) => v.is_null(),
            None => true,
        }
    }
}

impl<T: Hashable> Hashable for Option<T> {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        match self {
            Some(v) => {
                state.write_u8(1);
                v.try_hash(state)
            }
            None => {
                state.write_u8(0);
                Ok(())
            }
        }
    }

    fn type_tag(&self) -> TypeTag {
        match self {
            Some(v) => v.type_tag(),
            None => TypeTag::new("NoneType"),
        }
    }
}

impl<A, B> Nullable for (A, B) {}

impl<A: Hashable, B: Hashable> Hashable for (A, B) {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        self.0.try_hash(state)?;
        self.1.try_hash(state)
    }
}

impl<A, B, C> Nullable for (A, B, C) {}

impl<A: Hashable, B: Hashable, C: Hashable> Hashable for (A, B, C) {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        self.0.try_hash(state)?;
        self.1.try_hash(state)?;
        self.2.try_hash(state)
    }
}
