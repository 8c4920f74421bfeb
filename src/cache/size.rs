//! Size Estimator Module
//!
//! Approximates the memory footprint of keys and values so the cache can
//! enforce a byte bound without runtime memory introspection.
//!
//! Every cacheable type describes itself as one [`Shape`] and
//! [`estimate_size`] applies the rule for that shape recursively:
//!
//! | Shape       | Estimate                                               |
//! |-------------|--------------------------------------------------------|
//! | `Scalar`    | the value's own byte width                             |
//! | `Text`      | string header + content length                         |
//! | `Reference` | handle, plus the referenced value when present         |
//! | `Sequence`  | header + capacity x slot width + each element          |
//! | `Map`       | header + every stored key and value                    |
//! | `Record`    | sum of all fields, no header                           |
//! | `Array`     | sum of all elements, no header                         |
//! | `Opaque`    | a fixed byte count, nested content ignored             |

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::mem;
use std::rc::Rc;
use std::sync::Arc;

// == Public Constants ==
/// Cost of a pointer-sized handle.
pub const HANDLE_SIZE: usize = mem::size_of::<usize>();

/// Fixed cost of a text value before its content.
pub const TEXT_HEADER: usize = mem::size_of::<String>();

/// Fixed cost of a growable sequence before its slots.
pub const SEQUENCE_HEADER: usize = mem::size_of::<Vec<u8>>();

/// Fixed cost of an associative collection before its pairs.
pub const MAP_HEADER: usize = mem::size_of::<HashMap<u8, u8>>();

/// Nesting depth past which values are counted as a bare handle.
///
/// Owned Rust values cannot form cycles, but `Rc`/`Arc` graphs built with
/// interior mutability can. The bound keeps estimation finite for those.
pub const MAX_DEPTH: usize = 64;

// == Shape ==
/// Lazily walked elements of a collection.
pub type Items<'a> = Box<dyn Iterator<Item = &'a dyn EstimateSize> + 'a>;

/// Lazily walked key/value pairs of an associative collection.
pub type Pairs<'a> = Box<dyn Iterator<Item = (&'a dyn EstimateSize, &'a dyn EstimateSize)> + 'a>;

/// How a value is laid out, as far as size estimation is concerned.
///
/// Collections hand out iterators rather than collected lists, so estimating
/// a value never allocates in proportion to its element count.
pub enum Shape<'a> {
    /// Fixed-width value occupying the given number of bytes.
    Scalar(usize),
    /// Text with the given content length in bytes.
    Text(usize),
    /// Handle to another value, `None` when empty.
    Reference(Option<&'a dyn EstimateSize>),
    /// Growable sequence. `capacity` slots of `slot` bytes are allocated.
    Sequence {
        capacity: usize,
        slot: usize,
        items: Items<'a>,
    },
    /// Associative collection of key/value pairs.
    Map(Pairs<'a>),
    /// Record whose fields are counted without a header.
    Record(Items<'a>),
    /// Fixed-length array whose elements are counted without a header.
    Array(Items<'a>),
    /// Value of unknown layout, counted as the given number of bytes.
    Opaque(usize),
}

impl<'a> Shape<'a> {
    /// Builds a [`Shape::Record`] from a fixed list of fields.
    pub fn record<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a dyn EstimateSize>,
        I::IntoIter: 'a,
    {
        Shape::Record(Box::new(fields.into_iter()))
    }

    /// Builds a [`Shape::Array`] from a slice of elements.
    pub fn array<T: EstimateSize + 'a>(items: &'a [T]) -> Self {
        Shape::Array(Box::new(items.iter().map(|v| v as &dyn EstimateSize)))
    }

    /// Builds a [`Shape::Sequence`] whose `capacity` slots hold `T`.
    pub fn sequence<T, I>(capacity: usize, items: I) -> Self
    where
        T: EstimateSize + 'a,
        I: Iterator<Item = &'a T> + 'a,
    {
        Shape::Sequence {
            capacity,
            slot: mem::size_of::<T>(),
            items: Box::new(items.map(|v| v as &dyn EstimateSize)),
        }
    }
}

// == Estimate Size Trait ==
/// Types whose memory footprint the cache can estimate.
///
/// Implemented for primitives, strings, smart pointers, the standard
/// collections, tuples and arrays. Structs can use
/// [`impl_record_shape!`](crate::impl_record_shape) or implement
/// [`EstimateSize::shape`] by hand. Anything else can be wrapped in
/// [`Opaque`].
pub trait EstimateSize {
    /// Describes this value's layout.
    fn shape(&self) -> Shape<'_>;
}

// == Estimation ==
/// Returns the estimated size of `value` in bytes.
///
/// Deterministic and infallible: the same value always yields the same
/// estimate, and longer content never yields a smaller one.
pub fn estimate_size(value: &dyn EstimateSize) -> usize {
    estimate_at(value, 0)
}

/// Returns the estimated size of a key/value pair as stored in the cache.
pub fn entry_size<K, V>(key: &K, value: &V) -> usize
where
    K: EstimateSize + ?Sized,
    V: EstimateSize + ?Sized,
{
    key_or_value_size(key).saturating_add(key_or_value_size(value))
}

fn key_or_value_size<T: EstimateSize + ?Sized>(value: &T) -> usize {
    estimate_shape(value.shape(), 0)
}

fn estimate_at(value: &dyn EstimateSize, depth: usize) -> usize {
    if depth > MAX_DEPTH {
        return HANDLE_SIZE;
    }
    estimate_shape(value.shape(), depth)
}

fn estimate_shape(shape: Shape<'_>, depth: usize) -> usize {
    let next = depth + 1;
    match shape {
        Shape::Scalar(bytes) => bytes,
        Shape::Text(len) => TEXT_HEADER.saturating_add(len),
        Shape::Reference(None) => HANDLE_SIZE,
        Shape::Reference(Some(inner)) => HANDLE_SIZE.saturating_add(estimate_at(inner, next)),
        Shape::Sequence {
            capacity,
            slot,
            items,
        } => SEQUENCE_HEADER
            .saturating_add(capacity.saturating_mul(slot))
            .saturating_add(sum_items(items, next)),
        Shape::Map(pairs) => pairs.fold(MAP_HEADER, |acc, (k, v)| {
            acc.saturating_add(estimate_at(k, next))
                .saturating_add(estimate_at(v, next))
        }),
        Shape::Record(fields) => sum_items(fields, next),
        Shape::Array(items) => sum_items(items, next),
        Shape::Opaque(bytes) => bytes,
    }
}

fn sum_items(items: Items<'_>, depth: usize) -> usize {
    items.fold(0usize, |acc, item| acc.saturating_add(estimate_at(item, depth)))
}

// == Opaque Wrapper ==
/// Wraps a value whose layout the estimator should not walk.
///
/// Counted as `size_of::<T>()`; heap content owned by `T` is ignored, so the
/// estimate undercounts for types holding allocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opaque<T>(pub T);

impl<T> Opaque<T> {
    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> EstimateSize for Opaque<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Opaque(mem::size_of::<T>())
    }
}

// == Record Macro ==
/// Implements [`EstimateSize`] for a struct by listing its fields.
///
/// ```
/// use mem_vault::{estimate_size, impl_record_shape};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl_record_shape!(Point { x, y });
///
/// assert_eq!(estimate_size(&Point { x: 1, y: 2 }), 8);
/// ```
#[macro_export]
macro_rules! impl_record_shape {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::cache::EstimateSize for $ty {
            fn shape(&self) -> $crate::cache::Shape<'_> {
                $crate::cache::Shape::record([
                    $(&self.$field as &dyn $crate::cache::EstimateSize),*
                ])
            }
        }
    };
}

// == Scalars ==
macro_rules! scalar_shape {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EstimateSize for $ty {
                fn shape(&self) -> Shape<'_> {
                    Shape::Scalar(mem::size_of::<$ty>())
                }
            }
        )*
    };
}

scalar_shape!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
);

// == Text ==
impl EstimateSize for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(self.len())
    }
}

impl EstimateSize for &str {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(self.len())
    }
}

impl EstimateSize for Box<str> {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(self.len())
    }
}

// == References ==
impl<T: EstimateSize> EstimateSize for Option<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Reference(self.as_ref().map(|v| v as &dyn EstimateSize))
    }
}

impl<T: EstimateSize> EstimateSize for Box<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Reference(Some(&**self as &dyn EstimateSize))
    }
}

impl<T: EstimateSize> EstimateSize for Rc<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Reference(Some(&**self as &dyn EstimateSize))
    }
}

impl<T: EstimateSize> EstimateSize for Arc<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Reference(Some(&**self as &dyn EstimateSize))
    }
}

// == Sequences ==
impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::sequence(self.capacity(), self.iter())
    }
}

impl<T: EstimateSize> EstimateSize for VecDeque<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::sequence(self.capacity(), self.iter())
    }
}

// == Maps ==
impl<K: EstimateSize, V: EstimateSize, S> EstimateSize for HashMap<K, V, S> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(Box::new(
            self.iter()
                .map(|(k, v)| (k as &dyn EstimateSize, v as &dyn EstimateSize)),
        ))
    }
}

impl<K: EstimateSize, V: EstimateSize> EstimateSize for BTreeMap<K, V> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(Box::new(
            self.iter()
                .map(|(k, v)| (k as &dyn EstimateSize, v as &dyn EstimateSize)),
        ))
    }
}

// Sets are maps with zero-sized values.
impl<T: EstimateSize, S> EstimateSize for HashSet<T, S> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(Box::new(
            self.iter()
                .map(|k| (k as &dyn EstimateSize, &() as &dyn EstimateSize)),
        ))
    }
}

impl<T: EstimateSize> EstimateSize for BTreeSet<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(Box::new(
            self.iter()
                .map(|k| (k as &dyn EstimateSize, &() as &dyn EstimateSize)),
        ))
    }
}

// == Records ==
macro_rules! tuple_record {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: EstimateSize),+> EstimateSize for ($($name,)+) {
            fn shape(&self) -> Shape<'_> {
                Shape::record([$(&self.$idx as &dyn EstimateSize),+])
            }
        }
    };
}

tuple_record!(A.0);
tuple_record!(A.0, B.1);
tuple_record!(A.0, B.1, C.2);
tuple_record!(A.0, B.1, C.2, D.3);
tuple_record!(A.0, B.1, C.2, D.3, E.4);
tuple_record!(A.0, B.1, C.2, D.3, E.4, F.5);

// == Arrays ==
impl<T: EstimateSize, const N: usize> EstimateSize for [T; N] {
    fn shape(&self) -> Shape<'_> {
        Shape::array(self)
    }
}
