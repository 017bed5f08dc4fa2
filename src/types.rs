//! Integer types shared by the I/O and assembly layers.

/// The unsigned id/count type.
pub type SInt = u64;

/// The signed type used for weights.
pub type SSInt = i64;

/// The rank (processing element) id type.
#[allow(non_camel_case_types)]
pub type PEID = usize;

/// A directed `(source, target)` pair; `source` is a global vertex id.
pub type Edge = (SInt, SInt);
