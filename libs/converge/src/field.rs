//! Tracked fields with a current value, a desired value and a change flag.

/// One tracked value on a remote resource.
///
/// The change flag normally comes from a diff of current against desired,
/// but callers that already know which attributes a user touched can declare
/// it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutableField<T> {
    current: T,
    desired: T,
    changed: bool,
}

impl<T: Copy + PartialEq> MutableField<T> {
    /// Changed if and only if the values differ.
    pub fn diff(current: T, desired: T) -> Self {
        Self {
            current,
            desired,
            changed: current != desired,
        }
    }

    /// Change flag supplied by the caller.
    pub fn declared(current: T, desired: T, changed: bool) -> Self {
        Self {
            current,
            desired,
            changed,
        }
    }

    /// A field the caller does not intend to touch.
    pub fn unchanged(value: T) -> Self {
        Self::declared(value, value, false)
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn desired(&self) -> T {
        self.desired
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }
}
