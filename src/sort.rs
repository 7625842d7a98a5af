use std::cmp::Reverse;

use rayon::slice::ParallelSliceMut;
use time::OffsetDateTime;

/// Anything carrying a publish timestamp.
pub trait Published {
    fn pub_datetime(&self) -> OffsetDateTime;
}

impl<T: Published + ?Sized> Published for &T {
    fn pub_datetime(&self) -> OffsetDateTime {
        (**self).pub_datetime()
    }
}

/// Sort `entries` by publish time, newest first.
///
/// Timestamps are compared at whole-second granularity and the sort is
/// stable: entries published within the same second keep their input order.
pub fn sort_by_pub_datetime<T: Published + Send>(entries: &mut [T]) {
    entries.par_sort_by_key(|entry| Reverse(entry.pub_datetime().unix_timestamp()));
}
