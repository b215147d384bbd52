use std::cmp::Ordering;

use tracing::trace;

use super::WriteBatch;
use crate::Result;
use crate::MAX_KEY_LENGTH;

/// Forward cursor over a store in byte-wise key order.
///
/// A cursor that hits an engine fault becomes invalid and reports the fault
/// through [`KvIterator::status`]. Range helpers always check `status` so a
/// fault fails the operation instead of looking like the end of the data.
pub trait KvIterator {
    /// Positions at the first key at or after `key`
    fn seek(
        &mut self,
        key: &[u8],
    );

    fn valid(&self) -> bool;

    /// Moves to the next key. Only called while `valid()`.
    fn next(&mut self);

    /// Current key. Only called while `valid()`.
    fn key(&self) -> &[u8];

    /// Current value. Only called while `valid()`.
    fn value(&self) -> &[u8];

    /// Fault hit by the last positioning call, if any
    fn status(&self) -> Result<()>;
}

/// `valid()` that turns a cursor fault into an error
#[inline]
pub(crate) fn is_valid<I: KvIterator + ?Sized>(iter: &I) -> Result<bool> {
    let valid = iter.valid();
    iter.status()?;
    Ok(valid)
}

#[inline]
fn beyond_upper_bound(
    key: &[u8],
    last: &[u8],
    inclusive: bool,
) -> bool {
    match key.cmp(last) {
        Ordering::Greater => true,
        Ordering::Equal => !inclusive,
        Ordering::Less => false,
    }
}

/// Drives `iter` over `[first, last]` or `[first, last)` and feeds each pair
/// to `op` until it returns `Ok(false)`, fails, or the range ends.
pub fn iterate_range<I, F>(
    iter: &mut I,
    first: &[u8],
    last: &[u8],
    inclusive: bool,
    mut op: F,
) -> Result<()>
where
    I: KvIterator + ?Sized,
    F: FnMut(&[u8], &[u8]) -> Result<bool>,
{
    iter.seek(first);
    while is_valid(iter)? {
        let key = iter.key();
        if beyond_upper_bound(key, last, inclusive) {
            return Ok(());
        }
        if !op(key, iter.value())? {
            break;
        }
        iter.next();
    }
    Ok(())
}

/// Stages a delete for every key in `[first, last)` into `batch`.
pub fn stage_range_deletes<I, B>(
    iter: &mut I,
    first: &[u8],
    last: &[u8],
    batch: &mut B,
) -> Result<()>
where
    I: KvIterator + ?Sized,
    B: WriteBatch + ?Sized,
{
    iter.seek(first);
    while is_valid(iter)? {
        let key = iter.key();
        if key >= last {
            break;
        }
        batch.delete(key);
        iter.next();
    }
    trace!("staged {} range deletes", batch.count());
    Ok(())
}

/// Lowest and highest keys of [`MAX_KEY_LENGTH`] bytes
pub fn full_key_range() -> (Vec<u8>, Vec<u8>) {
    (vec![0x00; MAX_KEY_LENGTH], vec![0xFF; MAX_KEY_LENGTH])
}
