//! Exclusive ownership of native handles
//!
//! [`Owned`] pairs a native handle with the deleter that frees it. It is
//! move-only: there is no `Clone`, so a handle can never have two owners, and
//! the deleter runs exactly once when a non-null owner is dropped or reset.
//! [`Owned::take`] transfers the handle out and leaves the source null, which
//! is the state every operation on it then reports as invalid use.

use std::fmt;
use std::ptr::NonNull;

use crate::error::{ErrorChannel, GlfwError, GlfwResult, NativeError};
use crate::session;

/// Frees a native handle
pub trait Deleter<T> {
    /// Free `handle`; called at most once per handle
    fn delete(&mut self, handle: NonNull<T>);
}

impl<T, F> Deleter<T> for F
where
    F: FnMut(NonNull<T>),
{
    fn delete(&mut self, handle: NonNull<T>) {
        self(handle);
    }
}

/// A native handle with exactly one owner
pub struct Owned<T, D: Deleter<T>> {
    handle: Option<NonNull<T>>,
    deleter: D,
}

impl<T, D: Deleter<T>> Owned<T, D> {
    /// Run a native factory and take ownership of its result
    ///
    /// The error channel is cleared before the factory runs, so a null result
    /// is paired with the error that factory reported. When nothing was
    /// reported through the channel, the native last-error query is polled.
    pub fn create<F>(factory: F, deleter: D) -> GlfwResult<Self>
    where
        F: FnOnce() -> *mut T,
    {
        ErrorChannel::clear();
        match NonNull::new(factory()) {
            Some(handle) => Ok(Self {
                handle: Some(handle),
                deleter,
            }),
            None => Err(creation_error()),
        }
    }

    /// Take ownership of an existing handle
    ///
    /// # Safety
    ///
    /// `handle` must be live and not owned by anything else; `deleter` must be
    /// the right way to free it.
    pub unsafe fn from_raw(handle: NonNull<T>, deleter: D) -> Self {
        Self {
            handle: Some(handle),
            deleter,
        }
    }

    /// An owner holding nothing
    pub const fn null(deleter: D) -> Self {
        Self {
            handle: None,
            deleter,
        }
    }

    /// Whether this owner holds nothing
    pub const fn is_null(&self) -> bool {
        self.handle.is_none()
    }

    /// The owned handle, or [`GlfwError::InvalidUse`] for a null owner
    pub fn get(&self) -> GlfwResult<NonNull<T>> {
        self.handle.ok_or_else(|| {
            GlfwError::invalid_use(format!(
                "{} handle used after it was destroyed or moved out",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Move the handle into a new owner, leaving this one null
    pub fn take(&mut self) -> Self
    where
        D: Clone,
    {
        Self {
            handle: self.handle.take(),
            deleter: self.deleter.clone(),
        }
    }

    /// Free the handle now; a null owner stays null
    pub fn reset(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.deleter.delete(handle);
        }
    }

    /// Give up ownership without freeing
    pub fn into_raw(mut self) -> Option<NonNull<T>> {
        self.handle.take()
    }
}

impl<T, D: Deleter<T>> Drop for Owned<T, D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T, D: Deleter<T>> fmt::Debug for Owned<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned").field("handle", &self.handle).finish_non_exhaustive()
    }
}

/// Creation error for a factory that just returned null
fn creation_error() -> GlfwError {
    ErrorChannel::take()
        .or_else(|| {
            session::current()
                .and_then(|session| session.native().last_error())
                .map(|(code, description)| NativeError::new(code, description))
        })
        .unwrap_or_else(|| NativeError::new(-1, "the native factory returned null without reporting an error"))
        .into_creation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::error::ErrorCode;

    struct Token;

    fn fake_handle(address: usize) -> *mut Token {
        address as *mut Token
    }

    fn counting_deleter(count: &Rc<Cell<u32>>) -> impl FnMut(NonNull<Token>) + Clone {
        let count = Rc::clone(count);
        move |_| count.set(count.get() + 1)
    }

    #[test]
    fn test_drop_deletes_exactly_once() {
        let deletions = Rc::new(Cell::new(0));
        {
            let owner = Owned::create(|| fake_handle(0x10), counting_deleter(&deletions)).unwrap();
            assert!(!owner.is_null());
        }
        assert_eq!(deletions.get(), 1);
    }

    #[test]
    fn test_take_transfers_ownership() {
        let deletions = Rc::new(Cell::new(0));
        let mut source = Owned::create(|| fake_handle(0x20), counting_deleter(&deletions)).unwrap();

        let target = source.take();
        assert!(source.is_null());
        assert_eq!(target.get().unwrap().as_ptr(), fake_handle(0x20));
        assert!(matches!(source.get(), Err(GlfwError::InvalidUse(_))));

        drop(source);
        assert_eq!(deletions.get(), 0);
        drop(target);
        assert_eq!(deletions.get(), 1);
    }

    #[test]
    fn test_rust_move_keeps_single_deletion() {
        let deletions = Rc::new(Cell::new(0));
        let owner = Owned::create(|| fake_handle(0x30), counting_deleter(&deletions)).unwrap();
        let moved = owner;
        let boxed = Box::new(moved);
        drop(boxed);
        assert_eq!(deletions.get(), 1);
    }

    #[test]
    fn test_null_owner_is_noop() {
        let deletions = Rc::new(Cell::new(0));
        let owner: Owned<Token, _> = Owned::null(counting_deleter(&deletions));
        assert!(owner.is_null());
        drop(owner);
        assert_eq!(deletions.get(), 0);
    }

    #[test]
    fn test_reset_then_drop() {
        let deletions = Rc::new(Cell::new(0));
        let mut owner = Owned::create(|| fake_handle(0x40), counting_deleter(&deletions)).unwrap();
        owner.reset();
        owner.reset();
        assert_eq!(deletions.get(), 1);
        drop(owner);
        assert_eq!(deletions.get(), 1);
    }

    #[test]
    fn test_into_raw_skips_deleter() {
        let deletions = Rc::new(Cell::new(0));
        let owner = Owned::create(|| fake_handle(0x50), counting_deleter(&deletions)).unwrap();
        assert_eq!(owner.into_raw().unwrap().as_ptr(), fake_handle(0x50));
        assert_eq!(deletions.get(), 0);
    }

    #[test]
    fn test_null_factory_reports_channel_error() {
        let deletions = Rc::new(Cell::new(0));
        let result = Owned::create(
            || {
                ErrorChannel::record(NativeError::new(0x0001_0005, "out of memory"));
                std::ptr::null_mut::<Token>()
            },
            counting_deleter(&deletions),
        );

        match result {
            Err(GlfwError::Creation { code, description }) => {
                assert_eq!(code, ErrorCode::OutOfMemory);
                assert_eq!(description, "out of memory");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(deletions.get(), 0);
    }

    #[test]
    fn test_stale_error_is_not_attributed() {
        ErrorChannel::record(NativeError::new(0x0001_0003, "left over"));
        let err = Owned::create(std::ptr::null_mut::<Token>, |_: NonNull<Token>| {}).unwrap_err();
        match err {
            GlfwError::Creation { code, .. } => assert_eq!(code, ErrorCode::Unknown),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
