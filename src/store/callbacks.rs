use super::DomainStore;
use crate::error::StoreError;
use crate::model::Resource;
use serde_json::Value;

type SuccessHook<R, T> = Box<dyn FnOnce(&DomainStore<R>, Value) -> Result<T, StoreError> + Send>;
type ErrorHook = Box<dyn FnOnce(StoreError) -> Result<(), StoreError> + Send>;
type FinallyHook<R> = Box<dyn FnOnce(&DomainStore<R>) + Send>;

/// Per-call hooks for a network operation of a [`DomainStore`].
///
/// * `on_success` replaces the default transform-and-cache step and receives
///   the response body.
/// * `on_error` sees the failure; `Ok(())` swallows it, `Err` propagates it to
///   the caller. The default logs and swallows.
/// * `on_finally` runs after the store's own settle step, whatever the outcome.
///
/// ```rust
/// use remodel::store::Callbacks;
/// # struct User;
/// # impl remodel::model::Resource for User { const MODEL_NAME: &'static str = "user"; }
///
/// let strict: Callbacks<User, ()> = Callbacks::propagate();
/// let quiet: Callbacks<User, ()> = Callbacks::new().on_error(|_| Ok(()));
/// # let _ = (strict, quiet);
/// ```
pub struct Callbacks<R: Resource, T> {
    pub(super) success: Option<SuccessHook<R, T>>,
    pub(super) error: Option<ErrorHook>,
    pub(super) finally: Option<FinallyHook<R>>,
}

impl<R: Resource, T> Default for Callbacks<R, T> {
    fn default() -> Self {
        Self {
            success: None,
            error: None,
            finally: None,
        }
    }
}

impl<R: Resource, T> Callbacks<R, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Network failures are returned to the caller instead of being swallowed.
    pub fn propagate() -> Self {
        Self::new().on_error(Err)
    }

    pub fn on_success(
        mut self,
        hook: impl FnOnce(&DomainStore<R>, Value) -> Result<T, StoreError> + Send + 'static,
    ) -> Self {
        self.success = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl FnOnce(StoreError) -> Result<(), StoreError> + Send + 'static) -> Self {
        self.error = Some(Box::new(hook));
        self
    }

    pub fn on_finally(mut self, hook: impl FnOnce(&DomainStore<R>) + Send + 'static) -> Self {
        self.finally = Some(Box::new(hook));
        self
    }
}
