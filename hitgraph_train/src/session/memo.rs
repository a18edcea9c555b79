//! Compute-once holders.

/// State of a [`Memo`], as seen through [`Memo::state`].
#[derive(Debug, Clone, PartialEq)]
pub enum MemoState<T> {
    /// Nothing computed yet.
    Uncomputed,
    /// Result of the first successful derivation.
    Computed(T),
}

/// Holds the result of the first successful call and returns it afterwards,
/// whatever the later calls would have computed.
///
/// A failed derivation leaves the memo uncomputed.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> Memo<T> {
    /// Create an empty memo; `name` appears in debug logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: None,
        }
    }

    /// Memo name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state.
    pub fn state(&self) -> MemoState<&T> {
        match &self.value {
            Some(value) => MemoState::Computed(value),
            None => MemoState::Uncomputed,
        }
    }

    /// Check if a value is stored.
    pub fn is_computed(&self) -> bool {
        self.value.is_some()
    }

    /// Stored value, if any.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Mutable access to the stored value, if any.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Return the stored value, running `init` first if nothing is stored.
    pub fn get_or_try_init<E, F>(&mut self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.get_or_try_init_mut(init).map(|value| &*value)
    }

    /// Mutable variant of [`get_or_try_init`](Self::get_or_try_init).
    pub fn get_or_try_init_mut<E, F>(&mut self, init: F) -> Result<&mut T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let value = match self.value.take() {
            Some(value) => {
                log::debug!("Returning cached value for {}", self.name);
                value
            }
            None => init()?,
        };
        Ok(self.value.insert(value))
    }

    /// Forget the stored value.
    pub fn reset(&mut self) {
        if self.is_computed() {
            log::debug!("Clearing cached value for {}", self.name);
        }
        self.value = None;
    }
}

/// Reset every memo in `memos`.
pub fn clear_all(memos: &mut [&mut dyn Resettable]) {
    for memo in memos.iter_mut() {
        memo.reset();
    }
}

/// Anything that can drop a cached value.
pub trait Resettable {
    /// Forget the cached value.
    fn reset(&mut self);
}

impl<T> Resettable for Memo<T> {
    fn reset(&mut self) {
        Memo::reset(self);
    }
}
