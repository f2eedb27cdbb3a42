use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use crate::errors::ExternalValidation;

/// Decides whether a propagated error is a third-party validation error
pub trait ValidationAdapter: Send + Sync {
    fn recognize<'a>(&self, error: &'a anyhow::Error) -> Option<&'a dyn ExternalValidation>;
}

/// Recognizes errors of one concrete type, e.g.
/// `DowncastAdapter::<validator::ValidationErrors>::new()`
pub struct DowncastAdapter<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> DowncastAdapter<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for DowncastAdapter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ValidationAdapter for DowncastAdapter<E>
where
    E: ExternalValidation + Display + Debug + Send + Sync + 'static,
{
    fn recognize<'a>(&self, error: &'a anyhow::Error) -> Option<&'a dyn ExternalValidation> {
        error
            .downcast_ref::<E>()
            .map(|external| external as &dyn ExternalValidation)
    }
}
