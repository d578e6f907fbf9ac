use std::any::Any;
use std::fmt;

/// A resource moved, not copied, to the worker along with a request.
///
/// Wrapping the resource consumes it, so the sender loses access the moment
/// the transfer is handed to a call. The transport decides which concrete
/// resource types it can move (an `OffscreenCanvas` in the browser).
pub struct Transfer(Box<dyn Any>);

impl Transfer {
    pub fn new<T: Any>(resource: T) -> Self {
        Self(Box::new(resource))
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Unwrap the resource, or give the transfer back if it holds another type.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|resource| *resource).map_err(Self)
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transfer(..)")
    }
}
