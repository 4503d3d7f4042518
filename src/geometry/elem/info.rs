use std::any::Any;
use std::fmt;

/// Object-safe view of a payload that can be deep-cloned behind a box.
trait InfoPayload: Any + fmt::Debug {
    fn clone_box(&self) -> Box<dyn InfoPayload>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone + fmt::Debug> InfoPayload for T {
    fn clone_box(&self) -> Box<dyn InfoPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Caller-defined payload attached to an element.
///
/// The element owns the payload exclusively: cloning the element deep-clones
/// it, dropping or replacing the element drops it.
pub struct ElemInfo(Box<dyn InfoPayload>);

impl ElemInfo {
    /// Wraps any cloneable value.
    pub fn new<T: Any + Clone + fmt::Debug>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrows the payload as `T`, or `None` if it holds another type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref()
    }

    /// Mutably borrows the payload as `T`, or `None` if it holds another type.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (*self.0).as_any_mut().downcast_mut()
    }

    /// Returns `true` if the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        (*self.0).as_any().is::<T>()
    }
}

impl Clone for ElemInfo {
    fn clone(&self) -> Self {
        Self((*self.0).clone_box())
    }
}

impl fmt::Debug for ElemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElemInfo").field(&self.0).finish()
    }
}
