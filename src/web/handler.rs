/// The click handler of the mounted popup fragment and the element it is
/// attached to.
///
/// At most one handler is live. A replaced handler is detached from its
/// element before it is dropped, so the DOM never calls into a freed closure.
pub struct HandlerSlot<E, H> {
    current: Option<(E, H)>,
}

impl<E, H> Default for HandlerSlot<E, H> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<E, H> HandlerSlot<E, H> {
    /// Store `handler` (already attached to `element`), detaching and dropping
    /// the previous one.
    pub fn replace(&mut self, element: E, handler: H, detach: impl FnOnce(&E, &H)) {
        if let Some((old_element, old_handler)) = self.current.take() {
            detach(&old_element, &old_handler);
        }
        self.current = Some((element, handler));
    }

    pub fn element(&self) -> Option<&E> {
        self.current.as_ref().map(|(e, _)| e)
    }
}
