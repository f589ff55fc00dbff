//! Frame scheduling for the redraw loop.

/// Opaque identifier of one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Requests frame callbacks tied to the display refresh.
///
/// The scheduler only hands out handles; the host is responsible for
/// calling [`LoadingAnimator::on_frame`](crate::LoadingAnimator::on_frame)
/// with the handle when the callback fires.
pub trait Scheduler {
    /// Request a callback on the next refresh. `None` when the host cannot
    /// schedule frames.
    fn request_frame(&mut self) -> Option<FrameHandle>;

    /// Cancel a previously requested callback.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by hand.
///
/// Pending handles are kept in request order; the host fires one by taking
/// it with [`take_pending`](Self::take_pending) and passing it to the
/// animator. Request and cancel calls are counted.
///
/// ## Example
///
/// ```rust
/// use kandinsky_canvas_core::{ManualScheduler, Scheduler};
///
/// let mut scheduler = ManualScheduler::new();
/// let handle = scheduler.request_frame().unwrap();
/// assert_eq!(scheduler.pending(), &[handle]);
///
/// scheduler.cancel_frame(handle);
/// assert!(scheduler.pending().is_empty());
/// assert_eq!(scheduler.cancels(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    next_id: i32,
    pending: Vec<FrameHandle>,
    requests: usize,
    cancels: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles requested and not yet taken or cancelled.
    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    /// Remove the oldest pending handle, as if its callback fired.
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    /// Total number of `request_frame` calls.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Total number of `cancel_frame` calls.
    pub fn cancels(&self) -> usize {
        self.cancels
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        self.next_id += 1;
        self.requests += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancels += 1;
        self.pending.retain(|h| *h != handle);
    }
}

/// `requestAnimationFrame`-backed scheduler.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::Closure;
    use wasm_bindgen::JsCast;

    /// Shared slot holding the frame callback.
    ///
    /// The callback usually needs a handle to whatever owns the scheduler,
    /// so it is installed after construction through this slot.
    pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

    /// Scheduler using the window's animation frame queue.
    ///
    /// Dropping it cancels the last requested frame, so the browser never
    /// calls a callback that has already been freed.
    pub struct AnimationFrameScheduler {
        window: web_sys::Window,
        callback: FrameCallback,
        last: Option<FrameHandle>,
    }

    impl AnimationFrameScheduler {
        pub fn new() -> crate::Result<Self> {
            let window = web_sys::window()
                .ok_or_else(|| crate::Error::Browser("No window available".into()))?;
            Ok(Self {
                window,
                callback: Rc::new(RefCell::new(None)),
                last: None,
            })
        }

        /// Most recent frame requested and not cancelled. It may already
        /// have run.
        pub fn last_frame(&self) -> Option<FrameHandle> {
            self.last
        }

        /// The slot the frame callback must be stored in.
        pub fn callback_slot(&self) -> FrameCallback {
            Rc::clone(&self.callback)
        }
    }

    impl Scheduler for AnimationFrameScheduler {
        fn request_frame(&mut self) -> Option<FrameHandle> {
            let slot = self.callback.borrow();
            let Some(callback) = slot.as_ref() else {
                tracing::warn!("Frame requested before a callback was installed");
                return None;
            };
            match self
                .window
                .request_animation_frame(callback.as_ref().unchecked_ref())
            {
                Ok(id) => {
                    self.last = Some(FrameHandle(id));
                    self.last
                }
                Err(e) => {
                    tracing::warn!("requestAnimationFrame failed: {e:?}");
                    None
                }
            }
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            if self.last == Some(handle) {
                self.last = None;
            }
            if let Err(e) = self.window.cancel_animation_frame(handle.0) {
                tracing::warn!("cancelAnimationFrame failed: {e:?}");
            }
        }
    }

    impl Drop for AnimationFrameScheduler {
        fn drop(&mut self) {
            if let Some(handle) = self.last.take() {
                self.cancel_frame(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_pending_in_request_order() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.request_frame().unwrap();
        let second = scheduler.request_frame().unwrap();
        assert_ne!(first, second);

        assert_eq!(scheduler.take_pending(), Some(first));
        assert_eq!(scheduler.take_pending(), Some(second));
        assert_eq!(scheduler.take_pending(), None);
        assert_eq!(scheduler.requests(), 2);
        assert_eq!(scheduler.cancels(), 0);
    }

    #[test]
    fn cancel_unknown_handle_is_counted() {
        let mut scheduler = ManualScheduler::new();
        scheduler.cancel_frame(FrameHandle(42));
        assert_eq!(scheduler.cancels(), 1);
        assert!(scheduler.pending().is_empty());
    }
}
