//! Loading animation lifecycle and the per-frame redraw.

use rand::Rng;

use crate::config::LoaderConfig;
use crate::render::{Point, Surface, TextStyle};
use crate::schedule::{FrameHandle, Scheduler};
use crate::shape::{ShapeField, ShapeStyle};

/// Anything that can show progress of a long-running operation.
///
/// The workflow calls `start` before waiting, `set_attempt` after each poll
/// and `stop` exactly once when it finishes.
pub trait LoadingIndicator {
    fn start(&mut self);
    fn stop(&mut self);
    fn set_attempt(&mut self, attempt: u32);
    fn set_attempt_total(&mut self, total: u32);
}

/// Current state of the animator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatorState {
    /// No frame is pending
    Idle,
    /// Exactly one frame, identified by `handle`, is pending
    Running { handle: FrameHandle },
}

/// Platform-agnostic loading animation.
///
/// The animator draws onto a [`Surface`] and asks a [`Scheduler`] for frame
/// callbacks. It never calls itself: the host invokes [`on_frame`](Self::on_frame)
/// with the handle of the callback that fired, and the animator requests the
/// next frame from inside it. At most one frame is pending at any time.
///
/// ## Example
///
/// ```rust
/// use kandinsky_canvas_core::{
///     AnimatorState, LoaderConfig, LoadingAnimator, ManualScheduler, RecordingSurface,
/// };
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut animator = LoadingAnimator::new(
///     RecordingSurface::new(400.0, 400.0),
///     ManualScheduler::new(),
///     StdRng::seed_from_u64(1),
///     LoaderConfig::default(),
/// );
/// animator.start();
/// assert!(animator.is_running());
///
/// // The host fires the pending callback
/// let handle = animator.scheduler_mut().take_pending().unwrap();
/// assert!(animator.on_frame(handle));
/// assert_eq!(animator.surface().texts(), vec!["Attempt 0 out of 20"]);
///
/// animator.stop();
/// assert_eq!(animator.state(), AnimatorState::Idle);
/// ```
pub struct LoadingAnimator<S, K, R> {
    surface: S,
    scheduler: K,
    rng: R,
    config: LoaderConfig,
    /// Surface size captured at construction
    width: f64,
    height: f64,
    field: ShapeField,
    text_style: TextStyle,
    state: AnimatorState,
    attempt: u32,
    attempt_total: u32,
}

impl<S: Surface, K: Scheduler, R: Rng> LoadingAnimator<S, K, R> {
    pub fn new(surface: S, scheduler: K, rng: R, config: LoaderConfig) -> Self {
        let (width, height) = surface.size();
        let text_style = TextStyle {
            font: config.font.clone(),
            fill: config.text_fill,
            stroke: config.text_stroke,
        };
        Self {
            field: ShapeField::empty(ShapeStyle::from_config(&config)),
            attempt_total: config.attempt_total,
            surface,
            scheduler,
            rng,
            config,
            width,
            height,
            text_style,
            state: AnimatorState::Idle,
            attempt: 0,
        }
    }

    /// Build a fresh shape field and request the first frame.
    ///
    /// Does nothing while already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.field = ShapeField::generate(self.width, self.height, &self.config, &mut self.rng);
        match self.scheduler.request_frame() {
            Some(handle) => {
                tracing::debug!(shapes = self.field.len(), "loading animation started");
                self.state = AnimatorState::Running { handle };
            }
            None => tracing::warn!("loading animation not started: no frame scheduled"),
        }
    }

    /// Cancel the pending frame. The last drawn frame stays on the surface.
    ///
    /// Does nothing while idle.
    pub fn stop(&mut self) {
        if let AnimatorState::Running { handle } = self.state {
            self.scheduler.cancel_frame(handle);
            self.state = AnimatorState::Idle;
            tracing::debug!("loading animation stopped");
        }
    }

    /// Set the attempt shown in the overlay. Valid in any state.
    pub fn set_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
    }

    /// Set the "out of" value shown in the overlay. Valid in any state.
    pub fn set_attempt_total(&mut self, total: u32) {
        self.attempt_total = total;
    }

    /// Run one frame for the callback identified by `handle`.
    ///
    /// Returns `false` without drawing when `handle` is not the pending
    /// frame (the animator is idle or the callback was superseded).
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        match self.state {
            AnimatorState::Running { handle: pending } if pending == handle => {}
            _ => {
                tracing::trace!(?handle, "ignoring stale frame callback");
                return false;
            }
        }

        self.draw_frame();

        if self.is_running() {
            match self.scheduler.request_frame() {
                Some(next) => self.state = AnimatorState::Running { handle: next },
                None => {
                    tracing::warn!("loading animation halted: next frame could not be scheduled");
                    self.state = AnimatorState::Idle;
                }
            }
        }
        true
    }

    fn draw_frame(&mut self) {
        self.surface.clear_rect(0.0, 0.0, self.width, self.height);
        self.field.render(&mut self.surface);
        let text = self.attempt_text();
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        self.surface.draw_text(&text, center, &self.text_style);
    }

    /// Overlay text for the current progress.
    pub fn attempt_text(&self) -> String {
        format!("Attempt {} out of {}", self.attempt, self.attempt_total)
    }

    #[inline]
    pub fn state(&self) -> AnimatorState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimatorState::Running { .. })
    }

    /// Handle of the pending frame, if running.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        match self.state {
            AnimatorState::Running { handle } => Some(handle),
            AnimatorState::Idle => None,
        }
    }

    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[inline]
    pub fn attempt_total(&self) -> u32 {
        self.attempt_total
    }

    #[inline]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Shapes of the current (or last) session.
    #[inline]
    pub fn field(&self) -> &ShapeField {
        &self.field
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[inline]
    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }

    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut K {
        &mut self.scheduler
    }
}

impl<S: Surface, K: Scheduler, R: Rng> LoadingIndicator for LoadingAnimator<S, K, R> {
    fn start(&mut self) {
        LoadingAnimator::start(self);
    }

    fn stop(&mut self) {
        LoadingAnimator::stop(self);
    }

    fn set_attempt(&mut self, attempt: u32) {
        LoadingAnimator::set_attempt(self, attempt);
    }

    fn set_attempt_total(&mut self, total: u32) {
        LoadingAnimator::set_attempt_total(self, total);
    }
}

/// Browser wiring: canvas surface, `requestAnimationFrame` and `Math.random`.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use crate::render::web::CanvasSurface;
    use crate::schedule::web::AnimationFrameScheduler;
    use rand::RngCore;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::Closure;
    use web_sys::HtmlCanvasElement;

    /// [`RngCore`] over `Math.random()`.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct JsRng;

    impl RngCore for JsRng {
        fn next_u32(&mut self) -> u32 {
            (js_sys::Math::random() * 4_294_967_296.0) as u32
        }

        fn next_u64(&mut self) -> u64 {
            (u64::from(self.next_u32()) << 32) | u64::from(self.next_u32())
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            rand::rand_core::impls::fill_bytes_via_next(self, dst)
        }
    }

    pub type CanvasAnimator = LoadingAnimator<CanvasSurface, AnimationFrameScheduler, JsRng>;

    /// Loading animation running on an HTML canvas.
    ///
    /// Cloning shares the same animator.
    #[derive(Clone)]
    pub struct WebLoader {
        inner: Rc<RefCell<CanvasAnimator>>,
    }

    impl WebLoader {
        pub fn new(canvas: &HtmlCanvasElement, config: LoaderConfig) -> crate::Result<Self> {
            let surface = CanvasSurface::new(canvas)?;
            let scheduler = AnimationFrameScheduler::new()?;
            let slot = scheduler.callback_slot();
            let inner = Rc::new(RefCell::new(LoadingAnimator::new(surface, scheduler, JsRng, config)));

            // Weak so the pending callback does not keep the animator alive.
            let weak = Rc::downgrade(&inner);
            *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
                let Some(animator) = weak.upgrade() else {
                    return;
                };
                let mut animator = animator.borrow_mut();
                if let Some(handle) = animator.pending_frame() {
                    animator.on_frame(handle);
                }
            }) as Box<dyn FnMut(f64)>));

            Ok(Self { inner })
        }

        pub fn is_running(&self) -> bool {
            self.inner.borrow().is_running()
        }
    }

    impl LoadingIndicator for WebLoader {
        fn start(&mut self) {
            self.inner.borrow_mut().start();
        }

        fn stop(&mut self) {
            self.inner.borrow_mut().stop();
        }

        fn set_attempt(&mut self, attempt: u32) {
            self.inner.borrow_mut().set_attempt(attempt);
        }

        fn set_attempt_total(&mut self, total: u32) {
            self.inner.borrow_mut().set_attempt_total(total);
        }
    }
}
