use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into one `requestAnimationFrame` callback.
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameScheduler {
    pub fn new(paint: impl Fn() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let frame_inner = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut()>::new(move || {
            if let Some(inner) = frame_inner.upgrade() {
                inner.pending.set(None);
            }
            paint();
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    /// Schedule a repaint unless one is already pending.
    pub fn request(&self) {
        if self.inner.pending.get().is_some() {
            return;
        }
        let Some(window) = self.inner.window.as_ref() else {
            return;
        };
        let cb_ref = self.inner.callback.borrow();
        let Some(cb) = cb_ref.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.inner.pending.set(Some(id));
        }
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.inner.pending.take()
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.inner.callback.borrow_mut().take();
    }
}
