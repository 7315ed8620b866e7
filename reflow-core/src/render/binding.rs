//! Render Bindings
//!
//! A binding keeps a mount target in sync with a view. The view is a setup
//! function that may create signals, memos and effects, and returns the
//! render function:
//!
//! ```rust
//! use reflow_core::reactive::Runtime;
//! use reflow_core::render::{bind, MountPoint};
//!
//! let runtime = Runtime::new();
//! let mount = MountPoint::new();
//! let count = runtime.signal(0);
//!
//! let view = {
//!     let count = count.clone();
//!     move || move || format!("Count is {}", count.get())
//! };
//! let _binding = bind(&runtime, view, mount.clone());
//! assert_eq!(mount.content(), "Count is 0");
//!
//! count.set(1);
//! assert_eq!(mount.content(), "Count is 0");
//! runtime.flush().unwrap();
//! assert_eq!(mount.content(), "Count is 1");
//! ```
//!
//! # Scheduling
//!
//! The binding is an effect. Its first run renders inline: the reads the
//! render function makes must happen while the effect is on the registry,
//! or nothing would subscribe it.
//!
//! Later runs only queue a microtask. By the time the microtask runs, the
//! write that triggered it has finished notifying everyone, so every memo the
//! render reads is either fresh or marked stale and recomputes against the
//! new values. Notifications arriving while a render is queued do not queue
//! another one; the queued render sees their writes too.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::mount::{Document, MountTarget};
use super::output::RenderOutput;
use crate::error::Result;
use crate::reactive::{Effect, Runtime};

#[derive(Default)]
struct BindingState {
    /// Flips to true once, after the inline first render.
    rendered: Cell<bool>,
    pending: Cell<bool>,
    renders: Cell<usize>,
}

/// Handle to a live render binding.
///
/// Dropping the handle does not stop the binding.
pub struct RenderBinding {
    effect: Effect,
    state: Rc<BindingState>,
}

impl RenderBinding {
    /// The effect driving this binding.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Number of renders written to the mount target.
    pub fn render_count(&self) -> usize {
        self.state.renders.get()
    }

    /// Whether a deferred render is queued and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.state.pending.get()
    }
}

impl fmt::Debug for RenderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderBinding")
            .field("effect", &self.effect.id())
            .field("renders", &self.render_count())
            .field("pending", &self.is_pending())
            .finish()
    }
}

fn paint<R, O, M>(render: &R, target: &M, state: &BindingState)
where
    R: Fn() -> O,
    O: Into<RenderOutput>,
    M: MountTarget + ?Sized,
{
    let output: RenderOutput = render().into();
    target.set_content(&output);
    state.renders.set(state.renders.get() + 1);
}

/// Bind `view`'s output to `target`.
///
/// `view` runs once, immediately; the render function it returns runs once
/// inline and then on the microtask queue whenever something it read
/// changes.
pub fn bind<V, R, O, M>(runtime: &Runtime, view: V, target: M) -> RenderBinding
where
    V: FnOnce() -> R,
    R: Fn() -> O + 'static,
    O: Into<RenderOutput>,
    M: MountTarget + 'static,
{
    let render = Rc::new(view());
    let target = Rc::new(target);
    let state = Rc::new(BindingState::default());

    let rt = runtime.clone();
    let binding_state = Rc::clone(&state);
    let effect = Effect::with_subscriber(runtime, move |subscriber| {
        let state = &binding_state;
        // Flipped before painting: a render that writes to a cell it reads
        // re-enters here and must take the deferred path.
        if !state.rendered.replace(true) {
            paint(&*render, &*target, state);
            return;
        }

        if state.pending.replace(true) {
            trace!("render already queued");
            return;
        }

        // Deferred renders track under the binding, so reads made only on
        // later renders subscribe it too.
        let subscriber = subscriber.clone();
        let (render, target, state) = (Rc::clone(&render), Rc::clone(&target), Rc::clone(state));
        let task_rt = rt.clone();
        debug!("render scheduled");
        rt.queue_microtask(Box::new(move || {
            state.pending.set(false);
            task_rt.track(&subscriber, || paint(&*render, &*target, &state));
            debug!(renders = state.renders.get(), "deferred render complete");
        }));
    });

    RenderBinding { effect, state }
}

/// Resolve `selector` in `document` and bind `view` to it.
///
/// Fails with [`ReactiveError::MissingMountTarget`](crate::error::ReactiveError::MissingMountTarget)
/// before running `view` if the selector is unknown.
pub fn mount<V, R, O>(runtime: &Runtime, view: V, document: &Document, selector: &str) -> Result<RenderBinding>
where
    V: FnOnce() -> R,
    R: Fn() -> O + 'static,
    O: Into<RenderOutput>,
{
    let target = document.mount_point(selector)?;
    Ok(bind(runtime, view, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use crate::render::MountPoint;

    #[test]
    fn first_render_is_synchronous() {
        let runtime = Runtime::new();
        let mount = MountPoint::new();

        let binding = bind(&runtime, || || "hello", mount.clone());

        assert_eq!(mount.content(), "hello");
        assert_eq!(binding.render_count(), 1);
        assert_eq!(binding.effect().run_count(), 1);
        assert_eq!(runtime.pending_microtasks(), 0);
    }

    #[test]
    fn view_setup_runs_once() {
        let runtime = Runtime::new();
        let setups = Rc::new(Cell::new(0));
        let count = runtime.signal(0);

        let (setups_clone, count_clone) = (Rc::clone(&setups), count.clone());
        let _binding = bind(
            &runtime,
            move || {
                setups_clone.set(setups_clone.get() + 1);
                move || count_clone.get().to_string()
            },
            MountPoint::new(),
        );

        count.set(1);
        runtime.flush().unwrap();
        assert_eq!(setups.get(), 1);
    }

    #[test]
    fn rerender_waits_for_flush() {
        let runtime = Runtime::new();
        let mount = MountPoint::new();
        let count = runtime.signal(0);

        let count_clone = count.clone();
        let binding = bind(&runtime, move || move || count_clone.get().to_string(), mount.clone());

        count.set(1);
        assert_eq!(mount.content(), "0");
        assert!(binding.is_pending());

        assert_eq!(runtime.flush(), Ok(1));
        assert_eq!(mount.content(), "1");
        assert!(!binding.is_pending());
        assert_eq!(binding.render_count(), 2);
    }

    #[test]
    fn writes_before_flush_coalesce() {
        let runtime = Runtime::new();
        let mount = MountPoint::new();
        let count = runtime.signal(0);

        let count_clone = count.clone();
        let binding = bind(&runtime, move || move || count_clone.get().to_string(), mount.clone());

        count.set(1);
        count.set(2);
        count.set(3);
        assert_eq!(runtime.pending_microtasks(), 1);

        runtime.flush().unwrap();
        assert_eq!(mount.content(), "3");
        assert_eq!(binding.render_count(), 2);
        assert_eq!(mount.writes(), 2);
    }

    #[test]
    fn deferred_render_tracks_new_reads() {
        let runtime = Runtime::new();
        let mount = MountPoint::new();
        let show = runtime.signal(false);
        let detail = runtime.signal("a");

        let (show_clone, detail_clone) = (show.clone(), detail.clone());
        let _binding = bind(
            &runtime,
            move || {
                move || {
                    if show_clone.get() {
                        detail_clone.get().to_string()
                    } else {
                        String::new()
                    }
                }
            },
            mount.clone(),
        );

        show.set(true);
        runtime.flush().unwrap();
        assert_eq!(mount.content(), "a");

        detail.set("b");
        runtime.flush().unwrap();
        assert_eq!(mount.content(), "b");
    }

    #[test]
    fn deferred_render_runs_as_the_binding() {
        let runtime = Runtime::new();
        let count = runtime.signal(0);
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));

        let (count_clone, seen_clone, rt) = (count.clone(), Rc::clone(&seen), runtime.clone());
        let binding = bind(
            &runtime,
            move || {
                move || {
                    seen_clone.borrow_mut().push(rt.current_subscriber().map(|s| s.id()));
                    count_clone.get().to_string()
                }
            },
            MountPoint::new(),
        );

        count.set(1);
        runtime.flush().unwrap();

        let id = Some(binding.effect().id());
        assert_eq!(*seen.borrow(), vec![id, id]);
    }

    #[test]
    fn render_fragments_are_joined() {
        let runtime = Runtime::new();
        let mount = MountPoint::new();

        bind(&runtime, || || vec!["<li>1</li>", "<li>2</li>"], mount.clone());
        assert_eq!(mount.content(), "<li>1</li><li>2</li>");
    }

    #[test]
    fn self_feeding_render_hits_budget() {
        let runtime = Runtime::with_config(crate::config::RuntimeConfig::default().microtask_budget(5));
        let count = runtime.signal(0);

        let count_clone = count.clone();
        bind(
            &runtime,
            move || {
                move || {
                    let value = count_clone.get();
                    count_clone.set(value + 1);
                    value.to_string()
                }
            },
            MountPoint::new(),
        );

        assert_eq!(
            runtime.flush(),
            Err(ReactiveError::MicrotaskBudgetExceeded { budget: 5 })
        );
    }

    #[test]
    fn mount_fails_fast_on_missing_selector() {
        let runtime = Runtime::new();
        let document = Document::new();
        let ran = Rc::new(Cell::new(false));

        let ran_clone = Rc::clone(&ran);
        let err = mount(
            &runtime,
            move || {
                ran_clone.set(true);
                || ""
            },
            &document,
            "#app",
        )
        .unwrap_err();

        assert_eq!(
            err,
            ReactiveError::MissingMountTarget {
                selector: "#app".to_string()
            }
        );
        assert!(!ran.get());
    }

    #[test]
    fn mount_binds_resolved_target() {
        let runtime = Runtime::new();
        let mut document = Document::new();
        let app = document.insert("#app");

        mount(&runtime, || || "ready", &document, "#app").unwrap();
        assert_eq!(app.content(), "ready");
    }
}
