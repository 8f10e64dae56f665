use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Path2d, PointerEvent};

use velox_shared::{Activation, Hit, HitGrid, MapViewModel, Scene, build_scene};

use crate::app::{Layouts, WindowSize};
use crate::render_loop::FrameScheduler;

const LABEL_HALO: &str = "rgba(15, 23, 42, 0.55)";

/// Uniform scale plus centering offset from scene units to CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ViewTransform {
    pub scale: f64,
    pub dx: f64,
    pub dy: f64,
}

impl ViewTransform {
    pub(crate) fn fit(scene_w: f64, scene_h: f64, css_w: f64, css_h: f64) -> Self {
        if scene_w <= 0.0 || scene_h <= 0.0 || css_w <= 0.0 || css_h <= 0.0 {
            return Self {
                scale: 1.0,
                dx: 0.0,
                dy: 0.0,
            };
        }
        let scale = (css_w / scene_w).min(css_h / scene_h);
        Self {
            scale,
            dx: (css_w - scene_w * scale) / 2.0,
            dy: (css_h - scene_h * scale) / 2.0,
        }
    }

    pub(crate) fn to_scene(self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.dx) / self.scale, (y - self.dy) / self.scale)
    }
}

/// Parsed `Path2d`s keyed by the address of their shared path string.
/// Cleared whenever the active layout changes.
type PathCache = HashMap<usize, Path2d>;

fn path_key(path: &Arc<str>) -> usize {
    Arc::as_ptr(path).cast::<u8>() as usize
}

fn cached_path<'a>(cache: &'a mut PathCache, path: &Arc<str>) -> Option<&'a Path2d> {
    let key = path_key(path);
    if !cache.contains_key(&key) {
        let parsed = Path2d::new_with_path_string(path).ok()?;
        cache.insert(key, parsed);
    }
    cache.get(&key)
}

fn paint_scene(ctx: &CanvasRenderingContext2d, scene: &Scene, paths: &mut PathCache) {
    for fill in &scene.fills {
        let Some(color) = fill.color else {
            continue;
        };
        let Some(path) = cached_path(paths, &fill.path) else {
            continue;
        };
        ctx.set_global_alpha(fill.opacity);
        ctx.set_fill_style_str(color);
        ctx.fill_with_path_2d(path);
    }
    ctx.set_global_alpha(1.0);

    ctx.set_line_join("round");
    for stroke in scene.borders.iter().chain(&scene.outlines) {
        let Some(path) = cached_path(paths, &stroke.path) else {
            continue;
        };
        ctx.set_stroke_style_str(stroke.color);
        ctx.set_line_width(stroke.width);
        ctx.stroke_with_path(path);
    }

    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for label in &scene.labels {
        ctx.set_font(&format!("600 {}px 'Inter', system-ui, sans-serif", label.font_size));
        ctx.set_line_width(3.0);
        ctx.set_stroke_style_str(LABEL_HALO);
        ctx.stroke_text(&label.text, label.x, label.y).ok();
        ctx.set_fill_style_str(label.color);
        ctx.fill_text(&label.text, label.x, label.y).ok();
    }
}

fn cursor_for(interactive: bool) -> &'static str {
    if interactive { "pointer" } else { "default" }
}

fn is_interactive(hit: &Hit, view_model: &MapViewModel) -> bool {
    match hit {
        Hit::State { code } => view_model.index().is_state_interactive(code),
        Hit::County { territory, .. } => territory.is_some(),
    }
}

/// Canvas 2D map surface. Pointer events are hit-tested against the active
/// layout and fed to the view model.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let view_model: RwSignal<MapViewModel> = expect_context();
    let layouts: Layouts = expect_context();
    let WindowSize(window_size) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let hit_grid: Rc<RefCell<Option<HitGrid<Hit>>>> = Rc::new(RefCell::new(None));
    let transform: Rc<RefCell<ViewTransform>> = Rc::new(RefCell::new(ViewTransform::fit(
        0.0, 0.0, 0.0, 0.0,
    )));
    let paths: Rc<RefCell<PathCache>> = Rc::new(RefCell::new(HashMap::new()));

    let mode = Memo::new(move |_| view_model.with(|vm| vm.mode()));
    // Only hover and mode changes alter the picture; tooltip moves do not.
    let drawn_state = Memo::new(move |_| {
        view_model.with(|vm| {
            let state = vm.state();
            (
                vm.mode(),
                state.hovered_region.clone(),
                state.hovered_territory.clone(),
            )
        })
    });

    let scheduler = {
        let transform = transform.clone();
        let paths = paths.clone();
        Rc::new(FrameScheduler::new(move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let canvas: &HtmlCanvasElement = &canvas;
            let Some(parent) = canvas.parent_element() else {
                return;
            };
            let (w, h) = (parent.client_width() as f64, parent.client_height() as f64);
            if w <= 0.0 || h <= 0.0 {
                return;
            }
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0);
            let (pw, ph) = ((w * dpr).round() as u32, (h * dpr).round() as u32);
            if canvas.width() != pw || canvas.height() != ph {
                canvas.set_width(pw);
                canvas.set_height(ph);
            }
            let Some(ctx) = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            else {
                return;
            };

            ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
            ctx.clear_rect(0.0, 0.0, pw as f64, ph as f64);

            let scene = view_model.with_untracked(|vm| {
                layouts.with_active(vm, |config, layout| build_scene(config, layout, vm.state()))
            });
            let Some(scene) = scene else {
                return;
            };
            let fitted = ViewTransform::fit(scene.width, scene.height, w, h);
            *transform.borrow_mut() = fitted;
            ctx.set_transform(
                dpr * fitted.scale,
                0.0,
                0.0,
                dpr * fitted.scale,
                dpr * fitted.dx,
                dpr * fitted.dy,
            )
            .ok();
            paint_scene(&ctx, &scene, &mut paths.borrow_mut());
        }))
    };

    // Rebuild the hit grid and drop cached paths when the active layout changes.
    Effect::new({
        let grid = hit_grid.clone();
        let paths = paths.clone();
        move || {
            mode.track();
            layouts.track();
            let built = view_model
                .with_untracked(|vm| layouts.with_active(vm, |_, layout| layout.hit_grid()));
            *grid.borrow_mut() = built;
            paths.borrow_mut().clear();
        }
    });

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            drawn_state.track();
            layouts.track();
            window_size.track();
            scheduler.request();
        }
    });

    let hit_at = {
        let grid = hit_grid.clone();
        let transform = transform.clone();
        move |client_x: f64, client_y: f64| -> Option<Hit> {
            let canvas = canvas_ref.get_untracked()?;
            let rect = canvas.get_bounding_client_rect();
            let (sx, sy) = transform
                .borrow()
                .to_scene(client_x - rect.left(), client_y - rect.top());
            grid.borrow().as_ref()?.find_at(sx, sy).cloned()
        }
    };

    let on_pointer_move = {
        let hit_at = hit_at.clone();
        move |e: PointerEvent| {
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            let hit = hit_at(x, y);
            let interactive = view_model
                .with_untracked(|vm| hit.as_ref().is_some_and(|hit| is_interactive(hit, vm)));
            view_model.update(|vm| {
                vm.hover(hit.as_ref(), x, y);
            });
            if let Some(canvas) = canvas_ref.get_untracked() {
                let el: &web_sys::HtmlElement = &canvas;
                el.style().set_property("cursor", cursor_for(interactive)).ok();
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        view_model.update(|vm| {
            vm.hover(None, 0.0, 0.0);
        });
    };

    let on_click = move |e: MouseEvent| {
        let hit = hit_at(e.client_x() as f64, e.client_y() as f64);
        let Some(activation) = view_model.try_update(|vm| vm.activate(hit.as_ref())) else {
            return;
        };
        match activation {
            Activation::Select(request) => layouts.load_detail(request),
            Activation::Navigate(url) => {
                if let Some(window) = web_sys::window()
                    && let Err(e) = window.location().set_href(&url)
                {
                    web_sys::console::warn_1(&format!("Navigation to {url} failed: {e:?}").into());
                }
            }
            Activation::None => {}
        }
    };

    view! {
        <div style="position: relative; width: 100%; height: 100%; overflow: hidden;">
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none;"
                on:pointermove=on_pointer_move
                on:pointerleave=on_pointer_leave
                on:click=on_click
            />
        </div>
    }
}
