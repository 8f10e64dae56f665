mod app;
mod canvas;
mod embed;
mod loader;
mod panel;
mod render_loop;

use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

use crate::app::App;
use crate::embed::EmbedConfig;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_element = document
        .get_element_by_id("velox-map")
        .or_else(|| document.get_element_by_id("app"));
    let embed = EmbedConfig::from_page(mount_element.as_ref());
    let mount_target = mount_element
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop any previous mount so its effects stop before the new one starts.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, move || view! { <App embed=embed /> });
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}

