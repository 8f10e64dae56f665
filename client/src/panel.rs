use std::sync::Arc;

use leptos::prelude::*;

use velox_shared::colors::{self, darken, hex_with_alpha};
use velox_shared::{Classification, MapMode, MapViewModel, Territory};

use crate::app::{Layouts, LoadStatus};

const PANEL_STYLE: &str = "background: rgba(255,255,255,0.96); border: 1px solid #e2e8f0; border-radius: 8px; box-shadow: 0 4px 16px rgba(15,23,42,0.12);";

/// Floating label for the hovered territory county.
#[component]
pub fn Tooltip() -> impl IntoView {
    let view_model: RwSignal<MapViewModel> = expect_context();
    let tooltip = Memo::new(move |_| view_model.with(|vm| vm.state().tooltip.clone()));

    view! {
        {move || {
            let Some(tip) = tooltip.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            view! {
                <div
                    style:left=format!("{}px", tip.x + 14.0)
                    style:top=format!("{}px", tip.y - 10.0)
                    style="position: fixed; pointer-events: none; z-index: 100; padding: 8px 10px; max-width: 240px; background: #0f172a; color: #f8fafc; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.35); font-family: 'Inter', system-ui, sans-serif;"
                >
                    <div style="font-size: 0.85rem; font-weight: 700; line-height: 1.3;">{tip.title}</div>
                    <div style="font-size: 0.75rem; color: #cbd5e1; margin-top: 2px;">{tip.subtitle}</div>
                    <div style="font-size: 0.65rem; color: #94a3b8; margin-top: 5px; padding-top: 4px; border-top: 1px solid rgba(148,163,184,0.25);">
                        "Click for details"
                    </div>
                </div>
            }
            .into_any()
        }}
    }
}

fn swatch_style(color: &str) -> String {
    let border = darken(color, 0.25).unwrap_or_else(|| color.to_string());
    format!(
        "display: inline-block; width: 12px; height: 12px; border-radius: 3px; background: {color}; border: 1px solid {border}; flex-shrink: 0;"
    )
}

/// Classification colors plus the two state fills.
#[component]
pub fn Legend() -> impl IntoView {
    let rows: Vec<(String, &'static str)> = Classification::ALL
        .iter()
        .map(|kind| (kind.label().to_string(), kind.color()))
        .chain([
            ("Covered state".to_string(), colors::COVERED_STATE),
            ("Not yet covered".to_string(), colors::UNCOVERED_STATE),
        ])
        .collect();

    view! {
        <div style=format!("position: absolute; left: 16px; bottom: 16px; padding: 10px 12px; font-size: 0.75rem; color: #334155; {PANEL_STYLE}")>
            {rows
                .into_iter()
                .map(|(label, color)| {
                    view! {
                        <div style="display: flex; align-items: center; gap: 8px; margin: 3px 0;">
                            <span style=swatch_style(color) />
                            <span>{label}</span>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

fn territory_row(territory: Arc<Territory>) -> impl IntoView {
    let color = territory.kind.color();
    let counties = territory.counties.len();
    let url = (!territory.url.is_empty()).then(|| territory.url.clone());
    view! {
        <li style=format!("list-style: none; padding: 8px 10px; margin-bottom: 6px; border-radius: 6px; border-left: 3px solid {color}; background: {};", hex_with_alpha(color, 0.08))>
            <div style="font-weight: 600; color: #0f172a;">{territory.label.clone()}</div>
            <div style="font-size: 0.72rem; color: #64748b; margin-top: 2px;">
                {format!("{} · {} {}", territory.kind, counties, if counties == 1 { "county" } else { "counties" })}
            </div>
            {url.map(|href| view! {
                <a href=href style="font-size: 0.72rem; color: #2563eb; text-decoration: none;">"View territory"</a>
            })}
        </li>
    }
}

/// Side panel listing the selected state's territories.
#[component]
pub fn DetailPanel() -> impl IntoView {
    let view_model: RwSignal<MapViewModel> = expect_context();
    let selected = Memo::new(move |_| match view_model.with(|vm| vm.mode()) {
        MapMode::Detail(state) => Some(state),
        MapMode::Overview => None,
    });

    view! {
        {move || {
            let Some(state) = selected.get() else {
                return ().into_any();
            };
            let territories: Vec<Arc<Territory>> =
                view_model.with_untracked(|vm| vm.index().territories_for(&state).to_vec());
            view! {
                <aside style=format!("position: absolute; top: 16px; right: 16px; bottom: 16px; width: 280px; display: flex; flex-direction: column; {PANEL_STYLE}")>
                    <header style="display: flex; align-items: center; gap: 8px; padding: 12px; border-bottom: 1px solid #e2e8f0;">
                        <button
                            style="padding: 4px 10px; border: 1px solid #cbd5e1; border-radius: 5px; background: #fff; cursor: pointer; color: #334155;"
                            on:click=move |_| {
                                view_model.update(|vm| {
                                    vm.back();
                                });
                            }
                        >
                            "\u{2190} Back"
                        </button>
                        <h2 style="flex: 1; margin: 0; font-size: 1rem; color: #0f172a;">{format!("{state} territories")}</h2>
                        <button
                            title="Close"
                            style="border: none; background: none; font-size: 1.1rem; cursor: pointer; color: #64748b;"
                            on:click=move |_| {
                                view_model.update(|vm| {
                                    vm.close();
                                });
                            }
                        >
                            "\u{00D7}"
                        </button>
                    </header>
                    <ul style="margin: 0; padding: 12px; overflow-y: auto; flex: 1;">
                        {territories.into_iter().map(territory_row).collect_view()}
                    </ul>
                </aside>
            }
            .into_any()
        }}
    }
}

/// Loading and failure notices. A failed load leaves the map empty.
#[component]
pub fn StatusOverlay() -> impl IntoView {
    let layouts: Layouts = expect_context();
    let status = layouts.status();

    view! {
        {move || {
            let text = match status.get() {
                LoadStatus::Ready => return ().into_any(),
                LoadStatus::Loading => "Loading map\u{2026}".to_string(),
                LoadStatus::Failed(reason) => format!("Map data unavailable: {reason}"),
            };
            view! {
                <div style=format!("position: absolute; top: 16px; left: 50%; transform: translateX(-50%); padding: 8px 14px; font-size: 0.8rem; color: #334155; {PANEL_STYLE}")>
                    {text}
                </div>
            }
            .into_any()
        }}
    }
}
