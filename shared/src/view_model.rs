//! Interaction state of the map and the transitions pointer and keyboard
//! events drive. Nothing here touches a rendering surface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Territory;
use crate::identity;
use crate::index::TerritoryIndex;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapMode {
    #[default]
    Overview,
    Detail(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub x: f64,
    pub y: f64,
    pub title: String,
    pub subtitle: String,
}

/// Transient interaction state. Hovered region and hovered territory are
/// never set at the same time, and only a territory hover opens a tooltip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub hovered_region: Option<String>,
    pub hovered_territory: Option<String>,
    pub tooltip: Option<Tooltip>,
    pub selected_state: Option<String>,
}

impl ViewState {
    pub fn mode(&self) -> MapMode {
        match &self.selected_state {
            Some(state) => MapMode::Detail(state.clone()),
            None => MapMode::Overview,
        }
    }

    fn clear_hover(&mut self) {
        self.hovered_region = None;
        self.hovered_territory = None;
        self.tooltip = None;
    }
}

/// What the pointer is over, as resolved by a hit test.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    State { code: String },
    County {
        name: String,
        territory: Option<Arc<Territory>>,
    },
}

/// Ticket for the county set of a newly selected state. Only the latest
/// ticket is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub state: String,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Select(DetailRequest),
    Navigate(String),
    None,
}

pub struct MapViewModel {
    index: Arc<TerritoryIndex>,
    state: ViewState,
    detail_nonce: u64,
}

impl MapViewModel {
    pub fn new(index: Arc<TerritoryIndex>) -> Self {
        Self {
            index,
            state: ViewState::default(),
            detail_nonce: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn mode(&self) -> MapMode {
        self.state.mode()
    }

    pub fn index(&self) -> &Arc<TerritoryIndex> {
        &self.index
    }

    /// Open the detail view for a covered state. Uncovered states are a no-op.
    pub fn select_state(&mut self, code: &str) -> Option<DetailRequest> {
        if !self.index.state_has_coverage(code) {
            return None;
        }
        self.state.clear_hover();
        self.state.selected_state = Some(code.to_ascii_uppercase());
        self.begin_detail_request()
    }

    /// A new ticket for the current selection; earlier tickets go stale.
    pub fn begin_detail_request(&mut self) -> Option<DetailRequest> {
        let state = self.state.selected_state.clone()?;
        self.detail_nonce = self.detail_nonce.wrapping_add(1);
        Some(DetailRequest {
            state,
            nonce: self.detail_nonce,
        })
    }

    /// Whether a finished detail load still matches the current selection.
    pub fn accept_detail(&self, request: &DetailRequest) -> bool {
        request.nonce == self.detail_nonce
            && self.state.selected_state.as_deref() == Some(request.state.as_str())
    }

    /// Return to the overview. Returns false when already there.
    pub fn back(&mut self) -> bool {
        if self.state.selected_state.is_none() {
            return false;
        }
        self.state.selected_state = None;
        self.state.clear_hover();
        self.detail_nonce = self.detail_nonce.wrapping_add(1);
        true
    }

    pub fn close(&mut self) -> bool {
        self.back()
    }

    pub fn escape(&mut self) -> bool {
        self.back()
    }

    pub fn pointer_enter_state(&mut self, code: &str) {
        if self.state.selected_state.is_some() || !self.index.is_state_interactive(code) {
            return;
        }
        self.state.clear_hover();
        self.state.hovered_region = Some(code.to_string());
    }

    pub fn pointer_leave_state(&mut self, code: &str) {
        if self.state.hovered_region.as_deref() == Some(code) {
            self.state.hovered_region = None;
        }
    }

    /// Hover a county that belongs to `territory`. Takes precedence over a state hover.
    pub fn pointer_enter_territory_county(
        &mut self,
        territory: &Territory,
        county_name: &str,
        x: f64,
        y: f64,
    ) {
        self.state.hovered_region = None;
        self.state.hovered_territory = Some(territory.key.clone());
        self.state.tooltip = Some(Tooltip {
            x,
            y,
            title: territory.label.clone(),
            subtitle: identity::clean_county_name(county_name),
        });
    }

    pub fn pointer_leave_territory(&mut self, key: &str) {
        if self.state.hovered_territory.as_deref() == Some(key) {
            self.state.hovered_territory = None;
            self.state.tooltip = None;
        }
    }

    /// Moves an open tooltip. Never opens one.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(tooltip) = &mut self.state.tooltip {
            tooltip.x = x;
            tooltip.y = y;
        }
    }

    /// Apply a hit-test result for the pointer at `(x, y)`: leave whatever was
    /// hovered, enter the new target, or just move the tooltip when the
    /// target is unchanged. Returns true when the view state changed.
    pub fn hover(&mut self, hit: Option<&Hit>, x: f64, y: f64) -> bool {
        let before = self.state.clone();
        match hit {
            Some(Hit::County {
                name,
                territory: Some(territory),
            }) => {
                let same_territory = self.state.hovered_territory.as_deref()
                    == Some(territory.key.as_str())
                    && self
                        .state
                        .tooltip
                        .as_ref()
                        .is_some_and(|t| t.subtitle == identity::clean_county_name(name));
                if same_territory {
                    self.pointer_move(x, y);
                } else {
                    self.leave_all();
                    self.pointer_enter_territory_county(territory, name, x, y);
                }
            }
            Some(Hit::State { code }) if self.state.selected_state.is_none() => {
                if self.state.hovered_region.as_deref() != Some(code.as_str()) {
                    self.leave_all();
                    self.pointer_enter_state(code);
                }
            }
            _ => self.leave_all(),
        }
        self.state != before
    }

    /// Click handling: covered states open their detail view, territory
    /// counties navigate to the territory page.
    pub fn activate(&mut self, hit: Option<&Hit>) -> Activation {
        match hit {
            Some(Hit::State { code }) if self.state.selected_state.is_none() => self
                .select_state(code)
                .map_or(Activation::None, Activation::Select),
            Some(Hit::County {
                territory: Some(territory),
                ..
            }) if !territory.url.is_empty() => Activation::Navigate(territory.url.clone()),
            _ => Activation::None,
        }
    }

    fn leave_all(&mut self) {
        if let Some(key) = self.state.hovered_territory.clone() {
            self.pointer_leave_territory(&key);
        }
        if let Some(code) = self.state.hovered_region.clone() {
            self.pointer_leave_state(&code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TerritoryCatalog;

    const CATALOG: &str = r#"{
        "TX": [
            {"key": "TX_A", "label": "Austin", "type": "CORPORATE", "counties": ["Travis", "Hays"], "url": "https://example.com/austin"},
            {"key": "TX_B", "label": "Houston", "type": "FRANCHISE", "counties": ["Harris"], "url": ""}
        ],
        "AZ": [{"key": "AZ_PHOENIX", "label": "Phoenix", "type": "GREEN", "counties": ["Maricopa"], "url": "https://example.com/phx"}],
        "AL": []
    }"#;

    fn model() -> MapViewModel {
        let catalog = TerritoryCatalog::from_json(CATALOG).expect("catalog parses");
        MapViewModel::new(Arc::new(TerritoryIndex::build(catalog)))
    }

    fn territory(vm: &MapViewModel, state: &str, county: &str) -> Arc<Territory> {
        vm.index()
            .classify_county(state, county)
            .expect("county is covered")
    }

    fn county_hit(vm: &MapViewModel, state: &str, county: &str) -> Hit {
        Hit::County {
            name: format!("{county} County"),
            territory: Some(territory(vm, state, county)),
        }
    }

    fn state_hit(code: &str) -> Hit {
        Hit::State {
            code: code.to_string(),
        }
    }

    #[test]
    fn covered_state_opens_detail_and_back_returns() {
        let mut vm = model();
        let request = vm.select_state("TX").expect("TX is covered");
        assert_eq!(vm.mode(), MapMode::Detail("TX".to_string()));
        assert_eq!(request.state, "TX");

        assert!(vm.back());
        assert_eq!(vm.mode(), MapMode::Overview);
        assert!(!vm.back());
    }

    #[test]
    fn uncovered_state_selection_is_a_no_op() {
        let mut vm = model();
        assert!(vm.select_state("AL").is_none());
        assert!(vm.select_state("NV").is_none());
        assert_eq!(vm.state(), &ViewState::default());
    }

    #[test]
    fn escape_clears_detail_and_hover() {
        let mut vm = model();
        vm.select_state("AZ");
        let phoenix = territory(&vm, "AZ", "Maricopa");
        vm.pointer_enter_territory_county(&phoenix, "Maricopa County", 5.0, 6.0);
        assert!(vm.state().tooltip.is_some());

        assert!(vm.escape());
        assert_eq!(vm.state(), &ViewState::default());
        assert!(!vm.escape());
    }

    #[test]
    fn territory_hover_opens_one_tooltip_and_clears_state_hover() {
        let mut vm = model();
        vm.pointer_enter_state("TX");
        assert_eq!(vm.state().hovered_region.as_deref(), Some("TX"));
        assert!(vm.state().tooltip.is_none());

        let austin = territory(&vm, "TX", "Travis");
        vm.pointer_enter_territory_county(&austin, "Travis County", 10.0, 20.0);
        let state = vm.state();
        assert_eq!(state.hovered_region, None);
        assert_eq!(state.hovered_territory.as_deref(), Some("TX_A"));
        let tooltip = state.tooltip.as_ref().expect("tooltip is open");
        assert_eq!(tooltip.title, "Austin");
        assert_eq!(tooltip.subtitle, "Travis");

        vm.pointer_move(11.0, 21.0);
        assert_eq!(vm.state().tooltip.as_ref().map(|t| (t.x, t.y)), Some((11.0, 21.0)));

        vm.pointer_leave_territory("TX_B");
        assert!(vm.state().tooltip.is_some());
        vm.pointer_leave_territory("TX_A");
        assert_eq!(vm.state(), &ViewState::default());
    }

    #[test]
    fn pointer_move_never_opens_a_tooltip() {
        let mut vm = model();
        vm.pointer_move(1.0, 2.0);
        assert!(vm.state().tooltip.is_none());
    }

    #[test]
    fn non_interactive_states_ignore_hover() {
        let mut vm = model();
        vm.pointer_enter_state("AL");
        assert!(vm.state().hovered_region.is_none());
        vm.pointer_enter_state("AZ");
        vm.pointer_leave_state("TX");
        assert_eq!(vm.state().hovered_region.as_deref(), Some("AZ"));
        vm.pointer_leave_state("AZ");
        assert!(vm.state().hovered_region.is_none());
    }

    #[test]
    fn hover_composes_leave_and_enter() {
        let mut vm = model();
        assert!(vm.hover(Some(&state_hit("TX")), 1.0, 1.0));
        assert!(!vm.hover(Some(&state_hit("TX")), 2.0, 2.0));

        let travis = county_hit(&vm, "TX", "Travis");
        assert!(vm.hover(Some(&travis), 3.0, 3.0));
        assert_eq!(vm.state().hovered_region, None);
        assert!(vm.hover(Some(&travis), 4.0, 4.0));
        assert_eq!(vm.state().tooltip.as_ref().map(|t| t.x), Some(4.0));

        let hays = county_hit(&vm, "TX", "Hays");
        vm.hover(Some(&hays), 5.0, 5.0);
        assert_eq!(vm.state().tooltip.as_ref().map(|t| t.subtitle.as_str()), Some("Hays"));

        let plain = Hit::County {
            name: "Anderson".to_string(),
            territory: None,
        };
        assert!(vm.hover(Some(&plain), 6.0, 6.0));
        assert_eq!(vm.state(), &ViewState::default());

        vm.hover(Some(&state_hit("TX")), 7.0, 7.0);
        assert!(vm.hover(None, 8.0, 8.0));
        assert_eq!(vm.state(), &ViewState::default());
    }

    #[test]
    fn hovered_region_and_territory_are_never_both_set() {
        let mut vm = model();
        let hits = [
            Some(state_hit("TX")),
            Some(county_hit(&vm, "TX", "Travis")),
            Some(state_hit("AZ")),
            Some(county_hit(&vm, "AZ", "Maricopa")),
            None,
            Some(state_hit("AL")),
        ];
        for (step, hit) in hits.iter().enumerate() {
            vm.hover(hit.as_ref(), step as f64, step as f64);
            let state = vm.state();
            assert!(!(state.hovered_region.is_some() && state.hovered_territory.is_some()));
            assert_eq!(state.tooltip.is_some(), state.hovered_territory.is_some());
        }
    }

    #[test]
    fn state_hover_is_ignored_in_detail() {
        let mut vm = model();
        vm.select_state("TX");
        vm.hover(Some(&state_hit("TX")), 1.0, 1.0);
        assert!(vm.state().hovered_region.is_none());
    }

    #[test]
    fn activation_selects_states_and_navigates_territories() {
        let mut vm = model();
        assert_eq!(vm.activate(Some(&state_hit("AL"))), Activation::None);
        let travis = county_hit(&vm, "TX", "Travis");
        assert_eq!(
            vm.activate(Some(&travis)),
            Activation::Navigate("https://example.com/austin".to_string())
        );
        let harris = county_hit(&vm, "TX", "Harris");
        assert_eq!(vm.activate(Some(&harris)), Activation::None);

        match vm.activate(Some(&state_hit("TX"))) {
            Activation::Select(request) => assert_eq!(request.state, "TX"),
            other => panic!("expected selection, got {other:?}"),
        }
        assert_eq!(vm.activate(None), Activation::None);
    }

    #[test]
    fn stale_detail_results_are_rejected() {
        let mut vm = model();
        let first = vm.select_state("TX").expect("covered");
        let second = vm.select_state("AZ").expect("covered");
        assert!(!vm.accept_detail(&first));
        assert!(vm.accept_detail(&second));

        let retry = vm.begin_detail_request().expect("a state is selected");
        assert!(!vm.accept_detail(&second));
        assert!(vm.accept_detail(&retry));

        vm.back();
        assert!(!vm.accept_detail(&retry));
        assert!(vm.begin_detail_request().is_none());
    }

    #[test]
    fn view_state_serializes() {
        let mut vm = model();
        vm.select_state("tx");
        let json = serde_json::to_string(vm.state()).expect("serializes");
        let back: ViewState = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.selected_state.as_deref(), Some("TX"));
    }
}
