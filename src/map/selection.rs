use std::io::Write;

use log::{info, warn};
use ratatui::style::Color;
use serde::Serialize;
use serde_json::{Map as JsonObject, Value as JsonValue};

use crate::map::assembly::{GroupId, PrimitiveSet, DEFAULT_COUNTRY_COLOR};

/// Tint applied to the outlines of the selected country
pub const HIGHLIGHT_COLOR: Color = Color::Rgb(0xFF, 0xD7, 0x00);

/// Identity of a picked country, as reported to listeners
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountrySelected {
    pub name: String,
    pub code: String,
    pub properties: JsonObject<String, JsonValue>,
}

/// Cross-process envelope: `{"type":"countrySelected","country":{..}}`
#[derive(Serialize)]
struct SelectionMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    country: &'a CountrySelected,
}

/// Receives a notification for every successful pick
pub trait SelectionListener {
    fn country_selected(&mut self, country: &CountrySelected);
}

/// Writes one JSON message per selection, for a host process reading our output
pub struct JsonLineNotifier<W: Write> {
    out: W,
}

impl<W: Write> JsonLineNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SelectionListener for JsonLineNotifier<W> {
    fn country_selected(&mut self, country: &CountrySelected) {
        let message = SelectionMessage {
            kind: "countrySelected",
            country,
        };
        let result = serde_json::to_writer(&mut self.out, &message)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!("failed to post selection of {:?}: {}", country.name, e);
        }
    }
}

/// Tracks the selected country of the active projection and keeps its tint
/// in sync.
#[derive(Default)]
pub struct SelectionController {
    selected: Option<GroupId>,
    /// What the info panel shows
    panel: Option<CountrySelected>,
    listeners: Vec<Box<dyn SelectionListener>>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn SelectionListener>) {
        self.listeners.push(listener);
    }

    pub fn selected(&self) -> Option<GroupId> {
        self.selected
    }

    pub fn panel(&self) -> Option<&CountrySelected> {
        self.panel.as_ref()
    }

    /// Highlight `group` in `set`, restoring the previous selection first,
    /// then notify listeners. Unknown ids leave the state untouched.
    pub fn select(&mut self, set: &mut PrimitiveSet, group: GroupId) -> Option<&CountrySelected> {
        let country = {
            let g = set.group(group)?;
            CountrySelected {
                name: g.name.clone(),
                code: g.code.clone(),
                properties: g.properties.clone(),
            }
        };

        if let Some(previous) = self.selected.take() {
            set.set_group_color(previous, DEFAULT_COUNTRY_COLOR);
        }
        set.set_group_color(group, HIGHLIGHT_COLOR);
        self.selected = Some(group);

        info!("selected {} ({})", country.name, country.code);
        for listener in &mut self.listeners {
            listener.country_selected(&country);
        }

        self.panel = Some(country);
        self.panel.as_ref()
    }

    /// Restore the default tint and forget the selection
    pub fn clear(&mut self, set: &mut PrimitiveSet) {
        if let Some(previous) = self.selected.take() {
            set.set_group_color(previous, DEFAULT_COUNTRY_COLOR);
        }
        self.panel = None;
    }
}
