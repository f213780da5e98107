#![cfg(feature = "egui")]

use std::rc::Rc;

use camino::Utf8Path;
use eframe::egui;

use crate::dom::Document;
use crate::model::{Channel, SlotName};
use crate::prefs::{UiPrefs, clamp_zoom};
use crate::projector::naming::{self, ElementKey, NO_SUBSLOTS_CLASS};
use crate::session::Session;
use crate::store::FsSource;
use crate::visibility::KeyValueStorage;

/// Everything the UI needs to draw one slot or subslot container.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCard {
    pub element_id: String,
    pub name: SlotName,
    pub phrase: String,
    pub gloss: String,
    pub image: Option<String>,
    /// Channels the user hid, in [`Channel::ALL`] order.
    pub hidden: [bool; 3],
    pub has_subslots: bool,
}

impl SlotCard {
    pub fn is_hidden(&self, channel: Channel) -> bool {
        let i = Channel::ALL.iter().position(|&c| c == channel).unwrap_or(0);
        self.hidden[i]
    }
}

/// Read the rendered containers among `ids` out of `doc`, sorted the way the
/// browser would lay them out: by `order` style, then document order.
pub fn cards_in_order(doc: &Document, ids: &[String]) -> Vec<SlotCard> {
    let mut cards: Vec<(i64, usize, SlotCard)> = Vec::new();
    for id in ids {
        let Some(node) = doc.find(id) else {
            continue;
        };
        if !doc.is_rendered(node) {
            continue;
        }
        let name = match ElementKey::parse(id) {
            Some(ElementKey::Slot(s)) => s,
            Some(ElementKey::Subslot { name, .. }) => name,
            None => continue,
        };
        let part = |c: Channel| doc.find(&naming::channel_part_id(id, c));
        let text_of = |c: Channel| part(c).map(|p| doc.get(p).text.clone()).unwrap_or_default();
        let mut hidden = [false; 3];
        for (i, c) in Channel::ALL.iter().enumerate() {
            hidden[i] = part(*c).is_some_and(|p| doc.has_class(p, naming::hidden_class(*c)));
        }
        let image = part(Channel::Image).and_then(|p| doc.get(p).attr("src").map(str::to_string));
        let has_subslots = match ElementKey::parse(id) {
            Some(ElementKey::Slot(s)) => doc
                .find(&naming::toggle_button_id(s))
                .is_some_and(|b| !doc.has_class(b, NO_SUBSLOTS_CLASS)),
            _ => false,
        };
        let order = doc
            .style(node, "order")
            .and_then(|o| o.parse::<i64>().ok())
            .unwrap_or(0);
        let position = doc
            .parent(node)
            .and_then(|p| doc.children(p).iter().position(|&c| c == node))
            .unwrap_or(0);
        cards.push((
            order,
            position,
            SlotCard {
                element_id: id.clone(),
                name,
                phrase: text_of(Channel::Text),
                gloss: text_of(Channel::AuxText),
                image,
                hidden,
                has_subslots,
            },
        ));
    }
    cards.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    cards.into_iter().map(|(_, _, c)| c).collect()
}

/// Interactive drill window around a [`Session`].
pub struct DrillApp {
    pub session: Session,
    pub prefs: UiPrefs,
    prefs_storage: Rc<dyn KeyValueStorage>,
    pub status: Option<String>,
}

impl DrillApp {
    pub fn new(session: Session, prefs_storage: Rc<dyn KeyValueStorage>) -> Self {
        let prefs = UiPrefs::load(prefs_storage.as_ref());
        Self {
            session,
            prefs,
            prefs_storage,
            status: None,
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = clamp_zoom(zoom);
        if (zoom - self.prefs.zoom).abs() > f32::EPSILON {
            self.prefs.zoom = zoom;
            self.prefs.save(self.prefs_storage.as_ref());
        }
    }

    /// Load a preset file, named after its file stem, and show a sentence
    /// from it. A successful load becomes the preset reopened next start.
    pub fn open_preset(&mut self, path: &Utf8Path) {
        let id = path.file_stem().unwrap_or("preset").to_string();
        let loaded = self.session.load_preset(&id, &mut FsSource, path);
        if loaded.is_ok() {
            self.prefs.remember_preset(&id, self.prefs_storage.as_ref());
            let r = self.session.randomize();
            self.report("randomize", r);
        } else {
            self.report("load", loaded);
        }
    }

    pub fn slot_cards(&self) -> Vec<SlotCard> {
        let ids: Vec<String> = SlotName::ALL.iter().map(|&s| naming::slot_container_id(s)).collect();
        cards_in_order(self.session.document(), &ids)
    }

    pub fn subslot_cards(&self) -> Vec<SlotCard> {
        let Some(parent) = self.session.expanded() else {
            return Vec::new();
        };
        let doc = self.session.document();
        let Some(region) = doc.find(&naming::subslot_region_id(parent)) else {
            return Vec::new();
        };
        let ids: Vec<String> = doc
            .child_ids(region)
            .into_iter()
            .map(str::to_string)
            .collect();
        cards_in_order(doc, &ids)
    }

    /// Report the outcome of an action in the status line.
    pub fn report<T>(&mut self, what: &str, result: Result<T, crate::error::CoreError>) {
        self.status = match result {
            Ok(_) => None,
            Err(err) if err.is_user_visible() => Some(err.to_string()),
            Err(err) => {
                log::debug!("{}: {}", what, err);
                None
            }
        };
    }
}

impl eframe::App for DrillApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        super::ui::update(self, ctx);
    }
}
