#![cfg(feature = "egui")]

use std::time::Duration;

use eframe::egui::{self, Color32, RichText};

use super::state::{DrillApp, SlotCard};
use crate::controls::{ChannelToggleControl, ControlState};
use crate::model::{Channel, SlotName};

enum Action {
    Randomize,
    ShowAll,
    Toggle(SlotName),
    Channel(String, Channel, bool),
    Control(ChannelToggleControl),
    Speak(String),
}

pub fn update(app: &mut DrillApp, ctx: &egui::Context) {
    ctx.set_zoom_factor(app.prefs.zoom);
    let mut actions: Vec<Action> = Vec::new();
    let mut zoom = app.prefs.zoom;

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("🎲 Randomize").clicked() {
                actions.push(Action::Randomize);
            }
            if ui.button("Show all").clicked() {
                actions.push(Action::ShowAll);
            }
            ui.separator();
            ui.add(egui::Slider::new(&mut zoom, crate::prefs::MIN_ZOOM..=crate::prefs::MAX_ZOOM).text("Zoom"));
            ui.separator();
            if let Some(id) = app.session.current_sentence() {
                ui.label(RichText::new(format!("Sentence {}", id)).weak());
            }
        });
        if let Some(notice) = app.session.notice() {
            ui.label(RichText::new(notice).color(Color32::LIGHT_RED));
        }
        if let Some(status) = &app.status {
            ui.label(RichText::new(status).color(Color32::YELLOW));
        }
    });

    let slots = app.slot_cards();
    let subslots = app.subslot_cards();
    let expanded = app.session.expanded();
    let tree_top = app.session.tree().top_display_text;

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            if !tree_top.is_empty() {
                ui.label(RichText::new(&tree_top).strong().size(20.0));
            }
            for card in &slots {
                card_ui(ui, card, true, expanded == Some(card.name), &mut actions);
            }
        });
        if let Some(parent) = expanded {
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{} subslots", parent)).strong());
                for channel in Channel::ALL {
                    let control = ChannelToggleControl::for_subslots(parent, channel);
                    let label = match control.state(app.session.visibility()) {
                        ControlState::AllVisible => format!("Hide {}", channel),
                        _ => format!("Show {}", channel),
                    };
                    if ui.button(label).clicked() {
                        actions.push(Action::Control(control));
                    }
                }
            });
            ui.horizontal_wrapped(|ui| {
                for card in &subslots {
                    card_ui(ui, card, false, false, &mut actions);
                }
            });
        }
    });

    app.set_zoom(zoom);
    for action in actions {
        match action {
            Action::Randomize => {
                let r = app.session.randomize();
                app.report("randomize", r);
            }
            Action::ShowAll => {
                app.session.show_all("");
            }
            Action::Toggle(slot) => {
                let r = app.session.toggle_subslot(slot);
                app.report("toggle", r);
            }
            Action::Channel(id, channel, visible) => {
                let r = app.session.set_visibility(&id, channel, visible);
                app.report("visibility", r);
            }
            Action::Control(control) => {
                app.session.toggle_control(&control);
            }
            Action::Speak(id) => {
                let r = app.session.speak(&id);
                app.report("speak", r);
            }
        }
    }
    if app.session.tick() {
        log::trace!("ui: re-synced");
    }
    ctx.request_repaint_after(Duration::from_millis(100));
}

fn card_ui(ui: &mut egui::Ui, card: &SlotCard, top_level: bool, open: bool, actions: &mut Vec<Action>) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(card.name.as_str()).small().weak());
            if !card.is_hidden(Channel::Image) {
                match &card.image {
                    Some(src) => ui.label(format!("🖼 {}", src)),
                    None => ui.label(RichText::new("🖼").weak()),
                };
            }
            if !card.is_hidden(Channel::Text) && ui.link(RichText::new(&card.phrase).size(18.0)).clicked() {
                actions.push(Action::Speak(card.element_id.clone()));
            }
            if !card.is_hidden(Channel::AuxText) {
                ui.label(RichText::new(&card.gloss).italics());
            }
            ui.horizontal(|ui| {
                for channel in Channel::ALL {
                    let mut visible = !card.is_hidden(channel);
                    if ui.checkbox(&mut visible, channel.as_key()).changed() {
                        actions.push(Action::Channel(card.element_id.clone(), channel, visible));
                    }
                }
            });
            if top_level && card.has_subslots {
                let label = if open { "▲" } else { "▼" };
                if ui.button(label).clicked() {
                    actions.push(Action::Toggle(card.name));
                }
            }
        });
    });
}
