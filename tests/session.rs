mod common;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use camino::Utf8Path;
use common::{channel_hidden, visible_slots};
use rephrase::collab::Speaker;
use rephrase::controls::{ChannelToggleControl, ControlState};
use rephrase::error::CoreError;
use rephrase::model::{Channel, SlotName};
use rephrase::projector::naming;
use rephrase::session::LoadState;
use rephrase::store::MemSource;
use rephrase::visibility::{MemoryStorage, VisibilityStore};

#[derive(Clone, Default)]
struct RecordingSpeaker(Rc<RefCell<Vec<String>>>);

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.0.borrow_mut().push(text.to_string());
    }
}

#[test]
fn fresh_session_renders_a_blank_grid() {
    let (session, _clock) = common::session();
    assert_eq!(session.load_state(), &LoadState::Ready);
    assert_eq!(session.current_sentence(), None);
    assert!(visible_slots(session.document()).is_empty());
    assert_eq!(session.notice(), None);
}

#[test]
fn randomize_to_renders_the_requested_sentence() {
    let (mut session, _clock) = common::session();
    let report = session.randomize_to("s2").unwrap();
    assert!(report.is_clean());
    assert_eq!(session.current_sentence(), Some("s2"));
    assert_eq!(visible_slots(session.document()), vec!["O1", "S", "V"]);
}

#[test]
fn failed_load_keeps_rows_and_shows_a_notice() {
    let (mut session, _clock) = common::session();
    session.randomize_to("s1").unwrap();
    let mut source = MemSource::new().with_file("bad.json", "not json");
    let err = session
        .load_preset("bad", &mut source, Utf8Path::new("bad.json"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Load { .. }));
    assert_eq!(session.store().preset_id(), Some("fixture"));
    assert_eq!(session.store().rows().len(), 21);
    assert_eq!(session.load_state(), &LoadState::Ready);

    let notice = session.notice().unwrap().to_string();
    assert!(notice.contains("bad"));
    let doc = session.document();
    let el = doc.find(naming::NOTICE_ID).unwrap();
    assert_eq!(doc.get(el).text, notice);
    assert_eq!(doc.style(el, "display"), None);
    // The sentence on screen is untouched.
    assert_eq!(visible_slots(doc), vec!["S", "V"]);

    let mut good = MemSource::new().with_file("p.json", common::PRESET);
    session.load_preset("again", &mut good, Utf8Path::new("p.json")).unwrap();
    assert_eq!(session.notice(), None);
    let el = session.document().find(naming::NOTICE_ID).unwrap();
    assert_eq!(session.document().style(el, "display"), Some("none"));
}

#[test]
fn actions_are_rejected_while_loading() {
    let (mut session, clock) = common::session();
    session.begin_load("next");
    assert_eq!(
        session.randomize().unwrap_err(),
        CoreError::NotReady { operation: "randomize" }
    );
    assert_eq!(
        session.toggle_subslot(SlotName::M1).unwrap_err(),
        CoreError::NotReady { operation: "toggle" }
    );
    session
        .complete_load("next", Ok(common::rows()))
        .unwrap();
    clock.advance(1000);
    assert!(session.randomize().is_ok());
}

#[test]
fn load_error_with_nothing_loaded_stays_empty() {
    let clock = Rc::new(rephrase::controller::ManualClock::new(0));
    let doc = rephrase::dom::template::build_default_document().unwrap();
    let mut session = rephrase::Session::new(
        rephrase::config::EngineConfig::default(),
        doc,
        VisibilityStore::in_memory(),
        clock,
    );
    session.begin_load("x");
    assert!(session.complete_load("x", Err(anyhow!("offline"))).is_err());
    assert_eq!(session.load_state(), &LoadState::Empty);
    // Randomizing an empty store renders the blank grid instead of failing.
    assert!(session.randomize().is_ok());
    assert!(visible_slots(session.document()).is_empty());
}

#[test]
fn flags_persist_across_randomize_and_reload() {
    let storage = Rc::new(MemoryStorage::new());
    let (mut session, clock) = common::session_with(VisibilityStore::open(storage.clone()));
    session.randomize_to("s3").unwrap();
    session.set_visibility("slot-s", Channel::Text, false).unwrap();
    assert!(channel_hidden(session.document(), "slot-s", Channel::Text));

    for _ in 0..5 {
        clock.advance(500);
        session.randomize().unwrap();
        assert!(channel_hidden(session.document(), "slot-s", Channel::Text));
    }

    // A new session over the same storage starts with the flag applied.
    let (mut reloaded, _clock) = common::session_with(VisibilityStore::open(storage));
    assert!(!reloaded.visibility().get("slot-s", Channel::Text));
    reloaded.randomize_to("s1").unwrap();
    assert!(channel_hidden(reloaded.document(), "slot-s", Channel::Text));
}

#[test]
fn flag_for_an_element_missing_from_markup_still_persists() {
    let (mut session, _clock) = common::session();
    let err = session
        .set_visibility("slot-x9", Channel::Image, false)
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingElement { .. }));
    assert!(!session.visibility().get("slot-x9", Channel::Image));
}

#[test]
fn toggling_through_the_session_uses_the_current_sentence() {
    let (mut session, clock) = common::session();
    session.randomize_to("s3").unwrap();
    session.set_visibility("slot-m1-sub-o1", Channel::Text, false).unwrap();

    assert_eq!(
        session.toggle_subslot(SlotName::M1).unwrap(),
        rephrase::controller::ToggleOutcome::Expanded(SlotName::M1)
    );
    assert_eq!(session.expanded(), Some(SlotName::M1));
    assert!(channel_hidden(session.document(), "slot-m1-sub-o1", Channel::Text));

    // The next sentence has no M1 subslots, so the region closes.
    clock.advance(1000);
    session.randomize_to("s1").unwrap();
    assert_eq!(session.expanded(), None);
}

#[test]
fn external_writes_trigger_one_debounced_resync() {
    let (mut session, clock) = common::session();
    session.randomize_to("s1").unwrap();
    session.set_visibility("slot-v", Channel::Text, false).unwrap();
    assert!(!session.tick());

    // A script rewrites the phrase and wipes its classes.
    let doc = session.document_mut();
    let part = doc.find("slot-v-phrase").unwrap();
    doc.set_text(part, "worked");
    doc.remove_class(part, naming::hidden_class(Channel::Text));
    assert!(!channel_hidden(session.document(), "slot-v", Channel::Text));

    assert!(session.note_external_mutations());
    clock.advance(200);
    assert!(!session.tick());
    clock.advance(100);
    assert!(session.tick());
    assert!(channel_hidden(session.document(), "slot-v", Channel::Text));
    // The re-sync's own writes do not schedule another one.
    clock.advance(1000);
    assert!(!session.tick());
}

#[test]
fn channel_controls_hide_and_show_groups() {
    let (mut session, clock) = common::session();
    session.randomize_to("s3").unwrap();
    session.toggle_subslot(SlotName::O1).unwrap();
    clock.advance(1000);

    let control = ChannelToggleControl::for_subslots(SlotName::O1, Channel::AuxText);
    assert_eq!(control.state(session.visibility()), ControlState::AllVisible);
    assert!(!session.toggle_control(&control));
    assert_eq!(control.state(session.visibility()), ControlState::AllHidden);
    assert!(channel_hidden(session.document(), "slot-o1-sub-v", Channel::AuxText));

    session.set_visibility("slot-o1-sub-v", Channel::AuxText, true).unwrap();
    assert_eq!(control.state(session.visibility()), ControlState::Mixed);
    assert!(session.toggle_control(&control));
    assert_eq!(control.state(session.visibility()), ControlState::AllVisible);

    session.set_visibility("slot-o1-sub-c1", Channel::Image, false).unwrap();
    session.set_visibility("slot-s", Channel::Image, false).unwrap();
    assert_eq!(session.show_control(&control), 1);
    assert!(!channel_hidden(session.document(), "slot-o1-sub-c1", Channel::Image));
    assert!(channel_hidden(session.document(), "slot-s", Channel::Image));

    let slots = ChannelToggleControl::for_slots(Channel::Image);
    assert_eq!(slots.element_ids().len(), 10);
    assert_eq!(session.show_control(&slots), 1);
    assert!(!channel_hidden(session.document(), "slot-s", Channel::Image));
}

#[test]
fn show_all_resets_everything_under_a_prefix() {
    let (mut session, _clock) = common::session();
    session.randomize_to("s1").unwrap();
    session.set_visibility("slot-s", Channel::Text, false).unwrap();
    session.set_visibility("slot-v", Channel::AuxText, false).unwrap();
    assert_eq!(session.show_all(""), 2);
    assert!(!channel_hidden(session.document(), "slot-s", Channel::Text));
    assert!(!channel_hidden(session.document(), "slot-v", Channel::AuxText));
}

#[test]
fn speak_forwards_the_phrase() {
    let speaker = RecordingSpeaker::default();
    let (session, _clock) = common::session();
    let mut session = session.with_speaker(Box::new(speaker.clone()));
    session.randomize_to("s1").unwrap();
    session.speak("slot-v").unwrap();
    session.speak("slot-o2").unwrap();
    assert!(session.speak("slot-zz").is_err());
    assert_eq!(*speaker.0.borrow(), vec!["works".to_string()]);
}

#[test]
fn html_snapshot_carries_hidden_classes() {
    let (mut session, _clock) = common::session();
    session.randomize_to("s1").unwrap();
    session.set_visibility("slot-s", Channel::AuxText, false).unwrap();
    let html = session.render_html();
    assert!(html.contains(r#"id="slot-s-gloss" class="slot-gloss hidden-auxtext""#));
    assert!(html.contains(">She</div>"));
}

const NARROW: &str = r#"[
  {"sentenceId":"a","slot":"S","subslotId":"","phraseText":"I","displayOrder":1},
  {"sentenceId":"a","slot":"V","subslotId":"","phraseText":"am","displayOrder":2},
  {"sentenceId":"a","slot":"O1","subslotId":"","phraseText":"x","displayOrder":3},
  {"sentenceId":"a","slot":"O1","subslotId":"S","phraseText":"x","displayOrder":3,"subslotDisplayOrder":1},

  {"sentenceId":"b","slot":"S","subslotId":"","phraseText":"I","displayOrder":1},
  {"sentenceId":"b","slot":"V","subslotId":"","phraseText":"am","displayOrder":2},
  {"sentenceId":"b","slot":"O1","subslotId":"","phraseText":"y","displayOrder":3},
  {"sentenceId":"b","slot":"O1","subslotId":"S","phraseText":"aaaaaaaaaaaaaaa","displayOrder":3,"subslotDisplayOrder":1},
  {"sentenceId":"b","slot":"O1","subslotId":"V","phraseText":"bbbbbbbbbbbbbbb","displayOrder":3,"subslotDisplayOrder":2}
]"#;

#[test]
fn open_region_is_realigned_when_the_sentence_changes() {
    let clock = Rc::new(rephrase::controller::ManualClock::new(0));
    let config = rephrase::config::EngineConfig {
        viewport_width: 400.0,
        ..Default::default()
    };
    let doc = rephrase::dom::template::build_default_document().unwrap();
    let mut session = rephrase::Session::new(config, doc, VisibilityStore::in_memory(), clock.clone());
    let mut source = MemSource::new().with_file("narrow.json", NARROW);
    session
        .load_preset("narrow", &mut source, Utf8Path::new("narrow.json"))
        .unwrap();

    session.randomize_to("a").unwrap();
    session.toggle_subslot(SlotName::O1).unwrap();
    let region = session.document().find(&naming::subslot_region_id(SlotName::O1)).unwrap();
    // Three 64px slots with 8px gaps put O1 at x=144; one short subslot fits there.
    assert_eq!(session.document().style(region, "left"), Some("144px"));
    assert_eq!(session.document().rect(region).unwrap().width, 64.0);

    clock.advance(1000);
    session.randomize_to("b").unwrap();
    assert_eq!(session.expanded(), Some(SlotName::O1));
    let doc = session.document();
    let rect = doc.rect(region).unwrap();
    // Two 147px subslots and a gap.
    assert_eq!(rect.width, 302.0);
    assert_eq!(doc.style(region, "left"), Some("90px"));
    assert!(rect.left() >= 8.0);
    assert!(rect.right() <= 400.0 - 8.0);
}

#[test]
fn own_writes_do_not_pile_up_in_the_mutation_log() {
    let (mut session, clock) = common::session();
    session.randomize_to("s3").unwrap();
    session.toggle_subslot(SlotName::M1).unwrap();
    session.set_visibility("slot-s", Channel::Text, false).unwrap();
    assert!(session.document_mut().take_mutations().is_empty());

    // A foreign write made between two actions still gets its re-sync.
    let part = session.document().find("slot-s-phrase").unwrap();
    session
        .document_mut()
        .remove_class(part, naming::hidden_class(Channel::Text));
    session.set_visibility("slot-v", Channel::Text, false).unwrap();
    assert!(session.document_mut().take_mutations().is_empty());
    clock.advance(300);
    assert!(session.tick());
    assert!(channel_hidden(session.document(), "slot-s", Channel::Text));
}

#[test]
fn toggle_visibility_reports_missing_elements() {
    let (mut session, _clock) = common::session();
    session.randomize_to("s1").unwrap();
    assert_eq!(session.toggle_visibility("slot-s", Channel::Image), Ok(false));
    assert!(channel_hidden(session.document(), "slot-s", Channel::Image));
    assert_eq!(session.toggle_visibility("slot-s", Channel::Image), Ok(true));

    let err = session.toggle_visibility("slot-x9", Channel::Text).unwrap_err();
    assert!(matches!(err, CoreError::MissingElement { .. }));
    assert!(!session.visibility().get("slot-x9", Channel::Text));
}
