#![allow(dead_code)]

use std::rc::Rc;

use camino::Utf8Path;
use rephrase::config::EngineConfig;
use rephrase::controller::ManualClock;
use rephrase::dom::Document;
use rephrase::dom::template::build_default_document;
use rephrase::model::{Channel, Row};
use rephrase::projector::naming;
use rephrase::session::Session;
use rephrase::store::{ExampleStore, MemSource};
use rephrase::visibility::VisibilityStore;

/// Four sentences:
///
/// - `s1`: "She works" (S, V).
/// - `s2`: declared order O1, S, V.
/// - `s3`: M1 and O1 both carry subslots.
/// - `s4`: fronted "What" shown at the top.
pub const PRESET: &str = r#"[
  {"sentenceId":"s1","slot":"S","subslotId":"","phraseText":"She","glossText":"彼女は","displayOrder":1},
  {"sentenceId":"s1","slot":"V","subslotId":"","phraseText":"works","glossText":"働く","displayOrder":2},

  {"sentenceId":"s2","slot":"O1","subslotId":"","phraseText":"This book","displayOrder":1},
  {"sentenceId":"s2","slot":"S","subslotId":"","phraseText":"I","displayOrder":2},
  {"sentenceId":"s2","slot":"V","subslotId":"","phraseText":"like","displayOrder":3},

  {"sentenceId":"s3","slot":"M1","subslotId":"","phraseText":"when she came home","glossText":"彼女が帰宅したとき","displayOrder":1},
  {"sentenceId":"s3","slot":"M1","subslotId":"M1","phraseText":"when","displayOrder":1,"subslotDisplayOrder":1},
  {"sentenceId":"s3","slot":"M1","subslotId":"S","phraseText":"she","displayOrder":1,"subslotDisplayOrder":2},
  {"sentenceId":"s3","slot":"M1","subslotId":"V","phraseText":"came","displayOrder":1,"subslotDisplayOrder":3},
  {"sentenceId":"s3","slot":"M1","subslotId":"O1","phraseText":"home","displayOrder":1,"subslotDisplayOrder":4},
  {"sentenceId":"s3","slot":"S","subslotId":"","phraseText":"I","displayOrder":2},
  {"sentenceId":"s3","slot":"Aux","subslotId":"","phraseText":"was","displayOrder":3},
  {"sentenceId":"s3","slot":"V","subslotId":"","phraseText":"sleeping","displayOrder":4},
  {"sentenceId":"s3","slot":"O1","subslotId":"","phraseText":"that it was late","displayOrder":5},
  {"sentenceId":"s3","slot":"O1","subslotId":"S","phraseText":"it","displayOrder":5,"subslotDisplayOrder":2},
  {"sentenceId":"s3","slot":"O1","subslotId":"V","phraseText":"was","displayOrder":5,"subslotDisplayOrder":3},
  {"sentenceId":"s3","slot":"O1","subslotId":"C1","phraseText":"late","displayOrder":5,"subslotDisplayOrder":4},

  {"sentenceId":"s4","slot":"O1","subslotId":"","phraseText":"What","displayOrder":1,"isTopOfSentenceDisplay":true},
  {"sentenceId":"s4","slot":"Aux","subslotId":"","phraseText":"did","displayOrder":2},
  {"sentenceId":"s4","slot":"S","subslotId":"","phraseText":"you","displayOrder":3},
  {"sentenceId":"s4","slot":"V","subslotId":"","phraseText":"buy","displayOrder":4}
]"#;

pub fn rows() -> Vec<Row> {
    ExampleStore::parse_rows(PRESET, "fixture").unwrap()
}

pub fn store() -> ExampleStore {
    ExampleStore::from_rows("fixture", rows())
}

/// A session over [`PRESET`] with a manual clock starting at 0.
pub fn session() -> (Session, Rc<ManualClock>) {
    session_with(VisibilityStore::in_memory())
}

pub fn session_with(vis: VisibilityStore) -> (Session, Rc<ManualClock>) {
    let clock = Rc::new(ManualClock::new(0));
    let doc = build_default_document().unwrap();
    let mut session = Session::new(EngineConfig::default(), doc, vis, clock.clone()).with_seed(7);
    let mut source = MemSource::new().with_file("fixture.json", PRESET);
    session
        .load_preset("fixture", &mut source, Utf8Path::new("fixture.json"))
        .unwrap();
    (session, clock)
}

/// `data-slot` of every rendered top-level slot, in layout order.
pub fn visible_slots(doc: &Document) -> Vec<String> {
    let row = doc.find(naming::SLOT_ROW_ID).unwrap();
    let mut items: Vec<(i64, usize, String)> = doc
        .children(row)
        .iter()
        .enumerate()
        .filter(|(_, c)| doc.has_class(**c, naming::SLOT_CLASS) && doc.is_rendered(**c))
        .map(|(i, &c)| {
            let order = doc.style(c, "order").and_then(|o| o.parse().ok()).unwrap_or(0);
            let name = doc.get(c).attr("data-slot").unwrap_or_default().to_string();
            (order, i, name)
        })
        .collect();
    items.sort();
    items.into_iter().map(|(_, _, n)| n).collect()
}

/// Does the channel element of `container_id` carry its hidden class?
pub fn channel_hidden(doc: &Document, container_id: &str, channel: Channel) -> bool {
    let part = doc.find(&naming::channel_part_id(container_id, channel)).unwrap();
    doc.has_class(part, naming::hidden_class(channel))
}

pub fn text_of(doc: &Document, container_id: &str, channel: Channel) -> String {
    let part = doc.find(&naming::channel_part_id(container_id, channel)).unwrap();
    doc.get(part).text.clone()
}
