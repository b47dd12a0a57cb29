pub mod intent;
pub mod models;
pub mod profile;
pub mod render;
pub mod responder;

pub use intent::{classify_intent, normalize_text, IntentRule, IntentScore};
pub use models::*;
pub use profile::{builtin_profile, load_profile, resolve_profile, ProfileError};
pub use render::{
    contains_link, detect_links, render_hint, segments, typewriter_frames, LinkSpan, Segment,
};
pub use responder::{
    FixedRandom, RandomSource, Responder, ThreadRandom, FALLBACK_REPLY, GREETING_REPLY, JOKES,
};
