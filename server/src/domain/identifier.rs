//! Human-readable deployment identifiers such as `brave-amber-falcon`.

use rand::Rng;
use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "bold", "brave", "bright", "calm", "clever", "cosmic", "crimson", "curly",
    "daring", "eager", "early", "fancy", "fluffy", "gentle", "giant", "golden", "happy", "hidden",
    "icy", "jolly", "kind", "lively", "lucky", "mellow", "misty", "noble", "odd", "polite",
    "proud", "quick", "quiet", "rapid", "rustic", "shiny", "silent", "silver", "smooth", "snowy",
    "sunny", "swift", "tidy", "tiny", "velvet", "vivid", "wild", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "apple", "badger", "beacon", "breeze", "canyon", "cactus", "comet", "coral", "crane", "delta",
    "dragon", "ember", "falcon", "fern", "forest", "galaxy", "glacier", "harbor", "heron", "island",
    "jungle", "lagoon", "lantern", "lynx", "maple", "meadow", "meteor", "nebula", "ocean", "orchid",
    "otter", "panda", "pebble", "pine", "planet", "prairie", "puffin", "quartz", "raven", "reef",
    "river", "rocket", "sparrow", "summit", "thunder", "tiger", "tulip", "valley", "walrus", "willow",
];

/// Generate an identifier of the form `<adjective>-<adjective>-<noun>`.
pub fn generate_identifier<R: Rng + ?Sized>(rng: &mut R) -> String {
    let pick = |words: &[&'static str], rng: &mut R| words.choose(rng).copied().unwrap_or("nova");
    let first = pick(ADJECTIVES, rng);
    let second = pick(ADJECTIVES, rng);
    let noun = pick(NOUNS, rng);
    format!("{first}-{second}-{noun}")
}

/// Whether `id` has the shape produced by [`generate_identifier`].
#[must_use]
pub fn is_valid_identifier(id: &str) -> bool {
    let parts: Vec<&str> = id.split('-').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
}
