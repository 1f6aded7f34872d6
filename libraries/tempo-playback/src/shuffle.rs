//! Shuffle selection
//!
//! Shuffle is a uniform random pick from the active context on every advance
//! (sampling with replacement). There is no shuffled order to maintain, so
//! toggling shuffle never reorders anything.

use rand::seq::SliceRandom;
use rand::Rng;
use tempo_core::Track;

/// Pick a random track using the thread-local generator
pub fn pick_random(tracks: &[Track]) -> Option<&Track> {
    pick_with(tracks, &mut rand::thread_rng())
}

/// Pick a random track with a caller-supplied generator
pub fn pick_with<'a, R: Rng + ?Sized>(tracks: &'a [Track], rng: &mut R) -> Option<&'a Track> {
    tracks.choose(rng)
}
