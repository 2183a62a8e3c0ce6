//! Random implementation of the `SlugSource` port.

use crate::application::ports::SlugSource;
use crate::domain::generate_identifier;

/// Draws identifiers from the thread-local random generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSlugs;

impl SlugSource for RandomSlugs {
    fn next_slug(&self) -> String {
        generate_identifier(&mut rand::rng())
    }
}
