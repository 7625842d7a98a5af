use anyhow::Result;
use minijinja::Environment;
use rayon::iter::{IntoParallelRefIterator, IntoParallelRefMutIterator, ParallelIterator};
use std::path::Path;

use crate::context::Context;

mod entry;
mod folio;
mod site;

pub use self::folio::Folio;
pub use entry::{Collection, ContentEntry, Frontmatter};
pub use site::{Menu, Site};

/// A trait represents an entity of the folio site.
///
/// An entity goes through two stages:
/// - **parse**, the entity resolves its attributes, such as slugs and fallbacks.
/// - **render**, the entity renders itself into html files.
///
/// [`Entity`] have default empty implementations for both methods.
#[allow(unused_variables)]
pub trait Entity {
    fn parse(&mut self, source: &Path) -> Result<()> {
        Ok(())
    }

    fn render(&self, env: &Environment, context: Context, dest: &Path) -> Result<()> {
        Ok(())
    }
}

impl<T: Entity + Sync + Send> Entity for Vec<T> {
    fn parse(&mut self, source: &Path) -> Result<()> {
        self.par_iter_mut().try_for_each(|item| item.parse(source))
    }

    fn render(&self, env: &Environment, context: Context, dest: &Path) -> Result<()> {
        self.par_iter()
            .try_for_each(|item| item.render(env, context.clone(), dest))
    }
}
