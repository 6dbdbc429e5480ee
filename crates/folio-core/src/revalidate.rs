//! Cache revalidation for the public site.
//!
//! The frontend caches rendered pages by path and by tag. After a write the
//! store reports which paths and tags went stale; the frontend framework
//! performs the actual invalidation.

use serde::Serialize;
use tracing::info;

use crate::record::Record;

/// Paths and tags made stale by a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Revalidation {
  pub paths: Vec<String>,
  pub tags:  Vec<String>,
}

impl Revalidation {
  pub fn for_record(record: &Record) -> Self {
    let collection = record.collection.as_str();
    let mut paths = Vec::new();

    if let Some(slug) = record.slug() {
      match collection {
        "pages" if slug == "home" => paths.push("/".to_owned()),
        "pages" => paths.push(format!("/{slug}")),
        "posts" | "products" | "projects" | "services" | "events" => {
          paths.push(format!("/{collection}/{slug}"));
          paths.push(format!("/{collection}"));
        }
        _ => {}
      }
    }

    Self { paths, tags: vec![format!("{collection}-sitemap")] }
  }
}

pub trait Revalidator: Send + Sync {
  fn revalidate(&self, revalidation: &Revalidation);
}

/// Emits each stale path and tag as a log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRevalidator;

impl Revalidator for TracingRevalidator {
  fn revalidate(&self, revalidation: &Revalidation) {
    for path in &revalidation.paths {
      info!(%path, "revalidating path");
    }
    for tag in &revalidation.tags {
      info!(%tag, "revalidating tag");
    }
  }
}
