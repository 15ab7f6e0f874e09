//! # Bakehouse
//!
//! A static site builder. Pages are markdown or HTML files with optional YAML
//! front matter, rendered through Handlebars layouts; images get thumbnails;
//! assets are mirrored. Where a file sits in the source tree decides where it
//! lands in the output and which listing it belongs to.
//!
//! # Build Pipeline
//!
//! One build runs a fixed sequence of phases over a fresh [`site::Site`]:
//!
//! ```text
//! Reset → Scan → Index → Paginate → BuildMedia → BuildStatic
//!       → IndexMedia → RenderAll → WriteAll
//! ```
//!
//! Pages are kept in reverse discovery order, so a directory's contents
//! render before the pages above it and a listing can embed its children's
//! rendered content.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resource`] | Source → destination mapping and hierarchy keys (`belongs_to`) |
//! | [`loader`] | Front matter / body split |
//! | [`context`] | Typed key/value context handed to templates |
//! | [`page`] | Page resources: two-stage render and write-out |
//! | [`media`] | Media resources and their thumbnails |
//! | [`tree`] | Directory-shaped index over resources (`site.articles`, `site.media`) |
//! | [`pager`] | Page boundaries and synthesized listing pages |
//! | [`site`] | Phase orchestration and build events |
//! | [`monitor`] | Polling change detection driving rebuilds |
//! | [`config`] | `config.yaml` loading, validation and defaults |
//! | [`templates`] | Handlebars layouts and partials |
//! | [`markup`] | Markdown conversion and typographic cleanup |
//! | [`imaging`] | Thumbnail backend over the `image` crate |
//! | [`assets`] | Asset mirroring and CSS/JS minification |
//! | [`slug`] | ASCII slugs for generated file names |
//! | [`serve`] | Development file server |
//! | [`bootstrap`] | Directory scaffolding |
//! | [`output`] | CLI status lines |

pub mod assets;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod imaging;
pub mod loader;
pub mod markup;
pub mod media;
pub mod monitor;
pub mod output;
pub mod page;
pub mod pager;
pub mod resource;
pub mod serve;
pub mod site;
pub mod slug;
pub mod templates;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
