//! Configuration section definitions.
//!
//! Each module corresponds to a section in `livebundle.toml`:
//!
//! | Module     | TOML Section   | Purpose                                   |
//! |------------|----------------|-------------------------------------------|
//! | `project`  | `[project]`    | Name, entry point, version                |
//! | `build`    | `[build]`      | Output paths, minify, refresh policy      |
//! | `bundler`  | `[bundler]`    | esbuild / sass commands, targets, globals |
//! | `serve`    | `[serve]`      | Reload server and file watching           |

mod build;
mod bundler;
mod project;
mod serve;

pub use build::BuildSectionConfig;
pub use bundler::BundlerConfig;
pub use project::ProjectConfig;
pub use serve::ServeConfig;
