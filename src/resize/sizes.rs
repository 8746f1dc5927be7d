//! # Size Registry
//!
//! Named image sizes supplied at startup (`thumbnail`, `hero`, ...) plus an
//! ordered list of hooks that may adjust a size's options before the
//! immutable [`Descriptor`](crate::resize::descriptor::Descriptor) is built.
//!
//! Sizes are read from `IMAGE_SIZES` as a JSON object; declaration order is
//! preserved:
//!
//! ```text
//! IMAGE_SIZES={"thumb":{"width":150,"height":150,"mode":"crop"},"wide":{"width":1200}}
//! ```
//!
//! # Example
//! ```
//! use orgnk_imageresize::resize::sizes::{SizeRegistry, SizeSpec};
//!
//! let mut sizes = SizeRegistry::default();
//! sizes.register("thumb", SizeSpec::new(150, 150));
//! sizes.add_hook(|name, opts| if name == "thumb" { opts.sharpen = 10 });
//!
//! let (spec, opts) = sizes.resolve("thumb").unwrap();
//! assert_eq!((spec.width, spec.height), (150, 150));
//! assert_eq!(opts.sharpen, 10);
//! ```

use std::{env, fmt, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::resize::ResizeError;
use crate::resize::descriptor::ResizeOptions;

/// Target box and options of a named size.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeSpec {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Materialize with a fixed-offset crop instead of a resize.
    #[serde(default)]
    pub crop: bool,
    #[serde(flatten)]
    pub options: ResizeOptions,
}

impl SizeSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: ResizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cropped(mut self) -> Self {
        self.crop = true;
        self
    }
}

/// Adjusts the options of a size, by name, before a descriptor is built.
pub type OptionsHook = Arc<dyn Fn(&str, &mut ResizeOptions) + Send + Sync>;

#[derive(Clone, Default)]
pub struct SizeRegistry {
    sizes: IndexMap<String, SizeSpec>,
    hooks: Vec<OptionsHook>,
}

impl fmt::Debug for SizeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeRegistry")
            .field("sizes", &self.sizes)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl SizeRegistry {
    pub fn from_env() -> Self {
        Self::from_env_with(|k| env::var(k).ok())
    }

    /// Reads `IMAGE_SIZES`. Malformed JSON is logged and ignored.
    pub fn from_env_with<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let sizes = match get("IMAGE_SIZES").filter(|s| !s.trim().is_empty()) {
            Some(raw) => serde_json::from_str::<IndexMap<String, SizeSpec>>(&raw)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "ignoring malformed IMAGE_SIZES");
                    IndexMap::new()
                }),
            None => IndexMap::new(),
        };
        Self {
            sizes,
            hooks: Vec::new(),
        }
    }

    /// Adds or replaces a size. Replacing keeps the original position.
    pub fn register(&mut self, name: impl Into<String>, spec: SizeSpec) {
        self.sizes.insert(name.into(), spec);
    }

    /// Appends a hook; hooks run in registration order.
    pub fn add_hook<F>(&mut self, hook: F)
    where
        F: Fn(&str, &mut ResizeOptions) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    pub fn get(&self, name: &str) -> Option<&SizeSpec> {
        self.sizes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sizes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// The size's spec and its options after every hook has run.
    pub fn resolve(&self, name: &str) -> Result<(&SizeSpec, ResizeOptions), ResizeError> {
        let spec = self
            .get(name)
            .ok_or_else(|| ResizeError::UnknownSize(name.to_string()))?;
        let mut options = spec.options.clone();
        for hook in &self.hooks {
            hook(name, &mut options);
        }
        Ok((spec, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resize::descriptor::{Extension, ResizeMode};

    #[test]
    fn parses_ordered_sizes_from_env() {
        let json = r#"{"wide":{"width":1200},"thumb":{"width":150,"height":150,"mode":"crop","extension":"webp"},"square":{"width":300,"height":300,"crop":true}}"#;
        let reg = SizeRegistry::from_env_with(|k| (k == "IMAGE_SIZES").then(|| json.to_string()));

        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["wide", "thumb", "square"]);

        let wide = reg.get("wide").unwrap();
        assert_eq!((wide.width, wide.height), (1200, 0));
        assert_eq!(wide.options, ResizeOptions::default());

        let thumb = reg.get("thumb").unwrap();
        assert_eq!(thumb.options.mode, ResizeMode::Crop);
        assert_eq!(thumb.options.extension, Some(Extension::Webp));
        assert!(!thumb.crop);

        assert!(reg.get("square").unwrap().crop);
    }

    #[test]
    fn malformed_json_yields_empty_registry() {
        let reg = SizeRegistry::from_env_with(|_| Some("{oops".into()));
        assert!(reg.is_empty());
        assert!(SizeRegistry::from_env_with(|_| None).is_empty());
    }

    #[test]
    fn register_replaces_in_place() {
        let mut reg = SizeRegistry::default();
        reg.register("a", SizeSpec::new(1, 1));
        reg.register("b", SizeSpec::new(2, 2));
        reg.register("a", SizeSpec::new(3, 3));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(reg.get("a").unwrap().width, 3);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn hooks_run_in_registration_order_and_see_the_name() {
        let mut reg = SizeRegistry::default();
        reg.register("thumb", SizeSpec::new(150, 150));
        reg.register("hero", SizeSpec::new(1600, 0));
        reg.add_hook(|_, o| o.quality = 70);
        reg.add_hook(|name, o| {
            if name == "hero" {
                o.quality += 10;
            }
        });

        assert_eq!(reg.resolve("thumb").unwrap().1.quality, 70);
        assert_eq!(reg.resolve("hero").unwrap().1.quality, 80);
        // the registered spec itself is untouched
        assert_eq!(reg.get("hero").unwrap().options.quality, 90);
    }

    #[test]
    fn unknown_size_is_an_error() {
        let reg = SizeRegistry::default();
        assert!(matches!(reg.resolve("nope"), Err(ResizeError::UnknownSize(n)) if n == "nope"));
    }
}
