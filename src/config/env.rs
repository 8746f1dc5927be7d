//! # Environment Variable Utilities
//!
//! Boolean flag parsing shared by the configuration loaders.
//!
//! # Examples
//! ```rust
//! use orgnk_imageresize::config::env::read_flag_from;
//!
//! assert!(read_flag_from(|_| Some("yes".into()), "SERVE_RESIZED", false));
//! assert!(!read_flag_from(|_| None, "SERVE_RESIZED", false));
//! ```

/// Reads a boolean flag through `provider`.
///
/// `"1"`, `"true"`, `"yes"` and `"on"` are truthy (case-insensitive, quotes
/// stripped); any other present value is falsy.
pub fn read_flag_from<F>(provider: F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match provider(name) {
        Some(v) => {
            let s = v.trim().trim_matches(|c| c == '"' || c == '\'');
            matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        }
        None => default,
    }
}
