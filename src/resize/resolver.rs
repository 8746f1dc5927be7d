//! # Variant Resolver
//!
//! Maps a [`Descriptor`] to the single canonical file and URL its output
//! must occupy, and answers the idempotency question "is it already there?".
//!
//! Variant files are named `{source stem}_resized_{key}.{extension}`, where
//! `key` is the MAC of the descriptor's canonical serialization. Two different
//! descriptors never share a path, and identical descriptors always converge
//! on the same one.

use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::resize::ResizeConfig;
use crate::resize::descriptor::Descriptor;
use crate::resize::signer::IdentifierSigner;

/// Characters escaped in the final URL segment. `%` is left alone so
/// already-encoded names are not encoded twice.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

#[derive(Clone)]
pub struct VariantResolver {
    signer: IdentifierSigner,
    resized_dir: PathBuf,
    resized_base_url: String,
}

impl VariantResolver {
    pub fn new(signer: IdentifierSigner, cfg: &ResizeConfig) -> Self {
        Self {
            signer,
            resized_dir: cfg.resized_dir.clone(),
            resized_base_url: cfg.resized_base_url(),
        }
    }

    pub fn resized_dir(&self) -> &Path {
        &self.resized_dir
    }

    /// MAC binding the descriptor to its file name.
    pub fn variant_key(&self, d: &Descriptor) -> String {
        self.signer.sign(&d.canonical_message())
    }

    pub fn file_name(&self, d: &Descriptor) -> String {
        format!(
            "{}_resized_{}.{}",
            d.source_stem(),
            self.variant_key(d),
            d.extension()
        )
    }

    pub fn canonical_path(&self, d: &Descriptor) -> PathBuf {
        self.resized_dir.join(self.file_name(d))
    }

    pub fn canonical_url(&self, d: &Descriptor) -> String {
        let name = utf8_percent_encode(&self.file_name(d), SEGMENT).to_string();
        format!("{}/{}", self.resized_base_url, name)
    }

    /// Identifier carried by the signed URL: the MAC of the canonical URL.
    pub fn url_identifier(&self, d: &Descriptor) -> String {
        self.signer.sign(&self.canonical_url(d))
    }

    pub fn signer(&self) -> &IdentifierSigner {
        &self.signer
    }

    /// The sole idempotency gate: a regular file with an extension at the canonical path.
    pub fn is_materialized(&self, d: &Descriptor) -> bool {
        is_published_file(&self.canonical_path(d))
    }

    /// Local path behind a canonical variant URL, if the URL is one of ours.
    ///
    /// Rejects anything that would step out of the resized directory.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let rest = url
            .strip_prefix(&self.resized_base_url)?
            .strip_prefix('/')?;
        let name = percent_decode_str(rest).decode_utf8().ok()?;
        if name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\')
        {
            return None;
        }
        Some(self.resized_dir.join(name.as_ref()))
    }

    pub fn is_url_materialized(&self, url: &str) -> bool {
        self.path_for_url(url)
            .is_some_and(|p| is_published_file(&p))
    }
}

fn is_published_file(path: &Path) -> bool {
    path.extension().is_some_and(|e| !e.is_empty()) && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::signing::SigningConfig;
    use crate::resize::descriptor::{Extension, ResizeOptions};

    fn resolver(dir: &Path) -> VariantResolver {
        let mut cfg = ResizeConfig::from_env_with(|_| None);
        cfg.content_base_url = "https://cdn.example.com".into();
        cfg.resized_dir = dir.to_path_buf();
        VariantResolver::new(
            IdentifierSigner::new(&SigningConfig::from_secret("resolver")),
            &cfg,
        )
    }

    fn descriptor(name: &str) -> Descriptor {
        Descriptor::new(name, 42, 200, 100, ResizeOptions::default()).unwrap()
    }

    #[test]
    fn canonical_path_and_url_agree_on_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());
        let d = descriptor("/uploads/a.jpg");

        let path = r.canonical_path(&d);
        let url = r.canonical_url(&d);
        let name = r.file_name(&d);

        assert!(name.starts_with("a_resized_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(path, dir.path().join(&name));
        assert_eq!(url, format!("https://cdn.example.com/resized-uploads/{name}"));
        assert_eq!(r.path_for_url(&url), Some(path));
    }

    #[test]
    fn derivation_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let d = descriptor("/uploads/a.jpg");
        assert_eq!(resolver(dir.path()).canonical_url(&d), resolver(dir.path()).canonical_url(&d));
    }

    #[test]
    fn different_descriptors_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());
        let a = descriptor("/uploads/a.jpg");
        let b = Descriptor::new(
            "/uploads/a.jpg",
            42,
            200,
            100,
            ResizeOptions::default().with_extension(Extension::Jpg).with_quality(80),
        )
        .unwrap();
        assert_ne!(r.canonical_path(&a), r.canonical_path(&b));
    }

    #[test]
    fn only_final_segment_is_encoded_and_existing_escapes_survive() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());

        let spaced = r.canonical_url(&descriptor("/uploads/my photo.jpg"));
        assert!(spaced.starts_with("https://cdn.example.com/resized-uploads/my%20photo_resized_"));

        let pre = r.canonical_url(&descriptor("/uploads/my%20photo.jpg"));
        assert!(pre.contains("/my%20photo_resized_"));
        assert!(!pre.contains("%2520"));
    }

    #[test]
    fn is_materialized_tracks_file_existence() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());
        let d = descriptor("/uploads/a.jpg");

        assert!(!r.is_materialized(&d));
        std::fs::write(r.canonical_path(&d), b"img").unwrap();
        assert!(r.is_materialized(&d));
        assert!(r.is_url_materialized(&r.canonical_url(&d)));
    }

    #[test]
    fn directory_at_canonical_path_is_not_materialized() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());
        let d = descriptor("/uploads/a.jpg");
        std::fs::create_dir_all(r.canonical_path(&d)).unwrap();
        assert!(!r.is_materialized(&d));
    }

    #[test]
    fn path_for_url_rejects_foreign_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(dir.path());
        assert!(r.path_for_url("https://evil.example.com/resized-uploads/a.jpg").is_none());
        assert!(r.path_for_url("https://cdn.example.com/resized-uploads/..%2Fetc%2Fpasswd").is_none());
        assert!(r.path_for_url("https://cdn.example.com/resized-uploads/").is_none());
        assert!(r.path_for_url("https://cdn.example.com/resized-uploads/sub/a.jpg").is_none());
    }
}
