//! Reload eligibility
//!
//! Decides, from the type name alone, whether a type belongs to the
//! reloadable tier or to the host's stable tier.

use hotframe_kernel::config::ReloadConfig;
use hotframe_kernel::reload::{NESTED_SEPARATOR, SEGMENT_SEPARATOR};

/// Resolution tier chosen for a type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Reloadable,
    Stable,
}

/// Prefix-based reload policy
///
/// Prefixes are matched on whole dot-separated segments: prefix `com.app`
/// covers `com.app.News` but not `com.appfoo.News`. An exception prefix also
/// covers nested types of the excepted name (`com.app.Kernel$Inner` for
/// exception `com.app.Kernel`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadPolicy {
    reloadable: Vec<String>,
    exceptions: Vec<String>,
}

impl ReloadPolicy {
    pub fn new<R, E>(reloadable: R, exceptions: E) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            reloadable: reloadable.into_iter().map(Into::into).collect(),
            exceptions: exceptions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &ReloadConfig) -> Self {
        Self::new(
            config.reloadable_prefixes.iter().cloned(),
            config.exception_prefixes.iter().cloned(),
        )
    }

    pub fn reloadable_prefixes(&self) -> &[String] {
        &self.reloadable
    }

    pub fn exception_prefixes(&self) -> &[String] {
        &self.exceptions
    }

    /// `true` iff `name` is under some reloadable prefix and under no
    /// exception prefix.
    pub fn is_reloadable(&self, name: &str) -> bool {
        let in_reloadable = self
            .reloadable
            .iter()
            .any(|prefix| starts_with_segment(name, prefix, SEGMENT_SEPARATOR));

        in_reloadable
            && !self.exceptions.iter().any(|exception| {
                starts_with_segment(name, exception, SEGMENT_SEPARATOR)
                    || starts_with_segment(name, exception, NESTED_SEPARATOR)
            })
    }

    pub fn tier(&self, name: &str) -> Tier {
        if self.is_reloadable(name) {
            Tier::Reloadable
        } else {
            Tier::Stable
        }
    }
}

/// `name + sep` starts with `prefix + sep`, without allocating.
fn starts_with_segment(name: &str, prefix: &str, sep: char) -> bool {
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(sep),
        None => false,
    }
}
