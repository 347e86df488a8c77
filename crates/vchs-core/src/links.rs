// ── Link navigation ──
//
// Resolves typed relations out of link collections already fetched from
// the server. First match in document order wins; later matches are never
// looked at, so resolution is deterministic for a given document.

use vchs_api::types::{Link, QueryRecord, Reference, VdcRef, Vm};

use crate::error::CoreError;

/// How a link is picked out of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMatch<'a> {
    /// `rel` equals the value, ignoring ASCII case.
    Rel(&'a str),
    /// `type` contains the value.
    TypeContains(&'a str),
    /// `name` equals the value, ignoring ASCII case.
    Name(&'a str),
}

impl LinkMatch<'_> {
    pub fn matches(&self, link: &Link) -> bool {
        match *self {
            Self::Rel(rel) => link
                .rel
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case(rel)),
            Self::TypeContains(fragment) => link
                .media_type
                .as_deref()
                .is_some_and(|t| t.contains(fragment)),
            Self::Name(name) => link
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Rel(rel) => format!("link rel=\"{rel}\""),
            Self::TypeContains(fragment) => format!("link of type *{fragment}*"),
            Self::Name(name) => format!("link named \"{name}\""),
        }
    }
}

/// The first link in `links` satisfying `wanted`.
///
/// `context` names the resource that owns the links (usually its href) and
/// ends up in the `NotFound` error.
pub fn find_link<'l>(
    links: &'l [Link],
    wanted: LinkMatch<'_>,
    context: &str,
) -> Result<&'l Link, CoreError> {
    links
        .iter()
        .find(|link| wanted.matches(link))
        .ok_or_else(|| CoreError::not_found(wanted.describe(), context))
}

// ── Named resources ──────────────────────────────────────────────────

/// A remote entity with a display name.
pub trait Named {
    fn display_name(&self) -> Option<&str>;
}

impl Named for Reference {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Named for QueryRecord {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Named for VdcRef {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Named for Vm {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

fn has_name<T: Named>(item: &T, name: &str) -> bool {
    item.display_name()
        .is_some_and(|n| n.eq_ignore_ascii_case(name))
}

/// The first item whose name equals `name`, ignoring ASCII case.
pub fn find_named<'a, T: Named>(
    items: &'a [T],
    name: &str,
    what: &str,
    context: &str,
) -> Result<&'a T, CoreError> {
    items
        .iter()
        .find(|item| has_name(*item, name))
        .ok_or_else(|| CoreError::not_found(format!("{what} \"{name}\""), context))
}

/// The only item in `items`; zero or several is `Ambiguous`.
pub fn exactly_one<'a, T>(items: &'a [T], what: &str, name: &str) -> Result<&'a T, CoreError> {
    match items {
        [only] => Ok(only),
        _ => Err(CoreError::Ambiguous {
            what: what.into(),
            name: name.into(),
            count: items.len(),
        }),
    }
}
