//! Parents of attribute lists: shared templates and lists of other items

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::attribute::Attribute;
use super::list::{AttributeList, EntryKind};
use super::registry;
use crate::errors::ModelError;

/// A list shared between its owning item and the lists inheriting from it
pub type SharedList = Rc<RefCell<AttributeList>>;

/// Immutable attribute list shared as a default-value parent.
///
/// Only read access is exposed; descendants copy on write.
#[derive(Clone)]
pub struct Template {
    name: Rc<str>,
    list: Rc<AttributeList>,
}

impl Template {
    pub fn new(name: &str, list: AttributeList) -> Self {
        Template {
            name: Rc::from(name),
            list: Rc::new(list),
        }
    }

    /// Registry name, persisted as `tl:<name>`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn list(&self) -> &AttributeList {
        &self.list
    }

    pub fn ptr_eq(&self, other: &Template) -> bool {
        Rc::ptr_eq(&self.list, &other.list)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("entries", &self.list.len())
            .finish()
    }
}

#[derive(Clone)]
enum Source {
    Template(Template),
    Shared {
        list: SharedList,
        reference: Option<ParentRef>,
    },
}

/// Where an attribute list falls back to for values it does not hold.
///
/// `path` selects a nested list below the source; it is non-empty for
/// nested lists materialized from an inherited one.
#[derive(Clone)]
pub struct Parent {
    source: Source,
    path: Vec<String>,
}

impl Parent {
    pub fn template(template: Template) -> Self {
        Parent {
            source: Source::Template(template),
            path: Vec::new(),
        }
    }

    /// Another item's list, not persisted as a reference
    pub fn shared(list: SharedList) -> Self {
        Parent {
            source: Source::Shared { list, reference: None },
            path: Vec::new(),
        }
    }

    /// Another item's list, persisted as `reference`
    pub fn shared_ref(list: SharedList, reference: ParentRef) -> Self {
        Parent {
            source: Source::Shared {
                list,
                reference: Some(reference),
            },
            path: Vec::new(),
        }
    }

    pub(crate) fn nested(&self, name: &str) -> Parent {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Parent {
            source: self.source.clone(),
            path,
        }
    }

    pub fn template_name(&self) -> Option<&str> {
        match &self.source {
            Source::Template(t) => Some(t.name()),
            Source::Shared { .. } => None,
        }
    }

    /// Persistable form; nested parents are implied by their enclosing list
    pub fn reference(&self) -> Option<ParentRef> {
        if !self.path.is_empty() {
            return None;
        }
        match &self.source {
            Source::Template(t) => Some(ParentRef::Template(t.name().to_string())),
            Source::Shared { reference, .. } => reference.clone(),
        }
    }

    fn with_root<R>(&self, f: impl FnOnce(&AttributeList, &[String]) -> R) -> R {
        match &self.source {
            Source::Template(t) => f(t.list(), &self.path),
            Source::Shared { list, .. } => f(&list.borrow(), &self.path),
        }
    }

    fn joined(base: &[String], extra: &[String]) -> Vec<String> {
        base.iter().chain(extra).cloned().collect()
    }

    pub(crate) fn lookup(&self, extra: &[String], name: &str) -> Option<Attribute> {
        self.with_root(|root, path| root.lookup_at(&Self::joined(path, extra), name))
    }

    pub(crate) fn kind(&self, extra: &[String], name: &str) -> Option<EntryKind> {
        self.with_root(|root, path| root.kind_at(&Self::joined(path, extra), name))
    }

    pub(crate) fn flatten(&self, extra: &[String]) -> Option<AttributeList> {
        self.with_root(|root, path| root.flat_at(&Self::joined(path, extra)))
    }
}

impl PartialEq for Parent {
    fn eq(&self, other: &Self) -> bool {
        let same_source = match (&self.source, &other.source) {
            (Source::Template(a), Source::Template(b)) => a.ptr_eq(b),
            (Source::Shared { list: a, .. }, Source::Shared { list: b, .. }) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_source && self.path == other.path
    }
}

impl fmt::Debug for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Parent");
        match &self.source {
            Source::Template(t) => d.field("template", &t.name()),
            Source::Shared { reference, .. } => d.field("shared", reference),
        };
        d.field("path", &self.path).finish()
    }
}

/// Persisted parent reference: `tl:<template>` or `(<item id>):<path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Template(String),
    Item { id: u64, path: String },
}

impl FromStr for ParentRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidParentRef { text: s.to_string() };
        if let Some(name) = s.strip_prefix("tl:") {
            return if name.is_empty() {
                Err(invalid())
            } else {
                Ok(ParentRef::Template(name.to_string()))
            };
        }
        let rest = s.strip_prefix('(').ok_or_else(invalid)?;
        let (id, path) = rest.split_once("):").ok_or_else(invalid)?;
        let id = id.trim().parse().map_err(|_| invalid())?;
        if path.is_empty() {
            return Err(invalid());
        }
        Ok(ParentRef::Item {
            id,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Template(name) => write!(f, "tl:{name}"),
            ParentRef::Item { id, path } => write!(f, "({id}):{path}"),
        }
    }
}

/// Turns persisted parent references back into parents
pub trait ParentResolver {
    /// List at `path` of item `id`
    fn resolve_item(&self, _id: u64, _path: &str) -> Option<SharedList> {
        None
    }

    fn resolve(&self, reference: &ParentRef) -> Option<Parent> {
        match reference {
            ParentRef::Template(name) => registry::template(name).map(Parent::template),
            ParentRef::Item { id, path } => self
                .resolve_item(*id, path)
                .map(|list| Parent::shared_ref(list, reference.clone())),
        }
    }
}

/// Resolves template references only
#[derive(Debug, Clone, Copy, Default)]
pub struct Templates;

impl ParentResolver for Templates {}

/// Lists of other items addressable by `(id):path`
#[derive(Debug, Default)]
pub struct ListTable {
    lists: HashMap<(u64, String), SharedList>,
}

impl ListTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u64, path: impl Into<String>, list: SharedList) {
        self.lists.insert((id, path.into()), list);
    }

    pub fn get(&self, id: u64, path: &str) -> Option<&SharedList> {
        self.lists.get(&(id, path.to_string()))
    }
}

impl ParentResolver for ListTable {
    fn resolve_item(&self, id: u64, path: &str) -> Option<SharedList> {
        self.get(id, path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_references() {
        assert_eq!("tl:FormatAttributes".parse(), Ok(ParentRef::Template("FormatAttributes".into())));
        assert_eq!(
            "(42):format:line".parse(),
            Ok(ParentRef::Item {
                id: 42,
                path: "format:line".into()
            })
        );
        for bad in ["tl:", "42:format", "(x):format", "(3):", "format"] {
            assert!(bad.parse::<ParentRef>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["tl:ItemAttributes", "(7):textformat"] {
            assert_eq!(text.parse::<ParentRef>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn list_table_resolves_items() {
        let shared: SharedList = Rc::new(RefCell::new(AttributeList::new("format")));
        let mut table = ListTable::new();
        table.insert(7, "format", shared.clone());

        let reference = ParentRef::Item {
            id: 7,
            path: "format".into(),
        };
        let parent = table.resolve(&reference).unwrap();
        assert_eq!(parent, Parent::shared(shared));
        assert_eq!(parent.reference(), Some(reference));
        assert!(table.resolve(&ParentRef::Item { id: 8, path: "format".into() }).is_none());
    }
}
