//! Attribute lists with parent fallback and copy-on-write

use std::borrow::Cow;
use std::collections::BTreeMap;

use super::PATH_DELIMITER;
use super::attribute::{Attribute, AttributeRef};
use super::parent::{Parent, ParentRef, ParentResolver, Template};
use super::registry;
use crate::errors::ModelError;
use crate::formula::{Expression, Value};
use crate::log::{debug, warn};
use crate::persist::{Reader, Writer};

/// A list member: a single attribute or a nested list
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Attribute(Attribute),
    List(AttributeList),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Attribute,
    List,
}

impl Entry {
    fn kind(&self) -> EntryKind {
        match self {
            Entry::Attribute(_) => EntryKind::Attribute,
            Entry::List(_) => EntryKind::List,
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{PATH_DELIMITER}{name}")
    }
}

/// Named attributes and nested lists, falling back to a parent.
///
/// Only values that differ from the parent live in the list itself; lookups
/// that miss locally are answered by the parent chain and the answer is
/// adopted by this list. Writes to an inherited attribute copy it into this
/// list first, so parents and templates are never modified by a descendant.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeList {
    name: String,
    path: String,
    display_name: Option<String>,
    class: Option<String>,
    entries: BTreeMap<String, Entry>,
    parent: Option<Parent>,
}

impl AttributeList {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.contains(PATH_DELIMITER), "list name {name:?} contains ':'");
        AttributeList {
            path: name.clone(),
            name,
            display_name: None,
            class: None,
            entries: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Parent) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Schema class name, persisted as `cl`
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the enclosing lists and this one, joined by `:`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn parent(&self) -> Option<&Parent> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: Option<Parent>) {
        self.parent = parent;
    }

    /// Freeze into a shared template
    pub fn into_template(self, name: &str) -> Template {
        Template::new(name, self)
    }

    /// Number of local entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Local entries, ordered by name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Defined here or anywhere up the parent chain
    pub fn contains(&self, name: &str) -> bool {
        self.kind_at(&[], name).is_some()
    }

    /// Define or replace a local attribute
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.entries
            .insert(attribute.name().to_string(), Entry::Attribute(attribute));
    }

    /// Define or replace a local nested list
    pub fn add_list(&mut self, mut list: AttributeList) {
        list.rebase(&self.path);
        self.entries.insert(list.name.clone(), Entry::List(list));
    }

    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    fn rebase(&mut self, prefix: &str) {
        self.path = join_path(prefix, &self.name);
        for entry in self.entries.values_mut() {
            if let Entry::List(list) = entry {
                list.rebase(&self.path);
            }
        }
    }

    /// Look up `name` here, then up the parent chain
    pub fn get_attribute(&self, name: &str) -> Option<AttributeRef<'_>> {
        match self.entries.get(name) {
            Some(Entry::Attribute(a)) => Some(AttributeRef::local(a, &self.path)),
            Some(Entry::List(_)) => None,
            None => {
                let inherited = self.parent.as_ref()?.lookup(&[], name)?;
                Some(AttributeRef::adopted(inherited, self.path.as_str()))
            }
        }
    }

    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.get_attribute(name).map(|a| a.value().clone())
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get_value(name).map(|v| v.number())
    }

    /// Set `name`, copying it from the parent chain first if it is inherited.
    ///
    /// Names unknown to the list and its parents are ignored and `false` is
    /// returned; use [`AttributeList::try_set_attribute`] to get an error.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Expression>) -> bool {
        let value = value.into();
        match self.entries.get_mut(name) {
            Some(Entry::Attribute(local)) => return local.set_expression_or_value(value),
            Some(Entry::List(_)) => {
                debug!(list = %self.path, name, "cannot set a nested list as an attribute");
                return false;
            }
            None => {}
        }
        let Some(mut inherited) = self.parent.as_ref().and_then(|p| p.lookup(&[], name)) else {
            debug!(list = %self.path, name, "ignoring unknown attribute");
            return false;
        };
        let value = inherited.constrained(value);
        if *inherited.expression() == value {
            return false;
        }
        inherited.set_expression_or_value(value);
        self.add_attribute(inherited);
        true
    }

    /// [`AttributeList::set_attribute`] that reports unknown names
    pub fn try_set_attribute(&mut self, name: &str, value: impl Into<Expression>) -> Result<bool, ModelError> {
        match self.kind_at(&[], name) {
            Some(EntryKind::Attribute) => Ok(self.set_attribute(name, value)),
            _ => Err(ModelError::UnknownAttribute {
                path: join_path(&self.path, name),
            }),
        }
    }

    /// Write handle for `name`, if it is defined anywhere in the chain
    pub fn attribute_mut(&mut self, name: &str) -> Option<AttributeMut<'_>> {
        match self.kind_at(&[], name) {
            Some(EntryKind::Attribute) => Some(AttributeMut {
                list: self,
                name: name.to_string(),
            }),
            _ => None,
        }
    }

    /// Nested list `name`; an inherited one is returned as an empty view
    /// whose parent is the inherited list
    pub fn get_list(&self, name: &str) -> Option<Cow<'_, AttributeList>> {
        match self.entries.get(name) {
            Some(Entry::List(list)) => Some(Cow::Borrowed(list)),
            Some(Entry::Attribute(_)) => None,
            None => self.inherited_list(name).map(Cow::Owned),
        }
    }

    /// Nested list `name` for writing; an inherited one is materialized as
    /// an empty local list first
    pub fn get_list_mut(&mut self, name: &str) -> Option<&mut AttributeList> {
        if !self.entries.contains_key(name) {
            let list = self.inherited_list(name)?;
            self.entries.insert(name.to_string(), Entry::List(list));
        }
        match self.entries.get_mut(name) {
            Some(Entry::List(list)) => Some(list),
            _ => None,
        }
    }

    fn inherited_list(&self, name: &str) -> Option<AttributeList> {
        let parent = self.parent.as_ref()?;
        if parent.kind(&[], name) != Some(EntryKind::List) {
            return None;
        }
        let mut list = AttributeList::new(name).with_parent(parent.nested(name));
        list.rebase(&self.path);
        Some(list)
    }

    /// Attribute at `list:...:name` relative to this list
    pub fn get_attribute_at_path(&self, path: &str) -> Option<AttributeRef<'_>> {
        let segments: Vec<&str> = path.split(PATH_DELIMITER).collect();
        let (name, lists) = segments.split_last()?;
        let mut list = self;
        for (i, segment) in lists.iter().enumerate() {
            match list.entries.get(*segment) {
                Some(Entry::List(nested)) => list = nested,
                Some(Entry::Attribute(_)) => return None,
                None => {
                    // inherited from here down
                    let rest: Vec<String> = lists[i..].iter().map(|s| s.to_string()).collect();
                    let attribute = list.parent.as_ref()?.lookup(&rest, name)?;
                    let owner = rest.iter().fold(list.path.clone(), |p, s| join_path(&p, s));
                    return Some(AttributeRef::adopted(attribute, owner));
                }
            }
        }
        list.get_attribute(name)
    }

    /// Set the attribute at `list:...:name`, materializing inherited lists on the way
    pub fn set_attribute_at_path(&mut self, path: &str, value: impl Into<Expression>) -> bool {
        let segments: Vec<&str> = path.split(PATH_DELIMITER).collect();
        let Some((name, lists)) = segments.split_last() else {
            return false;
        };
        let mut list = self;
        for segment in lists {
            match list.get_list_mut(segment) {
                Some(nested) => list = nested,
                None => {
                    debug!(path, "ignoring unknown attribute path");
                    return false;
                }
            }
        }
        list.set_attribute(name, value)
    }

    pub(crate) fn kind_at(&self, path: &[String], name: &str) -> Option<EntryKind> {
        match path.split_first() {
            None => match self.entries.get(name) {
                Some(entry) => Some(entry.kind()),
                None => self.parent.as_ref()?.kind(&[], name),
            },
            Some((head, rest)) => match self.entries.get(head) {
                Some(Entry::List(list)) => list.kind_at(rest, name),
                Some(Entry::Attribute(_)) => None,
                None => self.parent.as_ref()?.kind(path, name),
            },
        }
    }

    pub(crate) fn lookup_at(&self, path: &[String], name: &str) -> Option<Attribute> {
        match path.split_first() {
            None => self.get_attribute(name).map(AttributeRef::into_owned),
            Some((head, rest)) => match self.entries.get(head) {
                Some(Entry::List(list)) => list.lookup_at(rest, name),
                Some(Entry::Attribute(_)) => None,
                None => self.parent.as_ref()?.lookup(path, name),
            },
        }
    }

    pub(crate) fn flat_at(&self, path: &[String]) -> Option<AttributeList> {
        match path.split_first() {
            None => Some(self.to_flat_list()),
            Some((head, rest)) => match self.entries.get(head) {
                Some(Entry::List(list)) => list.flat_at(rest),
                Some(Entry::Attribute(_)) => None,
                None => self.parent.as_ref()?.flatten(path),
            },
        }
    }

    /// Parentless snapshot holding every value visible through this list
    pub fn to_flat_list(&self) -> AttributeList {
        let mut flat = self
            .parent
            .as_ref()
            .and_then(|p| p.flatten(&[]))
            .unwrap_or_else(|| AttributeList::new(self.name.clone()));
        flat.name = self.name.clone();
        flat.display_name = self.display_name.clone();
        flat.class = self.class.clone();
        flat.parent = None;
        for entry in self.entries.values() {
            let entry = match entry {
                Entry::Attribute(a) => Entry::Attribute(a.clone()),
                Entry::List(list) => Entry::List(list.to_flat_list()),
            };
            flat.overlay(entry);
        }
        flat.rebase_to(&self.path);
        flat
    }

    fn overlay(&mut self, entry: Entry) {
        match entry {
            Entry::List(list) => match self.entries.get_mut(&list.name) {
                Some(Entry::List(existing)) => {
                    for nested in list.entries.into_values() {
                        existing.overlay(nested);
                    }
                }
                _ => {
                    self.entries.insert(list.name.clone(), Entry::List(list));
                }
            },
            Entry::Attribute(a) => self.add_attribute(a),
        }
    }

    fn rebase_to(&mut self, path: &str) {
        self.path = path.to_string();
        for entry in self.entries.values_mut() {
            if let Entry::List(list) = entry {
                list.rebase(path);
            }
        }
    }

    /// Drop local values that shadow the parent; the rest reset themselves.
    /// Returns true if anything changed.
    pub fn reset(&mut self) -> bool {
        let parent = self.parent.as_ref();
        let mut changed = false;
        self.entries.retain(|name, entry| {
            let inherited = parent.and_then(|p| p.kind(&[], name));
            if inherited == Some(entry.kind()) {
                changed = true;
                return false;
            }
            changed |= match entry {
                Entry::Attribute(a) => a.reset(),
                Entry::List(list) => list.reset(),
            };
            true
        });
        changed
    }

    /// Keep only local attributes whose counterpart in `other` exists and
    /// satisfies `keep(mine, theirs)`. Nested lists are narrowed recursively.
    ///
    /// Call on a [flat list](AttributeList::to_flat_list) to cover inherited
    /// values as well.
    pub fn retain_all(&mut self, other: &AttributeList, keep: &dyn Fn(&Attribute, &Attribute) -> bool) {
        self.entries.retain(|name, entry| match entry {
            Entry::Attribute(mine) => other
                .get_attribute(name)
                .is_some_and(|theirs| keep(mine, theirs.attribute())),
            Entry::List(list) => match other.get_list(name) {
                Some(theirs) => {
                    list.retain_all(&theirs, keep);
                    true
                }
                None => false,
            },
        });
    }

    /// [`AttributeList::retain_all`] keeping attributes with equal values
    pub fn retain_equal(&mut self, other: &AttributeList) {
        self.retain_all(other, &|mine, theirs| mine.value() == theirs.value());
    }

    /// Write local entries as an `al` element
    pub fn save(&self, writer: &mut dyn Writer) {
        writer.write_start_element("al");
        writer.write_attribute_string("n", &self.name);
        if let Some(dn) = &self.display_name {
            writer.write_attribute_string("dn", dn);
        }
        if let Some(cl) = &self.class {
            writer.write_attribute_string("cl", cl);
        }
        if let Some(reference) = self.parent.as_ref().and_then(Parent::reference) {
            writer.write_attribute_string("pl", &reference.to_string());
        }
        for entry in self.entries.values() {
            match entry {
                Entry::Attribute(a) => a.save(writer),
                Entry::List(list) => list.save(writer),
            }
        }
        writer.write_end_element();
    }

    /// Read an `al` element. The parent comes from `pl` through `resolver`,
    /// otherwise from the template registered for `cl`.
    pub fn read<R: Reader>(reader: &R, node: &R::Node, resolver: &dyn ParentResolver) -> Self {
        Self::read_with(reader, node, resolver, None)
    }

    fn read_with<R: Reader>(
        reader: &R,
        node: &R::Node,
        resolver: &dyn ParentResolver,
        inherited: Option<Parent>,
    ) -> Self {
        let name = reader.attribute(node, "n").unwrap_or_default();
        let class = reader.attribute(node, "cl");
        let referenced = reader.attribute(node, "pl").and_then(|text| {
            let parent = text
                .parse::<ParentRef>()
                .ok()
                .and_then(|reference| resolver.resolve(&reference));
            if parent.is_none() {
                warn!(list = name, reference = text, "unresolved parent reference");
            }
            parent
        });
        let parent = referenced
            .or(inherited)
            .or_else(|| class.and_then(registry::template).map(Parent::template));

        let mut list = AttributeList::new(name);
        list.display_name = reader.attribute(node, "dn").map(str::to_string);
        list.class = class.map(str::to_string);
        list.parent = parent;

        for child in reader.children(node) {
            match reader.tag(child) {
                "at" => {
                    let read = Attribute::read(reader, child);
                    let attribute = match list.parent.as_ref().and_then(|p| p.lookup(&[], read.name())) {
                        Some(mut base) => {
                            base.restore_from(read);
                            base
                        }
                        None => read,
                    };
                    list.add_attribute(attribute);
                }
                "al" => {
                    let nested_name = reader.attribute(child, "n").unwrap_or_default();
                    let nested_parent = list
                        .parent
                        .as_ref()
                        .filter(|p| p.kind(&[], nested_name) == Some(EntryKind::List))
                        .map(|p| p.nested(nested_name));
                    let nested = Self::read_with(reader, child, resolver, nested_parent);
                    list.add_list(nested);
                }
                other => {
                    debug!(tag = other, "skipping unknown attribute list child");
                }
            }
        }
        list
    }
}

/// Write handle for one attribute, routing every change through its list
/// so inherited values are copied rather than modified in place
#[derive(Debug)]
pub struct AttributeMut<'a> {
    list: &'a mut AttributeList,
    name: String,
}

impl AttributeMut<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Option<AttributeRef<'_>> {
        self.list.get_attribute(&self.name)
    }

    pub fn value(&self) -> Option<Value> {
        self.list.get_value(&self.name)
    }

    pub fn is_local(&self) -> bool {
        self.list.has_local(&self.name)
    }

    pub fn set_expression_or_value(&mut self, value: impl Into<Expression>) -> bool {
        self.list.set_attribute(&self.name, value)
    }
}
