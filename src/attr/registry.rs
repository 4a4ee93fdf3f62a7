//! Name to template lookup for persisted `tl:<name>` references

use std::cell::RefCell;
use std::collections::HashMap;

use super::lists::{
    CellAttributes, CellFormatAttributes, CellTextFormatAttributes, EdgeAttributes, FormatAttributes,
    ItemAttributes, LayoutAttributes, TextFormatAttributes, WorksheetAttributes,
};
use super::parent::Template;
use crate::errors::ModelError;

/// Class names of the built-in templates
pub const BUILTIN: &[&str] = &[
    ItemAttributes::CLASS,
    FormatAttributes::CLASS,
    TextFormatAttributes::CLASS,
    CellAttributes::CLASS,
    CellFormatAttributes::CLASS,
    CellTextFormatAttributes::CLASS,
    EdgeAttributes::CLASS,
    LayoutAttributes::CLASS,
    WorksheetAttributes::CLASS,
];

thread_local! {
    static CUSTOM: RefCell<HashMap<String, Template>> = RefCell::new(HashMap::new());
}

/// Template registered under `name`, built-in or custom
pub fn template(name: &str) -> Option<Template> {
    let builtin = match name {
        ItemAttributes::CLASS => ItemAttributes::template(),
        FormatAttributes::CLASS => FormatAttributes::template(),
        TextFormatAttributes::CLASS => TextFormatAttributes::template(),
        CellAttributes::CLASS => CellAttributes::template(),
        CellFormatAttributes::CLASS => CellFormatAttributes::template(),
        CellTextFormatAttributes::CLASS => CellTextFormatAttributes::template(),
        EdgeAttributes::CLASS => EdgeAttributes::template(),
        LayoutAttributes::CLASS => LayoutAttributes::template(),
        WorksheetAttributes::CLASS => WorksheetAttributes::template(),
        _ => return CUSTOM.with(|custom| custom.borrow().get(name).cloned()),
    };
    Some(builtin)
}

pub fn try_template(name: &str) -> Result<Template, ModelError> {
    template(name).ok_or_else(|| ModelError::UnknownTemplate { name: name.to_string() })
}

/// Register a host-defined template for the current thread. Built-in names
/// cannot be replaced; returns false for them.
pub fn register(template: Template) -> bool {
    if BUILTIN.contains(&template.name()) {
        return false;
    }
    CUSTOM.with(|custom| {
        custom
            .borrow_mut()
            .insert(template.name().to_string(), template);
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{Attribute, AttributeList};

    #[test]
    fn builtin_names_resolve() {
        for name in BUILTIN {
            assert_eq!(template(name).map(|t| t.name().to_string()), Some(name.to_string()));
        }
        assert_eq!(
            try_template("Nope").unwrap_err(),
            ModelError::UnknownTemplate { name: "Nope".into() }
        );
    }

    #[test]
    fn custom_templates() {
        let mut list = AttributeList::new("style");
        list.add_attribute(Attribute::new("corner", 5.0));
        assert!(register(list.into_template("RoundedStyle")));
        assert_eq!(template("RoundedStyle").unwrap().list().get_number("corner"), Some(5.0));

        assert!(!register(AttributeList::new("format").into_template(FormatAttributes::CLASS)));
    }
}
