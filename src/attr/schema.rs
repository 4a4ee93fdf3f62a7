//! Macros generating constant sets and fixed-schema attribute lists

/// Unit struct of named numeric constants plus a `PROPERTIES` table for
/// [`RangeConstraint::from_properties_of`](crate::attr::RangeConstraint::from_properties_of).
macro_rules! constant_set {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$cmeta:meta])* $konst:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $name;

        impl $name {
            $( $(#[$cmeta])* pub const $konst: f64 = $value; )+

            pub const PROPERTIES: &'static [(&'static str, f64)] = &[
                $( (stringify!($konst), $value) ),+
            ];

            /// Constant name for `value`, if it is one of the set
            pub fn name_of(value: f64) -> Option<&'static str> {
                Self::PROPERTIES.iter().find(|(_, v)| *v == value).map(|(n, _)| *n)
            }
        }
    };
}

/// Newtype over [`AttributeList`](crate::attr::AttributeList) with a fixed
/// schema and a lazily built per-thread template.
///
/// Each entry reads `CONST = "name" => |theme| default`, optionally followed
/// by `; one_of ConstantSet` to constrain the value. A `: Base` after the
/// class name chains the template to `Base`'s template, so only the listed
/// entries are overridden.
macro_rules! attribute_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident($list:literal, $class:literal) $(: $base:ident)? {
            $(
                $(#[$cmeta:meta])*
                $konst:ident = $attr:literal => |$theme:pat_param| $default:expr $(; one_of $set:ident)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $ty($crate::attr::AttributeList);

        impl $ty {
            /// List name inside the owning item
            pub const NAME: &'static str = $list;
            /// Template class name, persisted as `cl` and `tl:<class>`
            pub const CLASS: &'static str = $class;

            $( $(#[$cmeta])* pub const $konst: &'static str = $attr; )*

            pub fn new() -> Self {
                $ty(
                    $crate::attr::AttributeList::new(Self::NAME)
                        .with_class(Self::CLASS)
                        .with_parent($crate::attr::Parent::template(Self::template())),
                )
            }

            /// Shared defaults, built on first use in each thread
            pub fn template() -> $crate::attr::Template {
                thread_local! {
                    static TEMPLATE: $crate::attr::Template = $ty::build_template();
                }
                TEMPLATE.with(|t| t.clone())
            }

            fn build_template() -> $crate::attr::Template {
                #[allow(unused_variables)]
                let theme = $crate::theme::Theme::current();
                #[allow(unused_mut)]
                let mut list = $crate::attr::AttributeList::new(Self::NAME).with_class(Self::CLASS);
                $( list.set_parent(Some($crate::attr::Parent::template($base::template()))); )?
                $(
                    let attribute = {
                        let $theme = theme;
                        $crate::attr::Attribute::new($attr, $default)
                    };
                    $(
                        let default = attribute.value().clone();
                        let attribute = attribute.with_constraint(
                            $crate::attr::RangeConstraint::from_properties_of($set::PROPERTIES, default),
                        );
                    )?
                    list.add_attribute(attribute);
                )*
                list.into_template(Self::CLASS)
            }

            /// Read a persisted `al` element; lists without a resolvable
            /// parent fall back to this schema's template
            pub fn read<R: $crate::persist::Reader>(
                reader: &R,
                node: &R::Node,
                resolver: &dyn $crate::attr::ParentResolver,
            ) -> Self {
                let mut list = $crate::attr::AttributeList::read(reader, node, resolver);
                if list.parent().is_none() {
                    list.set_parent(Some($crate::attr::Parent::template(Self::template())));
                }
                $ty(list)
            }

            pub fn into_inner(self) -> $crate::attr::AttributeList {
                self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $ty {
            type Target = $crate::attr::AttributeList;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $ty {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$ty> for $crate::attr::AttributeList {
            fn from(list: $ty) -> Self {
                list.0
            }
        }
    };
}

pub(crate) use attribute_schema;
pub(crate) use constant_set;
