//! Naming policy.
//!
//! Names are normalised to lower_snake_case before anything else looks at
//! them. Reserved names and suffixes keep user-declared objects out of the
//! namespaces the engine generates sibling objects in.

use std::fmt;

/// Database names the engine keeps for itself (the audit ledger lives in `info`).
pub const RESERVED_DATABASE_NAMES: &[&str] = &["info"];

/// Table names that can't be declared.
///
/// These are the sibling suffixes as bare words: a table named `tags` is
/// too short to carry the `_tags` suffix but still reads as a sibling table.
pub const RESERVED_TABLE_NAMES: &[&str] = RESERVED_TABLE_SUFFIXES;

/// Table suffixes reserved for engine-generated sibling tables.
pub const RESERVED_TABLE_SUFFIXES: &[&str] =
    &["tags", "tag_aliases", "tag_names", "tag_groups", "descriptors"];

/// Column names the engine manages itself.
pub const RESERVED_COLUMN_NAMES: &[&str] = &["id", "user", "users", "primary_tag"];

/// Column suffixes reserved for engine-generated sibling columns.
pub const RESERVED_COLUMN_SUFFIXES: &[&str] = &["comments"];

/// Convert words to lower_snake_case.
///
/// Splits on `.`, space and `-`, lowercases each fragment and joins them with
/// `_`. Strings already in underscore notation pass through as one fragment.
/// camelCase is not split.
///
/// ```
/// use settle_schema::naming::normalize;
/// assert_eq!(normalize("hi I am Wywy"), "hi_i_am_wywy");
/// assert_eq!(normalize("a.b c-d"), "a_b_c_d");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.split(['.', ' ', '-'])
        .map(|fragment| fragment.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Returns false iff `name` is exactly one of `reserved_names`.
pub fn validate_name(name: &str, reserved_names: &[&str]) -> bool {
    !reserved_names.contains(&name)
}

/// Returns false iff `name` ends with `_{suffix}` for one of `reserved_suffixes`.
pub fn validate_suffix(name: &str, reserved_suffixes: &[&str]) -> bool {
    !reserved_suffixes.iter().any(|suffix| {
        // too short to hold "_{suffix}"
        name.len() > suffix.len()
            && name.ends_with(suffix)
            && name.as_bytes()[name.len() - suffix.len() - 1] == b'_'
    })
}

/// The kind of declared object a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClass {
    Database,
    Table,
    Column,
    /// Descriptor names follow the column rules.
    Descriptor,
}

impl fmt::Display for NameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameClass::Database => write!(f, "database"),
            NameClass::Table => write!(f, "table"),
            NameClass::Column => write!(f, "column"),
            NameClass::Descriptor => write!(f, "descriptor"),
        }
    }
}

/// A naming policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub class: NameClass,
    pub name: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    ReservedName,
    ReservedSuffix { suffixes: &'static [&'static str] },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::ReservedName => {
                write!(f, "\"{}\" is a reserved {} name.", self.name, self.class)
            }
            ViolationKind::ReservedSuffix { suffixes } => write!(
                f,
                "\"{}\" contains a reserved {} suffix ({}).",
                self.name,
                self.class,
                suffixes.join(", ")
            ),
        }
    }
}

/// Check an already-normalised name against the policy for its class.
///
/// An empty result means the name may be reconciled.
pub fn check(class: NameClass, name: &str) -> Vec<Violation> {
    const NONE: &[&str] = &[];
    let (names, suffixes) = match class {
        NameClass::Database => (RESERVED_DATABASE_NAMES, NONE),
        NameClass::Table => (RESERVED_TABLE_NAMES, RESERVED_TABLE_SUFFIXES),
        NameClass::Column | NameClass::Descriptor => {
            (RESERVED_COLUMN_NAMES, RESERVED_COLUMN_SUFFIXES)
        }
    };

    let mut violations = Vec::new();
    if !validate_name(name, names) {
        violations.push(Violation {
            class,
            name: name.to_string(),
            kind: ViolationKind::ReservedName,
        });
    }
    if !validate_suffix(name, suffixes) {
        violations.push(Violation {
            class,
            name: name.to_string(),
            kind: ViolationKind::ReservedSuffix { suffixes },
        });
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("hi I am Wywy"), "hi_i_am_wywy");
        assert_eq!(normalize("already_snake"), "already_snake");
        assert_eq!(normalize("a.b c-d"), "a_b_c_d");
        assert_eq!(normalize("Widgets"), "widgets");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_validate_name() {
        assert!(!validate_name("info", RESERVED_DATABASE_NAMES));
        assert!(validate_name("inventory", RESERVED_DATABASE_NAMES));
        assert!(validate_name("anything", &[]));
    }

    #[test]
    fn test_validate_suffix() {
        assert!(!validate_suffix("widgets_tags", RESERVED_TABLE_SUFFIXES));
        assert!(!validate_suffix("widgets_size_descriptors", RESERVED_TABLE_SUFFIXES));
        assert!(!validate_suffix("price_comments", RESERVED_COLUMN_SUFFIXES));
        // needs the underscore
        assert!(validate_suffix("hashtags", RESERVED_TABLE_SUFFIXES));
        // shorter than "_tags"
        assert!(validate_suffix("tags", RESERVED_TABLE_SUFFIXES));
        assert!(validate_suffix("_tag", RESERVED_TABLE_SUFFIXES));
    }

    #[test]
    fn test_check_table() {
        assert!(check(NameClass::Table, "widgets").is_empty());

        let violations = check(NameClass::Table, "tags");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ReservedName);

        let violations = check(NameClass::Table, "widget_tag_groups");
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0].kind,
            ViolationKind::ReservedSuffix { .. }
        ));
    }

    #[test]
    fn test_check_column_and_database() {
        assert_eq!(check(NameClass::Column, "id").len(), 1);
        assert_eq!(check(NameClass::Column, "primary_tag").len(), 1);
        assert_eq!(check(NameClass::Descriptor, "user").len(), 1);
        assert_eq!(check(NameClass::Column, "notes_comments").len(), 1);
        assert!(check(NameClass::Column, "comments").is_empty());
        assert_eq!(check(NameClass::Database, "info").len(), 1);
        // database names have no reserved suffixes
        assert!(check(NameClass::Database, "shop_tags").is_empty());
    }

    #[test]
    fn test_violation_message() {
        let violations = check(NameClass::Database, "info");
        assert_eq!(
            violations[0].to_string(),
            "\"info\" is a reserved database name."
        );
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in "[A-Za-z0-9_. -]{0,24}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn normalize_removes_separators(raw in "\\PC{0,24}") {
            let out = normalize(&raw);
            prop_assert!(!out.contains(['.', ' ', '-']));
        }

        #[test]
        fn suffix_check_agrees_with_ends_with(stem in "[a-z]{1,8}", suffix in "[a-z_]{1,8}") {
            let name = format!("{stem}_{suffix}");
            prop_assert!(!validate_suffix(&name, &[suffix.as_str()]));
            // the stem alone carries no underscore, so it can't end with "_{suffix}"
            prop_assert!(validate_suffix(&stem, &[suffix.as_str()]));
        }
    }
}
