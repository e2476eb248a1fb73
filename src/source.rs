use std::collections::HashMap;

/// Per-file parsing context: the file's identity, its namespace once the
/// declaration has been seen, and the `use` alias table.
#[derive(Debug, Default)]
pub struct SourceUnit {
    /// File name as given to the driver.
    pub file_name: String,
    /// Directory of the file relative to the source root, `/`-separated,
    /// empty for root-level files.
    pub relative_dir: String,
    /// Name of the synthesized function holding the file's top-level code.
    pub main_func_name: String,
    /// Namespace declared by the file; empty until (and unless) a
    /// `namespace` statement is parsed.
    pub namespace_name: String,
    uses: HashMap<String, String>,
}

impl SourceUnit {
    pub fn new(file_name: &str, relative_dir: &str) -> Self {
        let stem = file_name
            .rsplit('/')
            .next()
            .unwrap_or(file_name)
            .trim_end_matches(".php");
        Self {
            file_name: file_name.to_string(),
            relative_dir: relative_dir.to_string(),
            main_func_name: format!("src_{}", stem.replace(['.', '-'], "_")),
            namespace_name: String::new(),
            uses: HashMap::new(),
        }
    }

    /// The namespace this file is required to declare, derived from its
    /// location: path separators become namespace separators.
    pub fn expected_namespace(&self) -> String {
        self.relative_dir.replace('/', "\\")
    }

    /// Register a `use` alias. The first registration of an alias wins;
    /// returns false when a duplicate was ignored.
    pub fn add_use(&mut self, alias: &str, full_name: &str) -> bool {
        if self.uses.contains_key(alias) {
            return false;
        }
        self.uses.insert(alias.to_string(), full_name.to_string());
        true
    }

    /// Expand a possibly-relative class name to its fully qualified form.
    ///
    /// Leading `\` means the name is already absolute. Otherwise the first
    /// segment is looked up in the alias table; failing that, the name is
    /// anchored in the file's own namespace.
    pub fn resolve_class_name(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }
        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(full) = self.uses.get(first) {
            return match rest {
                Some(rest) => format!("{full}\\{rest}"),
                None => full.clone(),
            };
        }
        if self.namespace_name.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{name}", self.namespace_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_namespace_follows_directory() {
        let unit = SourceUnit::new("lib/util/Strings.php", "lib/util");
        assert_eq!(unit.expected_namespace(), "lib\\util");
        assert_eq!(unit.main_func_name, "src_Strings");
    }

    #[test]
    fn first_use_wins() {
        let mut unit = SourceUnit::new("a.php", "");
        assert!(unit.add_use("C", "lib\\first\\C"));
        assert!(!unit.add_use("C", "lib\\second\\C"));
        assert_eq!(unit.resolve_class_name("C"), "lib\\first\\C");
    }

    #[test]
    fn resolution_prefers_absolute_then_alias_then_namespace() {
        let mut unit = SourceUnit::new("a.php", "app");
        unit.namespace_name = "app".to_string();
        unit.add_use("Str", "lib\\util\\Strings");
        assert_eq!(unit.resolve_class_name("\\raw\\Name"), "raw\\Name");
        assert_eq!(unit.resolve_class_name("Str"), "lib\\util\\Strings");
        assert_eq!(unit.resolve_class_name("Str\\Inner"), "lib\\util\\Strings\\Inner");
        assert_eq!(unit.resolve_class_name("Local"), "app\\Local");
    }
}
