//! Static extension → language table and per-language splitting parameters.

/// Size parameters of the recursive splitter, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    pub max_size: usize,
    pub overlap: usize,
}

/// Parameters for every extension present in the table.
pub const LANGUAGE_SPLITTER: SplitterConfig = SplitterConfig { max_size: 100, overlap: 20 };

/// Parameters substituted when the extension is unknown.
pub const DEFAULT_SPLITTER: SplitterConfig = SplitterConfig { max_size: 100, overlap: 50 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    C,
    Cpp,
    CSharp,
    Java,
    Kotlin,
    Scala,
    Swift,
    Php,
    Ruby,
    Lua,
    Haskell,
    Markdown,
    Html,
    Latex,
    Solidity,
}

static EXTENSIONS: &[(&str, Language)] = &[
    ("py", Language::Python),
    ("pyi", Language::Python),
    ("js", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("ts", Language::TypeScript),
    ("mts", Language::TypeScript),
    ("cts", Language::TypeScript),
    ("tsx", Language::Tsx),
    ("rs", Language::Rust),
    ("go", Language::Go),
    ("c", Language::C),
    ("h", Language::C),
    ("cc", Language::Cpp),
    ("cpp", Language::Cpp),
    ("cxx", Language::Cpp),
    ("hpp", Language::Cpp),
    ("cs", Language::CSharp),
    ("java", Language::Java),
    ("kt", Language::Kotlin),
    ("kts", Language::Kotlin),
    ("scala", Language::Scala),
    ("swift", Language::Swift),
    ("php", Language::Php),
    ("rb", Language::Ruby),
    ("lua", Language::Lua),
    ("hs", Language::Haskell),
    ("md", Language::Markdown),
    ("markdown", Language::Markdown),
    ("html", Language::Html),
    ("htm", Language::Html),
    ("vue", Language::Html),
    ("tex", Language::Latex),
    ("sol", Language::Solidity),
];

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, lang)| *lang)
    }

    /// Tree-sitter grammar, for the languages chunked structurally.
    pub fn grammar(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            _ => None,
        }
    }

    /// Node kinds emitted whole as chunks (split points).
    pub fn terminal_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &[
                "function_definition",
                "class_definition",
                "decorated_definition",
                "if_statement",
                "for_statement",
                "while_statement",
                "try_statement",
                "with_statement",
            ],
            Language::JavaScript => &[
                "export_statement",
                "function_declaration",
                "generator_function_declaration",
                "class_declaration",
                "lexical_declaration",
                "variable_declaration",
                "if_statement",
                "for_statement",
                "for_in_statement",
                "while_statement",
                "do_statement",
                "switch_statement",
                "try_statement",
            ],
            Language::TypeScript | Language::Tsx => &[
                "export_statement",
                "function_declaration",
                "generator_function_declaration",
                "class_declaration",
                "abstract_class_declaration",
                "interface_declaration",
                "type_alias_declaration",
                "enum_declaration",
                "lexical_declaration",
                "variable_declaration",
                "if_statement",
                "for_statement",
                "for_in_statement",
                "while_statement",
                "switch_statement",
                "try_statement",
            ],
            Language::Rust => &[
                "function_item",
                "impl_item",
                "struct_item",
                "enum_item",
                "union_item",
                "trait_item",
                "mod_item",
                "const_item",
                "static_item",
                "type_item",
                "macro_definition",
            ],
            Language::Go => &[
                "function_declaration",
                "method_declaration",
                "type_declaration",
                "const_declaration",
                "var_declaration",
                "if_statement",
                "for_statement",
            ],
            _ => &[],
        }
    }
}

/// Splitter parameters for an extension, falling back to the default entry.
pub fn splitter_config(ext: Option<&str>) -> SplitterConfig {
    match ext.and_then(Language::from_extension) {
        Some(_) => LANGUAGE_SPLITTER,
        None => DEFAULT_SPLITTER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("TSX"), Some(Language::Tsx));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn unknown_extension_gets_default_entry() {
        assert_eq!(splitter_config(Some("txt")), DEFAULT_SPLITTER);
        assert_eq!(splitter_config(None), DEFAULT_SPLITTER);
        assert_eq!(splitter_config(Some("java")), LANGUAGE_SPLITTER);
    }

    #[test]
    fn only_grammar_languages_have_terminals() {
        for (_, lang) in EXTENSIONS {
            assert_eq!(lang.grammar().is_some(), !lang.terminal_kinds().is_empty(), "{lang:?}");
        }
    }
}
