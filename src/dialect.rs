//! Validator dialects and their annotation tags.

/// Validator library a schema is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Zod,
    Valibot,
    ArkType,
    Effect,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Self::Zod, Self::Valibot, Self::ArkType, Self::Effect];

    pub fn name(self) -> &'static str {
        match self {
            Self::Zod => "zod",
            Self::Valibot => "valibot",
            Self::ArkType => "arktype",
            Self::Effect => "effect",
        }
    }

    /// Library namespace as written in annotations, without `@`.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Zod => "z",
            Self::Valibot => "v",
            Self::ArkType => "a",
            Self::Effect => "e",
        }
    }

    /// Line prefix that marks an annotation for this dialect, e.g. `@z.`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Zod => "@z.",
            Self::Valibot => "@v.",
            Self::ArkType => "@a.",
            Self::Effect => "@e.",
        }
    }

    /// Whether `@<ns>.` is dropped entirely from a definition.
    ///
    /// Zod and Valibot expressions are written against the library namespace
    /// (`z.string()`), so only the `@` goes. ArkType and Effect annotations
    /// use the namespace purely as a tag.
    pub fn strips_namespace(self) -> bool {
        matches!(self, Self::ArkType | Self::Effect)
    }

    /// Extract the definition carried by an annotation line, if the line is
    /// tagged for this dialect.
    pub fn definition(self, line: &str) -> Option<String> {
        let rest = line.strip_prefix(self.tag())?;
        if self.strips_namespace() {
            Some(rest.to_string())
        } else {
            Some(format!("{}.{}", self.namespace(), rest))
        }
    }

    /// True if the line is tagged for any dialect.
    pub fn is_any_tag(line: &str) -> bool {
        Self::ALL.iter().any(|d| line.starts_with(d.tag()))
    }
}
