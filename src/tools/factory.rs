use crate::types::{CyroError, Result};
use cyro_tools::{ToolBundle, ToolContext};
use std::sync::LazyLock;
use tracing::debug;

/// Builds the tools of one category
pub type CategoryBuilder = fn(&ToolContext) -> ToolBundle;

/// Category name to builder, in registration order
static CATEGORIES: LazyLock<Vec<(&'static str, CategoryBuilder)>> = LazyLock::new(|| {
    let mut categories: Vec<(&'static str, CategoryBuilder)> = vec![
        ("filesystem", cyro_tools::filesystem::toolset as CategoryBuilder),
        ("execution", cyro_tools::execution::toolset as CategoryBuilder),
        ("web", cyro_tools::web::toolset as CategoryBuilder),
        ("task_management", cyro_tools::tasks::toolset as CategoryBuilder),
    ];
    #[cfg(feature = "git-tools")]
    categories.push(("git", cyro_tools::git::toolset as CategoryBuilder));
    #[cfg(feature = "code-tools")]
    categories.push(("code", cyro_tools::code::toolset as CategoryBuilder));
    categories
});

/// Named category lists. Categories missing from [`CATEGORIES`] are dropped
/// when an archetype is resolved.
const ARCHETYPES: &[(&str, &[&str])] = &[
    (
        "general",
        &["filesystem", "execution", "web", "task_management", "code", "git"],
    ),
    ("web", &["web", "task_management"]),
    (
        "coding",
        &["filesystem", "execution", "code", "git", "task_management"],
    ),
    ("debug", &["filesystem", "execution", "git", "task_management"]),
    ("file", &["filesystem", "task_management"]),
    ("search", &["web"]),
    ("manager", &[]),
];

/// Turns declared tool category names into [`ToolBundle`]s.
#[derive(Debug, Clone)]
pub struct ToolFactory {
    ctx: ToolContext,
}

impl ToolFactory {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Build the union of `categories`, in request order.
    ///
    /// Tools are not deduplicated: a category listed twice contributes its
    /// tools twice.
    pub fn build<S: AsRef<str>>(&self, categories: &[S]) -> Result<ToolBundle> {
        let mut bundle = ToolBundle::new();
        for category in categories {
            let category = category.as_ref();
            let builder = lookup(category).ok_or_else(|| CyroError::UnknownTool {
                name: category.to_string(),
                available: self.available_categories(),
            })?;
            bundle.extend(builder(&self.ctx));
        }
        debug!(?bundle, "Built tool bundle");
        Ok(bundle)
    }

    /// Build the bundle for a named archetype such as `coding` or `search`
    pub fn resolve_bundle_for_archetype(&self, archetype: &str) -> Result<ToolBundle> {
        let categories = Self::archetype_categories(archetype).ok_or_else(|| CyroError::UnknownTool {
            name: archetype.to_string(),
            available: self.available_archetypes(),
        })?;
        self.build(&categories)
    }

    /// Every category compiled into this build, in registration order
    pub fn available_categories(&self) -> Vec<String> {
        CATEGORIES.iter().map(|(name, _)| name.to_string()).collect()
    }

    pub fn available_archetypes(&self) -> Vec<String> {
        ARCHETYPES.iter().map(|(name, _)| name.to_string()).collect()
    }

    /// Categories of `archetype` that exist in this build
    pub fn archetype_categories(archetype: &str) -> Option<Vec<&'static str>> {
        ARCHETYPES
            .iter()
            .find(|(name, _)| *name == archetype)
            .map(|(_, categories)| {
                categories
                    .iter()
                    .copied()
                    .filter(|c| lookup(c).is_some())
                    .collect()
            })
    }

    /// The entries of `tools` that are not known categories
    pub fn validate_tool_list(&self, tools: &[String]) -> Vec<String> {
        tools
            .iter()
            .filter(|t| lookup(t).is_none())
            .cloned()
            .collect()
    }
}

fn lookup(category: &str) -> Option<CategoryBuilder> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, builder)| *builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    fn factory() -> ToolFactory {
        ToolFactory::new(ToolContext::new(std::env::temp_dir()))
    }

    #[test]
    fn test_empty_list_is_empty_bundle() {
        let bundle = factory().build::<&str>(&[]).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_union_matches_individual_builds() {
        let f = factory();
        let fs = f.build(&["filesystem"]).unwrap();
        let web = f.build(&["web"]).unwrap();
        let both = f.build(&["filesystem", "web"]).unwrap();

        let expected: HashSet<&str> = fs.names().into_iter().chain(web.names()).collect();
        let actual: HashSet<&str> = both.names().into_iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(both.len(), fs.len() + web.len());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let bundle = factory().build(&["web", "web"]).unwrap();
        assert_eq!(bundle.names(), vec!["web_fetch", "web_fetch"]);
    }

    #[test]
    fn test_unknown_category_lists_available() {
        let err = factory().build(&["filesystem", "not-a-real-category"]).unwrap_err();
        match err {
            CyroError::UnknownTool { name, available } => {
                assert_eq!(name, "not-a-real-category");
                assert_eq!(available, factory().available_categories());
                assert!(available.contains(&"filesystem".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("search", vec!["web_fetch"])]
    #[case("web", vec!["web_fetch", "todo_write", "query_tasks"])]
    #[case("manager", vec![])]
    fn test_archetypes(#[case] archetype: &str, #[case] expected: Vec<&str>) {
        let bundle = factory().resolve_bundle_for_archetype(archetype).unwrap();
        assert_eq!(bundle.names(), expected);
    }

    #[test]
    fn test_unknown_archetype_lists_archetypes() {
        let err = factory().resolve_bundle_for_archetype("wizard").unwrap_err();
        assert!(matches!(
            err,
            CyroError::UnknownTool { ref available, .. } if available.contains(&"coding".to_string())
        ));
    }

    #[test]
    fn test_archetypes_only_reference_compiled_categories() {
        let f = factory();
        let categories = f.available_categories();
        for archetype in f.available_archetypes() {
            for category in ToolFactory::archetype_categories(&archetype).unwrap() {
                assert!(categories.contains(&category.to_string()));
            }
        }
    }

    #[test]
    fn test_category_table_is_built_once() {
        let first: *const _ = CATEGORIES.as_slice();
        let second: *const _ = CATEGORIES.as_slice();
        assert!(std::ptr::eq(first, second));
        for (name, _) in CATEGORIES.iter() {
            assert!(lookup(name).is_some());
        }
    }

    #[test]
    fn test_archetype_categories_without_instance() {
        assert_eq!(ToolFactory::archetype_categories("search"), Some(vec!["web"]));
        assert_eq!(ToolFactory::archetype_categories("manager"), Some(vec![]));
        assert_eq!(ToolFactory::archetype_categories("wizard"), None);
    }

    #[test]
    fn test_validate_tool_list() {
        let unknown = factory().validate_tool_list(&[
            "filesystem".to_string(),
            "telepathy".to_string(),
            "web".to_string(),
        ]);
        assert_eq!(unknown, vec!["telepathy"]);
    }
}
