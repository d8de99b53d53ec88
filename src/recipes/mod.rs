/*!
# Recipes

A recipe is a named, immutable transformation. For each file the runner
asks it for fresh visitors: a Java visitor, a properties visitor or a plain
text visitor, whichever the recipe has for that kind of source. Chained
recipes returned by [`Recipe::next`] run right after their parent, depth
first.

## Built-in recipes

| name | source | effect |
|---|---|---|
| `change-type` | Java | rewrites references to one type into another |
| `change-method-name` | Java | renames matching declarations and invocations |
| `change-property-key` | properties | renames a key |
| `jaxrs-to-spring` | Java | JAX-RS resource annotations to Spring MVC |
| `find-custom-get-by-id` | Java | marks `getById` on JPA repositories |
| `rename-custom-get-by-id` | Java | renames them to `get<Entity>ById` |
| `sql-script-datasource-initialization` | properties | Spring Boot 2.5 `spring.sql.init.*` keys |
| `migrate-sql-script-credentials` | properties, text | marks script credentials and scripts |

## Usage

```rust
use std::collections::BTreeMap;
use spring_rewrite::recipes;

let mut params = BTreeMap::new();
params.insert("old".to_string(), "javax.ws.rs.PathParam".to_string());
params.insert("new".to_string(), "org.springframework.web.bind.annotation.PathVariable".to_string());
let recipe = recipes::lookup("change-type", &params)?;
assert_eq!(recipe.name(), "change-type");
# Ok::<(), recipes::RecipeLookupError>(())
```
*/

pub mod change_method_name;
pub mod change_property_key;
pub mod change_type;
pub mod datasource;
pub mod get_by_id;
pub mod jaxrs;

pub use change_method_name::ChangeMethodName;
pub use change_property_key::ChangePropertyKey;
pub use change_type::ChangeType;
pub use datasource::{MigrateSqlScriptCredentials, SqlScriptDataSourceInitialization};
pub use get_by_id::{FindCustomGetById, RenameCustomGetById};
pub use jaxrs::JaxRsToSpring;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::text::{PlainTextVisitor, PropertiesVisitor};
use crate::visitor::{JavaVisitor, MatcherError};

/// Named source transformation.
#[allow(unused_variables)]
pub trait Recipe: Send + Sync {
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// Cheap filter on the file path, checked before anything else.
    fn accepts_path(&self, path: &Path) -> bool {
        true
    }

    /// Search visitor run on Java sources before the recipe: the recipe
    /// applies only when it records a finding.
    fn applicable_test(&self) -> Option<Box<dyn JavaVisitor>> {
        None
    }

    fn java_visitor(&self) -> Option<Box<dyn JavaVisitor>> {
        None
    }

    fn properties_visitor(&self) -> Option<Box<dyn PropertiesVisitor>> {
        None
    }

    fn plain_text_visitor(&self) -> Option<Box<dyn PlainTextVisitor>> {
        None
    }

    /// Recipes run after this one on the same file.
    fn next(&self) -> Vec<Arc<dyn Recipe>> {
        Vec::new()
    }
}

/// Recipe plus its chained recipes, depth first.
pub fn flatten(recipe: &Arc<dyn Recipe>) -> Vec<Arc<dyn Recipe>> {
    let mut out = vec![recipe.clone()];
    for next in recipe.next() {
        out.extend(flatten(&next));
    }
    out
}

#[derive(Error, Debug)]
pub enum RecipeLookupError {
    #[error("unknown recipe `{0}`")]
    Unknown(String),
    #[error("recipe `{recipe}` requires parameter `{parameter}`")]
    MissingParameter { recipe: String, parameter: String },
    #[error("recipe `{recipe}`: invalid parameter `{parameter}`: {message}")]
    InvalidParameter {
        recipe: String,
        parameter: String,
        message: String,
    },
    #[error("recipe `{recipe}`: {source}")]
    Matcher {
        recipe: String,
        #[source]
        source: MatcherError,
    },
}

/// Catalog entry shown by `spring-rewrite list`.
#[derive(Debug, Clone, Copy)]
pub struct RecipeDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
}

pub const BUILTIN: &[RecipeDescriptor] = &[
    RecipeDescriptor {
        name: "change-type",
        description: "Change every reference to a type into another type",
        parameters: &["old", "new"],
    },
    RecipeDescriptor {
        name: "change-method-name",
        description: "Rename methods matching a signature pattern, declarations and calls",
        parameters: &["pattern", "new_name", "match_overrides"],
    },
    RecipeDescriptor {
        name: "change-property-key",
        description: "Rename a key in .properties files",
        parameters: &["old", "new"],
    },
    RecipeDescriptor {
        name: JaxRsToSpring::NAME,
        description: "Convert JAX-RS annotations to Spring annotations",
        parameters: &[],
    },
    RecipeDescriptor {
        name: FindCustomGetById::NAME,
        description: "Find custom getById() methods on JpaRepositories",
        parameters: &[],
    },
    RecipeDescriptor {
        name: RenameCustomGetById::NAME,
        description: "Rename custom getById() methods on JpaRepositories to get<Entity>ById()",
        parameters: &[],
    },
    RecipeDescriptor {
        name: SqlScriptDataSourceInitialization::NAME,
        description: "Move SQL script datasource initialization properties to spring.sql.init.*",
        parameters: &[],
    },
    RecipeDescriptor {
        name: MigrateSqlScriptCredentials::NAME,
        description: "Find SQL script credentials and schema.sql/data.sql scripts",
        parameters: &[],
    },
];

fn required<'p>(recipe: &str, params: &'p BTreeMap<String, String>, name: &str) -> Result<&'p str, RecipeLookupError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| RecipeLookupError::MissingParameter {
            recipe: recipe.to_string(),
            parameter: name.to_string(),
        })
}

/// Instantiates a built-in recipe by name.
pub fn lookup(name: &str, params: &BTreeMap<String, String>) -> Result<Arc<dyn Recipe>, RecipeLookupError> {
    let matcher_error = |source| RecipeLookupError::Matcher {
        recipe: name.to_string(),
        source,
    };
    let recipe: Arc<dyn Recipe> = match name {
        "change-type" => Arc::new(ChangeType::new(
            required(name, params, "old")?,
            required(name, params, "new")?,
        )),
        "change-method-name" => {
            let match_overrides = match params.get("match_overrides").map(String::as_str) {
                None | Some("false") => false,
                Some("true") => true,
                Some(other) => {
                    return Err(RecipeLookupError::InvalidParameter {
                        recipe: name.to_string(),
                        parameter: "match_overrides".to_string(),
                        message: format!("expected true or false, got `{}`", other),
                    })
                }
            };
            Arc::new(
                ChangeMethodName::new(
                    required(name, params, "pattern")?,
                    required(name, params, "new_name")?,
                    match_overrides,
                )
                .map_err(matcher_error)?,
            )
        }
        "change-property-key" => Arc::new(ChangePropertyKey::new(
            required(name, params, "old")?,
            required(name, params, "new")?,
        )),
        JaxRsToSpring::NAME => Arc::new(JaxRsToSpring::new()),
        FindCustomGetById::NAME => Arc::new(FindCustomGetById),
        RenameCustomGetById::NAME => Arc::new(RenameCustomGetById),
        SqlScriptDataSourceInitialization::NAME => Arc::new(SqlScriptDataSourceInitialization),
        MigrateSqlScriptCredentials::NAME => Arc::new(MigrateSqlScriptCredentials),
        other => return Err(RecipeLookupError::Unknown(other.to_string())),
    };
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_every_parameterless_builtin() {
        for descriptor in BUILTIN.iter().filter(|d| d.parameters.is_empty()) {
            let recipe = lookup(descriptor.name, &BTreeMap::new()).unwrap();
            assert_eq!(recipe.name(), descriptor.name);
        }
    }

    #[test]
    fn test_lookup_errors() {
        assert!(matches!(
            lookup("nope", &BTreeMap::new()),
            Err(RecipeLookupError::Unknown(_))
        ));
        assert!(matches!(
            lookup("change-type", &BTreeMap::new()),
            Err(RecipeLookupError::MissingParameter { .. })
        ));

        let mut params = BTreeMap::new();
        params.insert("pattern".to_string(), "getById".to_string());
        params.insert("new_name".to_string(), "x".to_string());
        assert!(matches!(
            lookup("change-method-name", &params),
            Err(RecipeLookupError::Matcher { .. })
        ));
        params.insert("match_overrides".to_string(), "maybe".to_string());
        assert!(matches!(
            lookup("change-method-name", &params),
            Err(RecipeLookupError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_flatten_is_depth_first() {
        let recipe: Arc<dyn Recipe> = Arc::new(JaxRsToSpring::new());
        let names: Vec<String> = flatten(&recipe).iter().map(|r| r.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["jaxrs-to-spring", "change-type", "change-type", "change-type"]
        );
    }
}
