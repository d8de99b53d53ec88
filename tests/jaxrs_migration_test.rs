/*!
# JAX-RS → Spring migration through the runner

Resources are written to a temporary project and rewritten in place.
*/

use pretty_assertions::assert_eq;
use spring_rewrite::recipes::JaxRsToSpring;
use spring_rewrite::{FileStatus, Recipe, RecipeRunner, RunOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const RESOURCE: &str = r#"package com.example.troopers;

import javax.ws.rs.GET;
import javax.ws.rs.Path;
import javax.ws.rs.PathParam;
import javax.ws.rs.Produces;

/**
 * Stormtrooper REST resource.
 */
@Path("/troopers")
@Produces("application/json")
public class TrooperResource {

    // lookup by id
    @Path("/{id}")
    @GET
    public String get(@PathParam("id") String id) {
        return id; // echo
    }
}
"#;

fn recipes() -> Vec<Arc<dyn Recipe>> {
    vec![Arc::new(JaxRsToSpring::new())]
}

fn project(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let paths = files
        .iter()
        .map(|(name, text)| {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, text).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

#[test]
fn test_resource_is_migrated() {
    let (_dir, paths) = project(&[("src/TrooperResource.java", RESOURCE)]);
    let results = RecipeRunner::new(&recipes(), RunOptions::default()).run(&paths).unwrap();

    let file = &results.files[0];
    assert_eq!(file.status, FileStatus::Changed);
    assert!(file.errors.is_empty(), "{:?}", file.errors);
    assert_eq!(file.applied_recipes, vec!["jaxrs-to-spring", "change-type"]);

    let text = fs::read_to_string(&paths[0]).unwrap();
    assert!(text.contains("@RequestMapping(\"/troopers\")\n@Produces(\"application/json\")\npublic class TrooperResource {"));
    assert!(text.contains(
        "    // lookup by id\n    @GetMapping(\"/{id}\")\n    public String get(@PathVariable(\"id\") String id) {\n        return id; // echo\n    }"
    ));
    assert!(text.contains("/**\n * Stormtrooper REST resource.\n */\n"));

    for import in [
        "import javax.ws.rs.Produces;",
        "import org.springframework.web.bind.annotation.GetMapping;",
        "import org.springframework.web.bind.annotation.PathVariable;",
        "import org.springframework.web.bind.annotation.RequestMapping;",
    ] {
        assert!(text.contains(import), "missing {}", import);
    }
    for import in ["javax.ws.rs.GET;", "javax.ws.rs.Path;", "javax.ws.rs.PathParam;"] {
        assert!(!text.contains(import), "left over {}", import);
    }
}

#[test]
fn test_migration_is_idempotent() {
    let (_dir, paths) = project(&[("TrooperResource.java", RESOURCE)]);
    let runner = RecipeRunner::new(&recipes(), RunOptions::default());
    runner.run(&paths).unwrap();
    let once = fs::read_to_string(&paths[0]).unwrap();

    let again = runner.run(&paths).unwrap();
    assert_eq!(again.files[0].status, FileStatus::Unchanged);
    assert_eq!(fs::read_to_string(&paths[0]).unwrap(), once);
}

#[test]
fn test_files_without_jaxrs_are_untouched() {
    let plain = "package com.example;\n\n@Deprecated\nclass Plain {\n    @Override public String toString() { return \"\"; }\n}\n";
    let (_dir, paths) = project(&[("Plain.java", plain), ("TrooperResource.java", RESOURCE)]);
    let results = RecipeRunner::new(&recipes(), RunOptions::default()).run(&paths).unwrap();

    assert_eq!(results.file(&paths[0]).unwrap().status, FileStatus::Unchanged);
    assert_eq!(fs::read_to_string(&paths[0]).unwrap(), plain);
    assert_eq!(results.file(&paths[1]).unwrap().status, FileStatus::Changed);
}

#[test]
fn test_multiple_http_methods_in_source_order() {
    let source = "import javax.ws.rs.*;\n\n@Path(\"/troopers\")\nclass R {\n    @PUT\n    @POST\n    @Path(\"/{id}\")\n    void save(@QueryParam(\"force\") boolean force) {}\n}\n";
    let (_dir, paths) = project(&[("R.java", source)]);
    RecipeRunner::new(&recipes(), RunOptions::default()).run(&paths).unwrap();

    let text = fs::read_to_string(&paths[0]).unwrap();
    assert!(text.contains("    @RequestMapping(value = \"/{id}\", method = {PUT, POST})\n    void save(@RequestParam(\"force\") boolean force) {}"));
    assert!(text.contains("import static org.springframework.web.bind.annotation.RequestMethod.POST;"));
    assert!(text.contains("import static org.springframework.web.bind.annotation.RequestMethod.PUT;"));
    assert!(!text.contains("javax.ws.rs"));
}

#[test]
fn test_wildcard_import_kept_for_unlisted_jaxrs_types() {
    let source = "import javax.ws.rs.*;\n\nclass R {\n    @GET\n    public String get() {\n        throw new BadRequestException();\n    }\n}\n";
    let (_dir, paths) = project(&[("R.java", source)]);
    RecipeRunner::new(&recipes(), RunOptions::default()).run(&paths).unwrap();

    assert_eq!(
        fs::read_to_string(&paths[0]).unwrap(),
        "import javax.ws.rs.*;\nimport org.springframework.web.bind.annotation.GetMapping;\n\nclass R {\n    @GetMapping\n    public String get() {\n        throw new BadRequestException();\n    }\n}\n"
    );
}
