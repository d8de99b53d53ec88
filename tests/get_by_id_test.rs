/*!
# Custom `getById` on JPA repositories

`JpaRepository.getById(ID)` became a reserved signature; repositories that
declare their own are renamed to `get<Entity>ById`.
*/

use pretty_assertions::assert_eq;
use spring_rewrite::recipes::{FindCustomGetById, RenameCustomGetById};
use spring_rewrite::{FileStatus, Recipe, RecipeRunner, RunOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const ENTITY: &str = "package com.example;\n\npublic class Trooper {\n    String id;\n}\n";

const REPOSITORY: &str = "package com.example;

import org.springframework.data.jpa.repository.JpaRepository;

public interface TrooperRepository extends JpaRepository<Trooper, String> {
    Trooper getById(String id);
}
";

fn write_project(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let paths = files
        .iter()
        .map(|(name, text)| {
            let path = dir.path().join(name);
            fs::write(&path, text).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

#[test]
fn test_find_reports_position() {
    let (_dir, paths) = write_project(&[("Trooper.java", ENTITY), ("TrooperRepository.java", REPOSITORY)]);
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(FindCustomGetById)];
    let results = RecipeRunner::new(
        &recipes,
        RunOptions {
            dry_run: true,
            ..Default::default()
        },
    )
    .run(&paths)
    .unwrap();

    let repository = results.file(&paths[1]).unwrap();
    assert_eq!(repository.status, FileStatus::Unchanged);
    assert_eq!(repository.findings.len(), 1);
    let finding = &repository.findings[0];
    assert_eq!(finding.recipe, "find-custom-get-by-id");
    let position = finding.position.unwrap();
    assert_eq!((position.line, position.column), (6, 13));
    assert!(results.file(&paths[0]).unwrap().findings.is_empty());
}

#[test]
fn test_rename_in_repository() {
    let (_dir, paths) = write_project(&[("Trooper.java", ENTITY), ("TrooperRepository.java", REPOSITORY)]);
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameCustomGetById)];
    let results = RecipeRunner::new(&recipes, RunOptions::default()).run(&paths).unwrap();

    assert_eq!(results.changed_count(), 1);
    assert_eq!(
        fs::read_to_string(&paths[1]).unwrap(),
        REPOSITORY.replace("Trooper getById(String id);", "Trooper getTrooperById(String id);")
    );
    assert_eq!(fs::read_to_string(&paths[0]).unwrap(), ENTITY);
}

#[test]
fn test_other_signature_untouched() {
    let repository = REPOSITORY.replace("Trooper getById(String id);", "Trooper getById(Long id);");
    let (_dir, paths) = write_project(&[("Trooper.java", ENTITY), ("TrooperRepository.java", &repository)]);
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameCustomGetById)];
    let results = RecipeRunner::new(&recipes, RunOptions::default()).run(&paths).unwrap();

    assert_eq!(results.changed_count(), 0);
    assert_eq!(fs::read_to_string(&paths[1]).unwrap(), repository);
}

#[test]
fn test_entity_from_classpath() {
    let classpath = TempDir::new().unwrap();
    fs::write(classpath.path().join("Trooper.java"), ENTITY).unwrap();
    let (_dir, paths) = write_project(&[("TrooperRepository.java", REPOSITORY)]);

    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameCustomGetById)];
    let options = RunOptions {
        classpath: vec![classpath.path().to_path_buf()],
        ..Default::default()
    };
    RecipeRunner::new(&recipes, options).run(&paths).unwrap();

    assert!(fs::read_to_string(&paths[0]).unwrap().contains("Trooper getTrooperById(String id);"));
    assert_eq!(fs::read_to_string(classpath.path().join("Trooper.java")).unwrap(), ENTITY);
}

#[test]
fn test_callers_in_other_files_are_renamed() {
    let service = "package com.example;

public class TrooperService {
    private final TrooperRepository repo;

    public TrooperService(TrooperRepository repo) {
        this.repo = repo;
    }

    public Trooper find(String id) {
        return repo.getById(id);
    }
}
";
    let (_dir, paths) = write_project(&[
        ("Trooper.java", ENTITY),
        ("TrooperRepository.java", REPOSITORY),
        ("TrooperService.java", service),
    ]);
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(RenameCustomGetById)];
    let results = RecipeRunner::new(&recipes, RunOptions::default()).run(&paths).unwrap();

    assert_eq!(results.changed_count(), 2);
    assert_eq!(results.file(&paths[2]).unwrap().status, FileStatus::Changed);
    assert_eq!(
        fs::read_to_string(&paths[2]).unwrap(),
        service.replace("repo.getById(id)", "repo.getTrooperById(id)")
    );
    assert!(fs::read_to_string(&paths[1]).unwrap().contains("Trooper getTrooperById(String id);"));
}
