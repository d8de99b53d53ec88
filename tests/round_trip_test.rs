/*!
# Round trip

Parsing and printing without any recipe reproduces every file byte for byte.
*/

use spring_rewrite::runner::{round_trip, SourceKind};
use spring_rewrite::{FileStatus, RecipeRunner, RunOptions};
use std::fs;
use tempfile::TempDir;

const JAVA_SOURCES: &[&str] = &[
    "",
    "class A {}",
    "// only a comment\n",
    r#"/*
 * Licensed under the Apache License, Version 2.0
 */
package com.example.troopers;

import java.util.*;
import java.util.function.Function;
import static java.util.Collections.emptyList;

@SuppressWarnings({"unchecked", "rawtypes"})
public abstract class Base<T extends Comparable<? super T>, ID> implements Function<T, ID> {

    private static final long serialVersionUID = 1L;
    protected final Map<String, List<T>> byName = new HashMap<>();
    int[] counts = {1, 2, 3}, more[];

    static {
        System.out.println("loaded"); // side effect
    }

    { counts[0]++; }

    protected Base() {
        this(null);
    }

    protected Base(ID id) throws IllegalStateException {
        super();
    }

    @Override
    public ID apply(final T value) {
        Runnable r = () -> { byName.clear(); };
        return value == null ? null : lookup(value, String.valueOf(value).length());
    }

    abstract ID lookup(T value, int... hints);

    public <R extends T> List<R> none() { return emptyList(); }

    enum State { ACTIVE("a") { @Override String code() { return "A"; } }, RETIRED("r"); final String c; State(String c) { this.c = c; } String code() { return c; } }

    @interface Audited { String value() default ""; int[] levels() default {}; }

    record Point(int x, int y) {}

    interface Visitor<R> { R visit(Point p); }
}
"#,
    "package a;\r\n\r\nimport java.util.List;\r\n\r\nclass Crlf {\r\n\tList<String> tabs;\r\n}\r\n",
    "package a; class Unicode { String s = \"Привет, мир\"; /* комментарий */ char c = '\\u00e9'; }",
];

const PROPERTIES_SOURCES: &[&str] = &[
    "",
    "# comment\n! other comment\n\nkey=value\n",
    "spring.datasource.url = jdbc:h2:mem:db\nspring.datasource.username:sa\nkey value with spaces\n",
    "multi = first \\\n    second \\\n    third\nlast",
    "  indented.key=1\r\nempty=\r\n",
];

#[test]
fn test_java_sources_round_trip() {
    for source in JAVA_SOURCES {
        assert_eq!(round_trip(SourceKind::Java, source).unwrap(), None, "{:?}", source);
    }
}

#[test]
fn test_properties_round_trip() {
    for source in PROPERTIES_SOURCES {
        assert_eq!(round_trip(SourceKind::Properties, source).unwrap(), None, "{:?}", source);
    }
}

#[test]
fn test_runner_without_matches_leaves_files_identical() {
    let dir = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for (i, source) in JAVA_SOURCES.iter().enumerate() {
        let path = dir.path().join(format!("Source{}.java", i));
        fs::write(&path, source).unwrap();
        paths.push(path);
    }

    let recipes = vec![spring_rewrite::lookup("jaxrs-to-spring", &Default::default()).unwrap()];
    let results = RecipeRunner::new(&recipes, RunOptions::default()).run(&paths).unwrap();

    for (path, source) in paths.iter().zip(JAVA_SOURCES) {
        assert_eq!(results.file(path).unwrap().status, FileStatus::Unchanged);
        assert_eq!(&fs::read_to_string(path).unwrap(), source);
    }
}
