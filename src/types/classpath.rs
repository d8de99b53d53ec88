//! Bundled library stubs.
//!
//! Declarations only, written as Java and parsed with the same parser as
//! user code. They give the type table the supertypes, methods and
//! meta-annotations of the library types that recipes match against.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::core::ParseError;
use crate::parser::{CompilationUnit, JavaParser};

const STUBS: &[(&str, &str)] = &[
    ("java.lang", include_str!("classpath/java_lang.java")),
    ("java.lang.annotation", include_str!("classpath/java_lang_annotation.java")),
    ("java.io", include_str!("classpath/java_io.java")),
    ("java.util", include_str!("classpath/java_util.java")),
    ("javax.ws.rs", include_str!("classpath/javax_ws_rs.java")),
    ("javax.ws.rs.core", include_str!("classpath/javax_ws_rs_core.java")),
    (
        "org.springframework.web.bind.annotation",
        include_str!("classpath/spring_web_bind_annotation.java"),
    ),
    ("org.springframework.stereotype", include_str!("classpath/spring_stereotype.java")),
    (
        "org.springframework.data.repository",
        include_str!("classpath/spring_data_repository.java"),
    ),
    (
        "org.springframework.data.repository.query",
        include_str!("classpath/spring_data_repository_query.java"),
    ),
    (
        "org.springframework.data.jpa.repository",
        include_str!("classpath/spring_data_jpa_repository.java"),
    ),
];

static PARSED: Lazy<Result<Vec<Arc<CompilationUnit>>, ParseError>> = Lazy::new(|| {
    let parser = JavaParser::new();
    STUBS
        .iter()
        .map(|(_, source)| parser.parse_text(source).map(Arc::new))
        .collect()
});

/// Parsed stub compilation units, one per package. Parsed once per process.
pub fn stub_units() -> Result<Vec<Arc<CompilationUnit>>, ParseError> {
    PARSED.clone()
}

/// Packages covered by the stubs.
pub fn stub_packages() -> impl Iterator<Item = &'static str> {
    STUBS.iter().map(|(package, _)| *package)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_stubs_parse() {
        let units = stub_units().unwrap();
        assert_eq!(units.len(), STUBS.len());
        for (unit, package) in units.iter().zip(stub_packages()) {
            assert_eq!(unit.package_name(), package);
        }
    }
}
