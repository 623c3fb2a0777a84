//! JUnit 4 source files for a list of executed sequences.
//!
//! Tests are spread over `<Base>0.java`, `<Base>1.java`, ... with at most
//! `tests_per_file` methods each, and a `<Base>.java` suite class lists
//! them. A file whose content hash matches what is already on disk is
//! left untouched.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use seqgen_check::ExecutableSequence;
use seqgen_core::TypeRegistry;
use tracing::{debug, info};

use crate::error::CodegenError;
use crate::printer::SequencePrinter;
use crate::{JUnitOptions, WriteResult};

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const", "continue",
    "default", "do", "double", "else", "enum", "extends", "final", "finally", "float", "for", "goto", "if",
    "implements", "import", "instanceof", "int", "interface", "long", "native", "new", "package", "private",
    "protected", "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "try", "void", "volatile", "while", "true", "false", "null",
];

fn is_java_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !JAVA_KEYWORDS.contains(&s)
}

fn validate(options: &JUnitOptions) -> Result<(), CodegenError> {
    if let Some(package) = &options.package {
        if !package.split('.').all(is_java_identifier) {
            return Err(CodegenError::InvalidPackage(package.clone()));
        }
    }
    if !is_java_identifier(&options.class_name) {
        return Err(CodegenError::InvalidClassName(options.class_name.clone()));
    }
    Ok(())
}

/// Directory the sources of `options` go to.
pub fn package_dir(options: &JUnitOptions) -> PathBuf {
    let mut dir = options.output_dir.clone();
    if let Some(package) = &options.package {
        dir.extend(package.split('.'));
    }
    dir
}

fn header(out: &mut String, options: &JUnitOptions) {
    if let Some(package) = &options.package {
        let _ = writeln!(out, "package {package};\n");
    }
}

/// Source of one test class holding `bodies`.
fn test_class(options: &JUnitOptions, class: &str, bodies: &[Vec<String>]) -> String {
    let width = bodies.len().to_string().len();
    let mut out = String::new();
    header(&mut out, options);
    out.push_str("import org.junit.FixMethodOrder;\n");
    out.push_str("import org.junit.Test;\n");
    out.push_str("import org.junit.runners.MethodSorters;\n\n");
    out.push_str("@FixMethodOrder(MethodSorters.NAME_ASCENDING)\n");
    let _ = writeln!(out, "public class {class} {{\n");
    let _ = writeln!(out, "    public static boolean debug = {};", options.debug);

    for (i, body) in bodies.iter().enumerate() {
        let method = format!("test{:0width$}", i + 1);
        out.push('\n');
        out.push_str("    @Test\n");
        let _ = writeln!(out, "    public void {method}() throws Throwable {{");
        out.push('\n');
        let _ = writeln!(out, "        if ({class}.debug)");
        let _ = writeln!(out, "            System.out.format(\"%n%s%n\", \"{class}.{method}\");");
        out.push('\n');
        for line in body {
            let _ = writeln!(out, "        {line}");
        }
        out.push_str("    }\n");
    }
    out.push_str("}\n");
    out
}

fn suite_class(options: &JUnitOptions, classes: &[String]) -> String {
    let mut out = String::new();
    header(&mut out, options);
    out.push_str("import org.junit.runner.RunWith;\n");
    out.push_str("import org.junit.runners.Suite;\n\n");
    out.push_str("@RunWith(Suite.class)\n");
    let listed: Vec<String> = classes.iter().map(|c| format!("{c}.class")).collect();
    let _ = writeln!(out, "@Suite.SuiteClasses({{ {} }})", listed.join(", "));
    let _ = writeln!(out, "public class {} {{\n}}", options.class_name);
    out
}

/// Writes `content` to `path` unless the file already holds exactly it.
/// Returns whether the file was written.
fn write_if_changed(path: &Path, content: &str) -> Result<bool, CodegenError> {
    if let Ok(existing) = std::fs::read(path) {
        if blake3::hash(&existing) == blake3::hash(content.as_bytes()) {
            debug!(path = %path.display(), "unchanged");
            return Ok(false);
        }
    }
    std::fs::write(path, content).map_err(|source| CodegenError::Write { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), bytes = content.len(), "wrote test source");
    Ok(true)
}

/// Renders `tests` into test classes plus a suite under
/// [`package_dir`]. Nothing is written for an empty list.
pub fn write_tests(
    types: &TypeRegistry,
    tests: &[&ExecutableSequence],
    options: &JUnitOptions,
) -> Result<WriteResult, CodegenError> {
    let start = Instant::now();
    validate(options)?;
    let mut result = WriteResult::default();
    if tests.is_empty() {
        return Ok(result);
    }

    let printer = SequencePrinter::new(types);
    let bodies = tests.iter().map(|eseq| printer.print(eseq)).collect::<Result<Vec<_>, _>>()?;

    let dir = package_dir(options);
    std::fs::create_dir_all(&dir)?;

    let per_file = options.tests_per_file.max(1);
    let mut classes = Vec::new();
    for (n, chunk) in bodies.chunks(per_file).enumerate() {
        let class = format!("{}{n}", options.class_name);
        let path = dir.join(format!("{class}.java"));
        let source = test_class(options, &class, chunk);
        if write_if_changed(&path, &source)? {
            result.written += 1;
        } else {
            result.unchanged += 1;
        }
        result.files.push(path);
        classes.push(class);
    }

    let suite = dir.join(format!("{}.java", options.class_name));
    if write_if_changed(&suite, &suite_class(options, &classes))? {
        result.written += 1;
    } else {
        result.unchanged += 1;
    }
    result.files.push(suite);

    result.tests = tests.len();
    result.write_time_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_reject_keywords_and_digits() {
        assert!(is_java_identifier("RegressionTest"));
        assert!(is_java_identifier("demo_1"));
        assert!(!is_java_identifier("1demo"));
        assert!(!is_java_identifier("class"));
        assert!(!is_java_identifier(""));
    }

    #[test]
    fn invalid_package_is_rejected() {
        let options = JUnitOptions { package: Some("demo..tests".into()), ..JUnitOptions::default() };
        assert!(matches!(validate(&options), Err(CodegenError::InvalidPackage(_))));
        let options = JUnitOptions { class_name: "new".into(), ..JUnitOptions::default() };
        assert!(matches!(validate(&options), Err(CodegenError::InvalidClassName(_))));
    }

    #[test]
    fn methods_are_numbered_with_padding() {
        let bodies = vec![vec!["int i0 = 1;".to_string()]; 12];
        let source = test_class(&JUnitOptions::default(), "RegressionTest0", &bodies);
        assert!(source.contains("public void test01() throws Throwable {"));
        assert!(source.contains("public void test12() throws Throwable {"));
        assert!(source.contains("        int i0 = 1;\n"));
        assert!(!source.starts_with("package"));
    }

    #[test]
    fn suite_lists_every_class() {
        let options = JUnitOptions { package: Some("demo.tests".into()), ..JUnitOptions::default() };
        let source = suite_class(&options, &["RegressionTest0".into(), "RegressionTest1".into()]);
        assert!(source.starts_with("package demo.tests;\n"));
        assert!(source.contains("@Suite.SuiteClasses({ RegressionTest0.class, RegressionTest1.class })"));
        assert!(source.contains("public class RegressionTest {"));
    }
}
