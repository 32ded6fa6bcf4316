use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{Program, Stmt};
use crate::error::{CompileError, Warning};
use crate::parser::Parser;
use crate::scanner;

/// Result of parsing a file: the spliced program plus any non-fatal
/// diagnostics raised while resolving includes.
#[derive(Debug)]
pub struct Parsed {
    pub program: Program,
    pub warnings: Vec<Warning>,
}

/// Resolves `include` directives for one parse run.
///
/// Every file is read at most once per loader; later includes of an already
/// visited file contribute nothing.
#[derive(Debug, Default)]
pub struct Loader {
    visited: HashSet<PathBuf>,
    warnings: Vec<Warning>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the root file, splicing in everything it includes.
    pub fn load(&mut self, path: &Path) -> Result<Program, CompileError> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            CompileError::include(format!("cannot read '{}'", path.display()), Some(e))
        })?;
        self.visited.insert(canonical.clone());
        self.parse_file_at(path, &canonical, None)
    }

    /// Resolve `target` relative to the directory of `origin` and return the
    /// statements to splice at the inclusion point.
    pub(crate) fn include(
        &mut self,
        origin: &Path,
        target: &str,
    ) -> Result<Vec<Stmt>, CompileError> {
        let joined = origin
            .parent()
            .map_or_else(|| PathBuf::from(target), |dir| dir.join(target));
        let canonical = fs::canonicalize(&joined).map_err(|e| {
            CompileError::include(
                format!(
                    "cannot read '{}' (included from '{}')",
                    joined.display(),
                    origin.display()
                ),
                Some(e),
            )
        })?;

        if canonical == origin {
            let warning = Warning::new(format!("file '{}' is including itself", joined.display()));
            tracing::warn!(file = %joined.display(), "{warning}");
            self.warnings.push(warning);
        }

        if !self.visited.insert(canonical.clone()) {
            tracing::debug!(file = %canonical.display(), "skipping already included file");
            return Ok(Vec::new());
        }

        tracing::debug!(file = %canonical.display(), from = %origin.display(), "including file");
        let program = self.parse_file_at(&joined, &canonical, Some(origin))?;
        Ok(program.declarations)
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    fn parse_file_at(
        &mut self,
        display_path: &Path,
        canonical: &Path,
        included_from: Option<&Path>,
    ) -> Result<Program, CompileError> {
        let source = fs::read_to_string(canonical).map_err(|e| {
            let message = match included_from {
                Some(origin) => format!(
                    "cannot read '{}' (included from '{}')",
                    display_path.display(),
                    origin.display()
                ),
                None => format!("cannot read '{}'", display_path.display()),
            };
            CompileError::include(message, Some(e))
        })?;

        let name = display_path.display().to_string();
        let tokens =
            scanner::scan(&source).map_err(|e| e.with_source_code(name.as_str(), source.as_str()))?;
        Parser::new(tokens)
            .with_source(name, source)
            .with_loader(self, canonical)
            .parse()
    }
}

/// Parse `path` and every file it includes, with a fresh visited set.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Parsed, CompileError> {
    let path = path.as_ref();
    tracing::debug!(file = %path.display(), "parsing file");
    let mut loader = Loader::new();
    let program = loader.load(path)?;
    Ok(Parsed {
        program,
        warnings: loader.into_warnings(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::printer::to_sexp;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn include_splices_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "lib.clb", "func helper(): int { return 1; }");
        let main = write(
            dir.path(),
            "main.clb",
            "func first(): void {}\ninclude \"lib.clb\";\nfunc main(): void {}",
        );

        let parsed = parse_file(&main).expect("parse");
        let names: Vec<_> = parsed
            .program
            .declarations
            .iter()
            .map(|stmt| match stmt {
                Stmt::FuncDecl(f) => f.name.as_str(),
                _ => panic!("expected function"),
            })
            .collect();
        assert_eq!(names, ["first", "helper", "main"]);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn duplicate_include_is_spliced_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        write(dir.path(), "common.clb", "func common(): void {}");
        write(dir.path(), "sub/other.clb", "include \"../common.clb\";");
        let main = write(
            dir.path(),
            "main.clb",
            "include \"common.clb\";\ninclude \"sub/other.clb\";\nfunc main(): void {}",
        );

        let parsed = parse_file(&main).expect("parse");
        assert_eq!(
            to_sexp(&parsed.program),
            "(func common () void)\n(func main () void)\n"
        );
    }

    #[test]
    fn self_include_warns_and_contributes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = write(
            dir.path(),
            "main.clb",
            "include \"main.clb\";\nfunc main(): void {}",
        );

        let parsed = parse_file(&main).expect("parse");
        assert_eq!(parsed.program.declarations.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].message.contains("is including itself"));
    }

    #[test]
    fn include_at_end_of_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "lib.clb", "func helper(): void {}");
        let main = write(dir.path(), "main.clb", "include \"lib.clb\";");

        let parsed = parse_file(&main).expect("parse");
        assert_eq!(parsed.program.declarations.len(), 1);
    }

    #[test]
    fn missing_include_names_including_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = write(dir.path(), "main.clb", "include \"nope.clb\";");

        let err = parse_file(&main).expect_err("missing include");
        let message = err.to_string();
        assert!(message.contains("nope.clb"), "{message}");
        assert!(message.contains("included from"), "{message}");
        assert!(message.contains("main.clb"), "{message}");
    }

    #[test]
    fn missing_root_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = parse_file(dir.path().join("absent.clb")).expect_err("missing file");
        assert!(matches!(err, CompileError::Include { .. }));
    }

    #[test]
    fn parse_error_in_included_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "bad.clb", "func broken(: void {}");
        let main = write(dir.path(), "main.clb", "include \"bad.clb\";");

        let err = parse_file(&main).expect_err("parse error");
        assert!(matches!(err, CompileError::Parse { line: 1, .. }), "{err}");
    }

    #[test]
    fn each_parse_starts_with_fresh_visited_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "lib.clb", "func helper(): void {}");
        let main = write(dir.path(), "main.clb", "include \"lib.clb\";");

        let first = parse_file(&main).expect("first parse");
        let second = parse_file(&main).expect("second parse");
        assert_eq!(first.program.declarations.len(), 1);
        assert_eq!(second.program.declarations.len(), 1);
    }
}
