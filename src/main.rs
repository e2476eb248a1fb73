use std::path::Path;
use std::process::ExitCode;

use bumpalo::Bump;
use php_frontend::parse_unit;
use php_frontend::registry::Registry;
use php_frontend::source::SourceUnit;
use php_frontend::token::Token;
use walkdir::WalkDir;

const TOKEN_SUFFIX: &str = ".tokens.json";

fn main() -> ExitCode {
    let root = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let arena = Bump::new();
    let registry = Registry::new();
    let mut had_errors = false;

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("error: {err}");
                had_errors = true;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !name.ends_with(TOKEN_SUFFIX) {
            continue;
        }
        if !parse_one(&arena, &registry, Path::new(&root), entry.path()) {
            had_errors = true;
        }
    }

    eprintln!(
        "parsed {} functions, {} classes",
        registry.function_count(),
        registry.class_count()
    );
    if had_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn parse_one<'ast>(arena: &'ast Bump, registry: &Registry<'ast>, root: &Path, path: &Path) -> bool {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            return false;
        }
    };
    let tokens: Vec<Token> = match serde_json::from_str(&data) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("{}: bad token stream: {err}", path.display());
            return false;
        }
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    let file_name = relative
        .to_string_lossy()
        .trim_end_matches(TOKEN_SUFFIX)
        .to_string()
        + ".php";
    let relative_dir = relative
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    let unit = SourceUnit::new(&file_name, &relative_dir);
    match parse_unit(arena, registry, unit, &tokens) {
        Ok(output) => {
            let mut ok = true;
            for diag in &output.diagnostics {
                eprintln!("{file_name}:{}: {:?}: {}", diag.loc.line, diag.severity, diag.message);
                if diag.severity == php_frontend::diag::Severity::Error {
                    ok = false;
                }
            }
            ok
        }
        Err(fatal) => {
            eprintln!("{file_name}: {fatal}");
            false
        }
    }
}
