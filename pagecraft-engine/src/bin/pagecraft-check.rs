use pagecraft_engine::{
    render_fallback, CompileContext, CompileError, Compiler, ComponentLibrary, EngineConfig,
    EngineError, Theme,
};
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PAGECRAFT_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut theme_path = None;
    let mut files = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--theme" => theme_path = args.next(),
            _ => files.push(arg),
        }
    }

    if files.is_empty() {
        eprintln!("Usage: pagecraft-check [--theme theme.json] <library.yaml|library.json>...");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  pagecraft-check components.yaml");
        eprintln!("  pagecraft-check --theme brand.json library/*.json");
        process::exit(1);
    }

    let theme = match theme_path.as_deref().map(load_theme).transpose() {
        Ok(theme) => theme.unwrap_or_default(),
        Err(e) => {
            eprintln!("✗ theme could not be loaded: {}", e);
            process::exit(1);
        }
    };
    let compiler = Compiler::new(EngineConfig::default());

    let mut exit_code = 0;
    for file_path in files {
        match check_file(&compiler, &theme, Path::new(&file_path)) {
            Ok(0) => {}
            Ok(_) => exit_code = 1,
            Err(e) => {
                eprintln!("✗ {} could not be loaded:", file_path);
                eprintln!("    {}", e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn load_theme(path: &str) -> Result<Theme, EngineError> {
    let content = fs::read_to_string(path)?;
    Theme::from_json(&content)
}

/// Renders every definition of one library file, returning the failure count.
fn check_file(compiler: &Compiler, theme: &Theme, path: &Path) -> Result<usize, EngineError> {
    let library = ComponentLibrary::load(path)?;
    let mut failures = 0;
    for definition in library.definitions() {
        let props = definition.normalized_defaults();
        if !definition.has_source() {
            let node = render_fallback(definition.category(), &props);
            println!(
                "✓ {} (fallback {}, {} bytes)",
                definition.id,
                definition.category(),
                node.to_html().len()
            );
            continue;
        }
        match compiler.render(&definition.source_text, &props, CompileContext::default()) {
            Ok(node) => {
                let classes = pagecraft_engine::tailwind::extract_classes(&node.to_html());
                let themed = classes.iter().filter(|c| c.contains("-theme-")).count();
                println!("✓ {} renders ({} themed classes)", definition.id, themed);
            }
            Err(e) => {
                eprintln!("✗ {} failed:", definition.id);
                print_error(&e);
                failures += 1;
            }
        }
    }
    if failures == 0 {
        let stylesheet = pagecraft_engine::theme::synthesize(theme, compiler.config());
        println!(
            "✓ {}: {} components, theme stylesheet {} bytes",
            path.display(),
            library.len(),
            stylesheet.len()
        );
    }
    Ok(failures)
}

fn print_error(error: &CompileError) {
    match error.location {
        Some(loc) => eprintln!(
            "  {:?} error at line {}, column {}:",
            error.kind, loc.line, loc.column
        ),
        None => eprintln!("  {:?} error:", error.kind),
    }
    eprintln!("    {}", error.message);
}
