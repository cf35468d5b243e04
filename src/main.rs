//! valuegen CLI - Command-line interface
//!
//! Commands:
//!   generate - Generate value class implementations from declarations
//!   options  - List the processor options understood by the configured extensions
//!   schema   - Print JSON schema of the input formats
//!   version  - Print version

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use valuegen::*;

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "generate" | "gen" => cmd_generate(&args[2..]),
        "options" => cmd_options(&args[2..]),
        "schema" => cmd_schema(&args[2..]),
        "version" | "--version" | "-v" => {
            println!("valuegen {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!(
        r#"
valuegen - value class implementation generator

USAGE:
    valuegen <COMMAND> [OPTIONS]

COMMANDS:
    generate <decls.yaml>            Generate implementations for every value class
    options                          List supported processor options
    schema [decls|config]            Print JSON schema for an input format
    version                          Print version

OPTIONS:
    --config <valuegen.yaml>         Processor configuration
    --out <dir>                      Output directory (default: generated)
    --ext <id,id,...>                Built-in extensions to run, overriding the config
                                      ({})
    -A<key>=<value>                  Processor option, passed to extensions

ENVIRONMENT:
    RUST_LOG                         Log filter (default: warn)

EXAMPLES:
    valuegen generate types.yaml --out src/generated
    valuegen generate types.yaml --ext serializable -Avaluegen.prefix=Auto_
    valuegen schema decls > decls.schema.json
"#,
        builtin::BUILTIN_NAMES.join(", ")
    );
}

fn cmd_generate(args: &[String]) -> Result<()> {
    let decls_path = args
        .iter()
        .find(|a| !a.starts_with('-') && !is_flag_value(args, a))
        .ok_or("Usage: valuegen generate <decls.yaml> [--config FILE] [--out DIR]")?;

    let decls = Declarations::load(Path::new(decls_path))?;
    let config = load_config(args)?;
    let universe = TypeUniverse::from_decls(&decls)?;
    let extensions = builtin::from_names(&extension_names(args, &config))?;

    let out = flag_value(args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("generated"));
    let mut options = config.options.clone();
    options.extend(processor_options(args)?);
    let env = Env::new(CollectingMessager::new(), FsFiler::new(&out)).with_options(options);

    let render = config.render_config().with_declarations(&decls);
    let processor = Processor::new(extensions, config).with_render_config(render);
    let report = processor.process(&universe, &env);

    for diagnostic in env.messager.diagnostics() {
        eprintln!("{}", diagnostic);
    }
    for class in &report.generated {
        for file in &class.files {
            println!("{}", env.filer.path_for(file).display());
        }
    }

    if env.messager.has_errors() {
        return Err(format!(
            "{} value class(es) failed: {}",
            report.failed.len(),
            report.failed.join(", ")
        )
        .into());
    }
    eprintln!(
        "Generated {} value class(es) into {}",
        report.generated.len(),
        out.display()
    );
    Ok(())
}

fn cmd_options(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let extensions = builtin::from_names(&extension_names(args, &config))?;
    let processor = Processor::new(extensions, config);
    for option in processor.supported_options() {
        println!("{}", option);
    }
    Ok(())
}

fn cmd_schema(args: &[String]) -> Result<()> {
    let schema_name = args.first().map(|s| s.as_str()).unwrap_or("list");

    match schema_name {
        "list" => {
            println!("Available schemas: decls, config");
            Ok(())
        }
        "decls" => print_schema::<Declarations>(),
        "config" => print_schema::<ProcessorConfig>(),
        _ => Err(format!("Unknown schema: {}", schema_name).into()),
    }
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_config(args: &[String]) -> Result<ProcessorConfig> {
    match flag_value(args, "--config") {
        Some(path) => ProcessorConfig::load(Path::new(path)),
        None => Ok(ProcessorConfig::default()),
    }
}

fn extension_names(args: &[String], config: &ProcessorConfig) -> Vec<String> {
    match flag_value(args, "--ext") {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => config.extensions.clone(),
    }
}

/// `-Akey=value` pairs
fn processor_options(args: &[String]) -> Result<BTreeMap<String, String>> {
    let mut options = BTreeMap::new();
    for arg in args {
        if let Some(option) = arg.strip_prefix("-A") {
            let (key, value) = option.split_once('=').unwrap_or((option, ""));
            if key.is_empty() {
                return Err(format!("Malformed option: {}", arg).into());
            }
            options.insert(key.to_string(), value.to_string());
        }
    }
    Ok(options)
}

const VALUE_FLAGS: &[&str] = &["--config", "--out", "--ext"];

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn is_flag_value(args: &[String], candidate: &String) -> bool {
    args.windows(2)
        .any(|w| VALUE_FLAGS.contains(&w[0].as_str()) && std::ptr::eq(&w[1], candidate))
}
