mod cli;

use std::error::Error;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xsd_bindgen::binding::{BindingMode, BindingPolicy};
use xsd_bindgen::diagnostics::ConsoleDiagnostics;
use xsd_bindgen::generator::{Compiler, RenderedModule, RustSourceSink};
use xsd_bindgen::xsd::import::{FileImportResolver, ImportResolver};
use xsd_bindgen::xsd::reader::read_schema_set;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = cli::Cli::parse();
    if let Err(error) = run(cli) {
        tracing::error!("{error}");
        std::process::exit(1);
    }
}

fn run(cli: cli::Cli) -> Result<(), Box<dyn Error>> {
    let text = if cli.input.starts_with("http://") || cli.input.starts_with("https://") {
        reqwest::blocking::get(cli.input.as_str())?
            .error_for_status()?
            .text()?
    } else {
        std::fs::read_to_string(&cli.input)?
    };

    let options = roxmltree::ParsingOptions {
        allow_dtd: cli.allow_dtd,
        ..Default::default()
    };
    let document = roxmltree::Document::parse_with_options(&text, options)?;

    let base_dir = Path::new(&cli.input)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let resolvers: Vec<Box<dyn ImportResolver>> = vec![Box::new(FileImportResolver::new(base_dir))];

    let mut diagnostics = ConsoleDiagnostics;
    let (root, set) = read_schema_set(
        &document,
        Some(cli.input.clone()),
        &resolvers,
        &mut diagnostics,
    )?;

    let current_dir = std::env::current_dir()?.to_string_lossy().into_owned();
    let mode = match cli.mode {
        cli::Mode::Element => BindingMode::ElementCentric,
        cli::Mode::Type => BindingMode::TypeCentric,
    };
    let mut policy = BindingPolicy::new(mode, current_dir);
    for mapping in &cli.map {
        let Some((namespace, package)) = mapping.split_once('=') else {
            return Err(format!("invalid --map value (expected NAMESPACE=PACKAGE): {mapping}").into());
        };
        policy.set_namespace_package(namespace, package);
    }

    let mut sink = RustSourceSink::new();
    {
        let mut compiler = Compiler::new(policy, &mut sink, &mut diagnostics);
        compiler.set_generate_imports(cli.generate_imported);
        compiler.compile(&set, root, cli.package.as_deref())?;
    }

    for module in sink.finish() {
        write_module(cli.out_dir.as_deref(), module)?;
    }
    Ok(())
}

fn write_module(out_dir: Option<&Path>, module: RenderedModule) -> Result<(), Box<dyn Error>> {
    match out_dir {
        Some(out_dir) => {
            let mut dir = out_dir.to_path_buf();
            if let Some(package) = &module.package {
                for segment in package.split('.') {
                    dir.push(segment);
                }
            }
            std::fs::create_dir_all(&dir)?;
            let path = dir.join("mod.rs");
            std::fs::write(&path, module.source)?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            if let Some(package) = &module.package {
                println!("// package: {package}");
            }
            print!("{}", module.source);
        }
    }
    Ok(())
}
