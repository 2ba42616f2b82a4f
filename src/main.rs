use pywrap::descriptor::{DescriptorArenas, DescriptorFile, DescriptorSet};
use pywrap::generate::{self, Error, PythonRenamer, Settings};

use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("C++ to Cython wrapper generator")
        .version(clap::crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Generate ownership-safe Cython wrappers from C++ class descriptors")
        .arg(
            Arg::new("module")
                .long("module")
                .value_name("NAME")
                .help("Extension module name (defaults to the descriptor file's, then its stem)"),
        )
        .arg(
            Arg::new("output directory")
                .long("output-directory")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Directory the generated files are written to"),
        )
        .arg(
            Arg::new("include")
                .long("include-dir")
                .short('I')
                .value_name("DIR")
                .action(ArgAction::Append)
                .help("Include directory for the generated `setup.py`"),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Extra C++ source compiled into the extension"),
        )
        .arg(
            Arg::new("keep names")
                .long("keep-names")
                .action(ArgAction::SetTrue)
                .help("Do not convert method and property names to snake_case"),
        )
        .arg(
            Arg::new("strict ownership")
                .long("strict-ownership")
                .action(ArgAction::SetTrue)
                .help("Fail classes whose ownership had to be guessed"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Descriptor set (JSON) to generate wrappers for")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .index(1),
        )
        .get_matches();

    let input = matches
        .get_one::<PathBuf>("INPUT")
        .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, "no input")))?;
    log::info!("Reading descriptors from '{}'", input.display());
    let mut file = DescriptorFile::from_json(&fs::read_to_string(input)?)?;

    let module_name = match (matches.get_one::<String>("module"), file.module.take()) {
        (Some(name), _) => name.clone(),
        (None, Some(name)) => name,
        (None, None) => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let mut settings = Settings::new(module_name)?;
    settings.strict_ownership = matches.get_flag("strict ownership");
    if matches.get_flag("keep names") {
        settings.renamer = Box::new(PythonRenamer::keeping_case());
    }
    if let Some(dirs) = matches.get_many::<String>("include") {
        settings.include_dirs.extend(dirs.cloned());
    }
    if let Some(sources) = matches.get_many::<String>("source") {
        settings.sources.extend(sources.cloned());
    }

    let arenas = DescriptorArenas::new();
    let set = DescriptorSet::new(&arenas);
    set.load(file);
    let generated = generate::generate(&set, &settings)?;

    // Write out the results
    let output_dir = matches
        .get_one::<PathBuf>("output directory")
        .cloned()
        .unwrap_or_default();
    fs::create_dir_all(&output_dir)?;
    for (file_name, contents) in &generated.files {
        let path = output_dir.join(file_name);
        log::info!("Writing '{}'", path.display());
        fs::write(&path, contents)?;
    }

    log::info!(
        "Wrapped {} classes ({} diagnostics)",
        generated.wrapped.len(),
        generated.diagnostics.len()
    );
    if !generated.is_complete() {
        log::error!(
            "{} classes could not be wrapped",
            generated.failures.len()
        );
        process::exit(1);
    }

    Ok(())
}
