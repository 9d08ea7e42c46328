//! Command-line front-end: a flat set of flags (no subcommands),
//! matching the shape Xcode tooling scripts expect.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use getopts::Options;
use xcodeprojer::ascii::ParserKind;
use xcodeprojer::error::CliError;
use xcodeprojer::format::Format;
use xcodeprojer::gid::{gidfields, gidsplit, GidDumpFormat};
use xcodeprojer::parseinfo::report_parse_status;

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_LINT_FAILED: u8 = 2;
const EXIT_PARSING_FAILED: u8 = 3;

fn usage(opts: &Options, program: &str) -> String {
    opts.usage(&format!("Usage: {} [options] [FILE]", program))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{}: {}", args.first().map(String::as_str).unwrap_or("xcodeprojer"), err);
            ExitCode::from(match err {
                CliError::LintFailed(_) => EXIT_LINT_FAILED,
                CliError::ParseFailed(_) => EXIT_PARSING_FAILED,
                _ => EXIT_ERROR,
            })
        }
    }
}

fn run(args: &[String]) -> Result<u8, CliError> {
    let program = args.first().cloned().unwrap_or_else(|| "xcodeprojer".to_string());

    let mut opts = Options::new();
    opts.optopt("", "convert", "convert input to FORMAT (xcode, xml, json)", "FORMAT");
    opts.optflag("", "lint", "parse then verify unparse reproduces the input exactly");
    opts.optmulti("", "gidsplit", "decode one or more gids and print their fields", "GID");
    opts.optopt("", "gid-format", "output format for --gidsplit/--giddump (text, json)", "FORMAT");
    opts.optopt("", "giddump", "dump every gid found in FILE with decoded fields", "FILE");
    opts.optopt("o", "output", "write output to PATH ('-' for stdout)", "PATH");
    opts.optflagmulti("v", "verbose", "increase logging verbosity");
    opts.optflag("h", "help", "print this help and exit");

    let matches = opts.parse(&args[1..]).map_err(|e| CliError::Usage(e.to_string()))?;

    if matches.opt_present("h") {
        println!("{}", usage(&opts, &program));
        return Ok(EXIT_OK);
    }

    init_logging(matches.opt_count("v"));

    let gid_format = match matches.opt_str("gid-format").as_deref() {
        Some("json") => GidDumpFormat::Json,
        Some("text") | None => GidDumpFormat::Text,
        Some(other) => return Err(CliError::Usage(format!("unknown --gid-format {:?}", other))),
    };

    if !matches.opt_strs("gidsplit").is_empty() {
        let mut stdout = io::stdout();
        gidsplit(&matches.opt_strs("gidsplit"), gid_format, &mut stdout)?;
        return Ok(EXIT_OK);
    }

    if let Some(file) = matches.opt_str("giddump") {
        return cmd_giddump(&file, gid_format);
    }

    let input_path = matches.free.first().cloned();
    let input_bytes = read_input(input_path.as_deref())?;

    if matches.opt_present("lint") {
        return cmd_lint(&input_bytes, input_path.as_deref());
    }

    if let Some(target_format) = matches.opt_str("convert") {
        let format: Format = target_format.parse().map_err(CliError::Usage)?;
        return cmd_convert(&input_bytes, input_path.as_deref(), format, matches.opt_str("o"));
    }

    println!("{}", usage(&opts, &program));
    Ok(EXIT_OK)
}

fn init_logging(verbosity: usize) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env().filter_level(level).init();
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>, CliError> {
    match path {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(p) => Ok(fs::read(p)?),
    }
}

fn write_output(bytes: &[u8], output: Option<String>) -> Result<(), CliError> {
    match output.as_deref() {
        None | Some("-") => {
            io::stdout().write_all(bytes)?;
            Ok(())
        }
        Some(p) => Ok(fs::write(p, bytes)?),
    }
}

fn project_name_for(path: Option<&str>) -> String {
    path.and_then(|p| xcodeprojer::projectname_for_path(&PathBuf::from(p))).unwrap_or_else(|| "Project".to_string())
}

fn cmd_convert(bytes: &[u8], path: Option<&str>, format: Format, output: Option<String>) -> Result<u8, CliError> {
    let (tree, info) = xcodeprojer::parse(bytes, Format::Auto, ParserKind::Classic);
    let Some(tree) = tree else {
        let mut msg = Vec::new();
        report_parse_status(false, &info, path, &mut msg).ok();
        return Err(CliError::ParseFailed(String::from_utf8_lossy(&msg).into_owned()));
    };
    let project_name = project_name_for(path);
    let out = xcodeprojer::unparse(&tree, format, &project_name)?;
    write_output(&out, output)?;
    Ok(EXIT_OK)
}

fn cmd_lint(bytes: &[u8], path: Option<&str>) -> Result<u8, CliError> {
    let (tree, info) = xcodeprojer::parse(bytes, Format::Auto, ParserKind::Classic);
    let Some(tree) = tree else {
        let mut msg = Vec::new();
        report_parse_status(false, &info, path, &mut msg).ok();
        return Err(CliError::ParseFailed(String::from_utf8_lossy(&msg).into_owned()));
    };
    if info.detected_format != Format::Xcode {
        return Err(CliError::LintFailed(format!(
            "input is {:?}, not the Xcode ASCII plist dialect; --lint only checks round-trip of xcode-format files",
            info.detected_format
        )));
    }
    let project_name = project_name_for(path);
    let unparsed = xcodeprojer::unparse(&tree, Format::Xcode, &project_name)?;
    if unparsed == bytes {
        println!("{}: OK", path.unwrap_or("<stdin>"));
        Ok(EXIT_OK)
    } else {
        let diff = first_diff_line(bytes, &unparsed);
        Err(CliError::LintFailed(format!("unparse does not reproduce input exactly\n{}", diff)))
    }
}

/// Finds and formats the first line at which `original` and
/// `regenerated` diverge, for a short diagnostic on `--lint` failure.
fn first_diff_line(original: &[u8], regenerated: &[u8]) -> String {
    let orig_lines: Vec<&str> = std::str::from_utf8(original).unwrap_or("").lines().collect();
    let new_lines: Vec<&str> = std::str::from_utf8(regenerated).unwrap_or("").lines().collect();
    for (i, (a, b)) in orig_lines.iter().zip(new_lines.iter()).enumerate() {
        if a != b {
            return format!("line {}:\n- {}\n+ {}", i + 1, a, b);
        }
    }
    if orig_lines.len() != new_lines.len() {
        return format!("line counts differ: original {} vs regenerated {}", orig_lines.len(), new_lines.len());
    }
    String::new()
}

fn cmd_giddump(file: &str, format: GidDumpFormat) -> Result<u8, CliError> {
    let bytes = fs::read(file)?;
    let (tree, info) = xcodeprojer::parse(&bytes, Format::Auto, ParserKind::Classic);
    let Some(tree) = tree else {
        let mut msg = Vec::new();
        report_parse_status(false, &info, Some(file), &mut msg).ok();
        return Err(CliError::ParseFailed(String::from_utf8_lossy(&msg).into_owned()));
    };
    let mut gids: Vec<String> = Vec::new();
    if let Some(objects) = tree.as_mapping().and_then(|m| m.get("objects")).and_then(|v| v.as_mapping()) {
        gids.extend(objects.keys().cloned());
    }
    gids.sort();
    for g in &gids {
        if gidfields(g).is_err() {
            log::warn!("skipping non-gid object key {:?}", g);
        }
    }
    let gids: Vec<String> = gids.into_iter().filter(|g| gidfields(g).is_ok()).collect();
    let mut stdout = io::stdout();
    gidsplit(&gids, format, &mut stdout)?;
    Ok(EXIT_OK)
}
