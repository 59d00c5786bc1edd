//! The command-line surface. Every setting is a flag which falls back to an
//! environment variable, so the tool can be driven either way from a
//! build pipeline.

use crate::config::{
    Settings, CNAME_ENV, DOMAIN_ENV, FORMAT_ENV, INPUT_ENV, LAYOUT_ENV, OUTPUT_ENV,
    REPO_BASE_URL_ENV,
};
use crate::logging::Verbosity;
use clap::{App, Arg, ArgMatches};

/// Builds the [`App`] for `generate-go-redirect`.
pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("generate-go-redirect")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates static go-import redirect pages for a vanity import domain")
        .arg(
            Arg::with_name("input")
                .long("input")
                .value_name("FILE")
                .env(INPUT_ENV)
                .takes_value(true)
                .help("The records file to read"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .value_name("DIRECTORY")
                .env(OUTPUT_ENV)
                .takes_value(true)
                .help("The directory into which pages are written"),
        )
        .arg(
            Arg::with_name("domain")
                .long("domain")
                .value_name("DOMAIN")
                .env(DOMAIN_ENV)
                .takes_value(true)
                .help("The vanity import domain, e.g. go.example.org"),
        )
        .arg(
            Arg::with_name("repo-base-url")
                .long("repo-base-url")
                .value_name("URL")
                .env(REPO_BASE_URL_ENV)
                .takes_value(true)
                .help("Where repositories named in delimited records live, e.g. https://github.com/acme"),
        )
        .arg(
            Arg::with_name("format")
                .long("format")
                .value_name("FORMAT")
                .env(FORMAT_ENV)
                .takes_value(true)
                .possible_values(&["projects", "imports", "json"])
                .help("How to read the records file"),
        )
        .arg(
            Arg::with_name("layout")
                .long("layout")
                .value_name("LAYOUT")
                .env(LAYOUT_ENV)
                .takes_value(true)
                .possible_values(&["nested", "flat"])
                .help("Write {name}/index.html (nested) or {name}.html (flat)"),
        )
        .arg(
            Arg::with_name("cname")
                .long("cname")
                .value_name("BOOL")
                .env(CNAME_ENV)
                .takes_value(true)
                .help("Also write a CNAME file containing the domain"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Logs more detail; repeat for trace output"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .conflicts_with("verbose")
                .help("Logs warnings and errors only"),
        )
}

/// Pulls raw [`Settings`] out of parsed matches. Validation is left to
/// [`crate::config::Config::from_settings`].
pub fn settings(matches: &ArgMatches) -> Settings {
    let value = |name: &str| matches.value_of(name).map(str::to_owned);
    Settings {
        input: value("input"),
        output: value("output"),
        domain: value("domain"),
        repo_base_url: value("repo-base-url"),
        format: value("format"),
        layout: value("layout"),
        cname: value("cname"),
    }
}

/// The logging verbosity requested by `-q`/`-v`.
pub fn verbosity(matches: &ArgMatches) -> Verbosity {
    Verbosity::from_flags(matches.is_present("quiet"), matches.occurrences_of("verbose"))
}
